//! CSV export jobs
//!
//! A three-phase, client-driven protocol: `start` discovers columns and
//! allocates the artifact, repeated `batch` calls append bounded chunks,
//! `download` streams and destroys the artifact. All progress lives in
//! the job store; the engine holds no thread or session between calls.

pub mod controller;
pub mod csv;
pub mod types;

pub use controller::{CsvExporter, ExportSettings};
pub use csv::{DefaultFormatter, RecordFormatter};
pub use types::{BatchStatus, ExportFilter, ExportJob, StartedExport};
