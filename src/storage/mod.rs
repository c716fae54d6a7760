//! Storage layer
//!
//! Seam traits for the resources the engine touches (the entry dataset,
//! the TTL-bound job store, and the export artifact store) together with
//! the in-memory/filesystem implementations shipped with the engine.

pub mod artifact;
pub mod dataset;
pub mod job_store;

pub use artifact::{ArtifactStore, FsArtifactStore};
pub use dataset::{Dataset, Entry, EntryFilter, MemoryDataset};
pub use job_store::{JobStore, MemoryJobStore};
