//! Common test utilities for entryflow

pub mod fixtures;

pub use fixtures::{operator, seed_entries, ExportRig};
