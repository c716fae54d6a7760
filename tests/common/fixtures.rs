//! Test fixtures and factories

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use entryflow::auth::Identity;
use entryflow::core::export::{CsvExporter, DefaultFormatter, ExportSettings};
use entryflow::storage::{
    Dataset, Entry, FsArtifactStore, JobStore, MemoryDataset, MemoryJobStore,
};

/// The default test operator.
pub fn operator() -> Identity {
    Identity {
        id: "op-test".to_string(),
        name: "Test Operator".to_string(),
    }
}

/// A second operator for ownership tests.
pub fn other_operator() -> Identity {
    Identity {
        id: "op-other".to_string(),
        name: "Other Operator".to_string(),
    }
}

/// Build one plain entry; the dataset assigns the id on insert.
pub fn entry(form_id: i64, status: &str) -> Entry {
    Entry {
        id: 0,
        form_id,
        status: status.to_string(),
        created_at: Utc::now(),
        raw_fields: None,
        meta: BTreeMap::new(),
    }
}

/// Seed `n` active entries for form 1, each with an email meta value.
pub fn seed_entries(dataset: &MemoryDataset, n: usize) {
    for i in 0..n {
        let mut e = entry(1, "active");
        e.meta
            .insert("email".to_string(), format!("user{}@example.com", i));
        dataset.insert(e);
    }
}

/// Fully wired exporter over temporary storage
pub struct ExportRig {
    _dir: tempfile::TempDir,
    pub dataset: Arc<MemoryDataset>,
    pub jobs: Arc<MemoryJobStore>,
    pub exporter: CsvExporter,
}

impl ExportRig {
    /// Build a rig with the given settings.
    pub async fn new(settings: ExportSettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Arc::new(MemoryDataset::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let artifacts = Arc::new(FsArtifactStore::new(dir.path()).await.unwrap());
        let exporter = CsvExporter::new(
            Arc::clone(&dataset) as Arc<dyn Dataset>,
            Arc::clone(&jobs) as Arc<dyn JobStore>,
            artifacts,
            Arc::new(DefaultFormatter),
            settings,
        );
        Self {
            _dir: dir,
            dataset,
            jobs,
            exporter,
        }
    }

    /// Rig with the default settings.
    pub async fn default() -> Self {
        Self::new(ExportSettings::default()).await
    }
}
