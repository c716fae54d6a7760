//! Export job state and phase responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::EntryFilter;

/// Caller-supplied export criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Restrict to one form
    pub form_id: Option<i64>,
    /// Restrict to one status
    pub status: Option<String>,
    /// Entries created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Entries created at or before this instant
    pub created_before: Option<DateTime<Utc>>,
    /// Whether discovered meta keys become export columns
    #[serde(default = "default_include_meta")]
    pub include_meta: bool,
}

fn default_include_meta() -> bool {
    true
}

impl Default for ExportFilter {
    fn default() -> Self {
        Self {
            form_id: None,
            status: None,
            created_after: None,
            created_before: None,
            include_meta: default_include_meta(),
        }
    }
}

impl ExportFilter {
    /// Dataset-level filter equivalent to this export filter.
    pub fn entry_filter(&self) -> EntryFilter {
        EntryFilter {
            form_id: self.form_id,
            status: self.status.clone(),
            created_after: self.created_after,
            created_before: self.created_before,
            ..EntryFilter::default()
        }
    }
}

/// Durable state of one in-flight export
///
/// Created at `start`, mutated by every `batch` call, consumed and
/// deleted by `download` (or reaped after TTL expiry). `processed` is
/// monotonically non-decreasing; `cursor` is always the primary key of
/// the last row written to the artifact, never an arithmetic offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Opaque job token
    pub job_id: String,
    /// Identity that created the job; all later access must match
    pub owner: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Filter the job was started with
    pub filter: ExportFilter,
    /// Discovered meta columns, sorted for a deterministic header
    pub columns: Vec<String>,
    /// Primary key of the last row written; `None` before the first batch
    pub cursor: Option<i64>,
    /// Rows written to the artifact so far
    pub processed: u64,
    /// Matching rows counted at start
    pub total: u64,
    /// Artifact holding the CSV bytes
    pub artifact_id: String,
    /// Optimistic-concurrency version, bumped by the job store on update
    pub version: u64,
}

impl ExportJob {
    /// Create a fresh job at the sentinel cursor.
    pub fn new(
        job_id: String,
        owner: String,
        filter: ExportFilter,
        columns: Vec<String>,
        total: u64,
        artifact_id: String,
    ) -> Self {
        Self {
            job_id,
            owner,
            created_at: Utc::now(),
            filter,
            columns,
            cursor: None,
            processed: 0,
            total,
            artifact_id,
            version: 1,
        }
    }
}

/// Response of the start phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedExport {
    /// Token for subsequent batch/download calls
    pub job_id: String,
    /// Matching rows the job will export
    pub total: u64,
}

/// Response of the batch phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    /// Whether the export is complete
    pub done: bool,
    /// Rows written so far
    pub processed: u64,
    /// Total rows recorded at start
    pub total: u64,
}
