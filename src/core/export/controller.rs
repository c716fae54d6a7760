//! Three-phase export controller
//!
//! `start` → repeated `batch` → `download`. Each phase is one bounded
//! request; the caller drives the loop until `done = true`. Jobs that are
//! never downloaded expire via the job store TTL, and their artifacts are
//! reclaimed by the opportunistic reap that runs on every `start`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::csv::{self, RecordFormatter};
use super::types::{BatchStatus, ExportFilter, ExportJob, StartedExport};
use crate::auth::Identity;
use crate::core::budget::CallBudget;
use crate::core::cursor::EntryCursor;
use crate::storage::{ArtifactStore, Dataset, JobStore};
use crate::utils::error::{EngineError, Result};

/// Tuning knobs for the exporter
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Rows written per batch call
    pub batch_size: usize,
    /// Job lifetime between calls
    pub job_ttl: Duration,
    /// Rows fetched per chunk during start-phase column discovery
    pub scan_chunk_size: usize,
    /// Per-call time budget for the batch phase
    pub call_budget: Duration,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            job_ttl: Duration::from_secs(60 * 60),
            scan_chunk_size: 500,
            call_budget: Duration::from_secs(20),
        }
    }
}

/// Client-driven CSV export controller
pub struct CsvExporter {
    dataset: Arc<dyn Dataset>,
    jobs: Arc<dyn JobStore>,
    artifacts: Arc<dyn ArtifactStore>,
    formatter: Arc<dyn RecordFormatter>,
    settings: ExportSettings,
}

impl CsvExporter {
    /// Wire the exporter against its collaborators.
    pub fn new(
        dataset: Arc<dyn Dataset>,
        jobs: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        formatter: Arc<dyn RecordFormatter>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            dataset,
            jobs,
            artifacts,
            formatter,
            settings,
        }
    }

    /// Start an export: count matching rows, discover columns, allocate
    /// the artifact with its preamble and header, and store the job.
    pub async fn start(&self, identity: &Identity, filter: ExportFilter) -> Result<StartedExport> {
        // No background scheduler exists, so expired jobs are reclaimed
        // whenever a new export begins.
        self.reap_expired().await;

        let entry_filter = filter.entry_filter();
        let total = self.dataset.count(&entry_filter).await?;
        if total == 0 {
            return Err(EngineError::empty_export(
                "no entries match the export filter",
            ));
        }

        let columns = if filter.include_meta {
            self.discover_columns(&filter).await?
        } else {
            Vec::new()
        };

        let artifact_id = self.artifacts.create().await?;
        let mut preamble = String::from(csv::UTF8_BOM);
        preamble.push_str(&csv::header_record(&columns));
        self.artifacts
            .append(&artifact_id, preamble.as_bytes())
            .await?;

        let job = ExportJob::new(
            Uuid::new_v4().to_string(),
            identity.id.clone(),
            filter,
            columns,
            total,
            artifact_id,
        );
        let job_id = job.job_id.clone();
        self.jobs.put(job, self.settings.job_ttl).await?;

        info!(%job_id, total, owner = %identity.id, "export started");
        Ok(StartedExport { job_id, total })
    }

    /// Append the next bounded batch to the artifact and advance the
    /// stored cursor. Returns `done = true` without touching the artifact
    /// once the scan is exhausted, so extra calls are harmless.
    pub async fn batch(&self, identity: &Identity, job_id: &str) -> Result<BatchStatus> {
        let mut job = self.load_owned(identity, job_id).await?;
        let budget = CallBudget::start(self.settings.call_budget);

        let cursor = EntryCursor::new(
            Arc::clone(&self.dataset),
            job.filter.entry_filter(),
            self.settings.batch_size,
        );
        let page = cursor.next_batch(job.cursor).await?;

        if page.is_empty() {
            debug!(%job_id, processed = job.processed, "export exhausted");
            return Ok(BatchStatus {
                done: true,
                processed: job.processed,
                total: job.total,
            });
        }

        // Claim the job before touching the artifact. Of two interleaved
        // callers holding the same version, the loser conflicts here and
        // never appends its duplicate rows.
        let claim_version = job.version;
        self.jobs.update(job.clone(), claim_version).await?;
        job.version = claim_version + 1;

        let fetched = page.rows.len();
        let mut buffer = String::new();
        let mut written = 0usize;
        let mut last_key = None;
        for entry in &page.rows {
            if written > 0 && budget.exhausted() {
                debug!(%job_id, written, "call budget exhausted, ending batch early");
                break;
            }
            let cells = self.formatter.format(entry, &job.columns);
            buffer.push_str(&csv::encode_record(&cells));
            last_key = Some(entry.id);
            written += 1;
        }

        // One append per batch. A crash between this append and the
        // final update reprocesses the same range on retry; the artifact
        // is deleted on download, so the duplicate window is accepted.
        self.artifacts
            .append(&job.artifact_id, buffer.as_bytes())
            .await?;

        let expected_version = job.version;
        job.cursor = last_key;
        job.processed += written as u64;
        let done = written == fetched && fetched < self.settings.batch_size;
        let status = BatchStatus {
            done,
            processed: job.processed,
            total: job.total,
        };
        self.jobs.update(job, expected_version).await?;

        debug!(%job_id, written, done, "export batch appended");
        Ok(status)
    }

    /// Stream the finished artifact and destroy the job. The returned
    /// filename is suitable for a content-disposition header.
    pub async fn download(&self, identity: &Identity, job_id: &str) -> Result<(String, Bytes)> {
        let job = self.load_owned(identity, job_id).await?;

        let bytes = self.artifacts.read_and_delete(&job.artifact_id).await?;
        self.jobs.delete(job_id).await?;

        info!(%job_id, size = bytes.len(), "export downloaded and reclaimed");
        let filename = format!("entries-{}.csv", job.created_at.format("%Y-%m-%d"));
        Ok((filename, bytes))
    }

    /// Reap expired jobs and their orphaned artifacts. Failures are
    /// logged, not propagated: reclamation must never break a request.
    pub async fn reap_expired(&self) {
        let reaped = match self.jobs.sweep_expired().await {
            Ok(reaped) => reaped,
            Err(e) => {
                warn!(error = %e, "job sweep failed");
                return;
            }
        };
        for job in reaped {
            debug!(job_id = %job.job_id, "reclaiming expired export");
            if let Err(e) = self.artifacts.delete(&job.artifact_id).await {
                warn!(job_id = %job.job_id, error = %e, "orphaned artifact cleanup failed");
            }
        }
    }

    /// Load a job, treating expiry and foreign ownership identically as
    /// absent so one actor can never observe another's job.
    async fn load_owned(&self, identity: &Identity, job_id: &str) -> Result<ExportJob> {
        let not_found =
            || EngineError::not_found(format!("export job {} not found or expired", job_id));

        let job = self.jobs.get(job_id).await?.ok_or_else(not_found)?;
        if job.owner != identity.id {
            warn!(%job_id, owner = %job.owner, caller = %identity.id, "export job ownership mismatch");
            return Err(not_found());
        }
        Ok(job)
    }

    /// Scan the variable-schema payload column in chunks and collect the
    /// superset of meta keys, sorted for a deterministic header. Keys
    /// with a leading underscore are engine-internal and excluded.
    async fn discover_columns(&self, filter: &ExportFilter) -> Result<Vec<String>> {
        let cursor = EntryCursor::new(
            Arc::clone(&self.dataset),
            filter.entry_filter(),
            self.settings.scan_chunk_size,
        );
        let mut keys = BTreeSet::new();
        let mut after_key = None;
        loop {
            let page = cursor.next_batch(after_key).await?;
            if page.is_empty() {
                break;
            }
            after_key = page.last_key;
            for entry in &page.rows {
                for key in entry.meta.keys() {
                    if !key.starts_with('_') {
                        keys.insert(key.clone());
                    }
                }
            }
        }
        Ok(keys.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::csv::DefaultFormatter;
    use crate::storage::{Entry, FsArtifactStore, MemoryDataset, MemoryJobStore};
    use chrono::Utc;
    use std::collections::BTreeMap;

    struct Fixture {
        _dir: tempfile::TempDir,
        dataset: Arc<MemoryDataset>,
        jobs: Arc<MemoryJobStore>,
        exporter: CsvExporter,
    }

    async fn fixture(settings: ExportSettings) -> Fixture {
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
        Fixture {
            _dir: dir,
            dataset,
            jobs,
            exporter,
        }
    }

    fn operator() -> Identity {
        Identity {
            id: "op-1".to_string(),
            name: "Operator".to_string(),
        }
    }

    fn seed(dataset: &MemoryDataset, n: usize) {
        for i in 0..n {
            let mut meta = BTreeMap::new();
            meta.insert("email".to_string(), format!("user{}@example.com", i));
            dataset.insert(Entry {
                id: 0,
                form_id: 1,
                status: "active".to_string(),
                created_at: Utc::now(),
                raw_fields: None,
                meta,
            });
        }
    }

    #[tokio::test]
    async fn test_start_with_no_matches_creates_no_job() {
        let fx = fixture(ExportSettings::default()).await;

        let err = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyExport(_)));
        assert!(fx.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_identity_sees_not_found() {
        let fx = fixture(ExportSettings::default()).await;
        seed(&fx.dataset, 3);

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();

        let intruder = Identity {
            id: "op-2".to_string(),
            name: "Other".to_string(),
        };
        let err = fx
            .exporter
            .batch(&intruder, &started.job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        let err = fx
            .exporter
            .download(&intruder, &started.job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_batch_advances_cursor_and_processed() {
        let settings = ExportSettings {
            batch_size: 2,
            ..ExportSettings::default()
        };
        let fx = fixture(settings).await;
        seed(&fx.dataset, 5);

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();
        assert_eq!(started.total, 5);

        let status = fx.exporter.batch(&operator(), &started.job_id).await.unwrap();
        assert_eq!(status.processed, 2);
        assert!(!status.done);

        let job = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        assert_eq!(job.cursor, Some(4)); // descending from id 5
        assert_eq!(job.processed, 2);
    }

    #[tokio::test]
    async fn test_batch_claims_version_before_appending() {
        let fx = fixture(ExportSettings::default()).await;
        seed(&fx.dataset, 3);

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();
        let stale = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        assert_eq!(stale.version, 1);

        fx.exporter.batch(&operator(), &started.job_id).await.unwrap();

        // One bump for the claim, one for the persisted progress.
        let job = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        assert_eq!(job.version, 3);

        // A caller still holding the pre-batch version loses at the
        // claim, before the artifact is touched.
        let err = fx.jobs.update(stale, 1).await.unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_batch_after_done_is_idempotent() {
        let settings = ExportSettings {
            batch_size: 10,
            ..ExportSettings::default()
        };
        let fx = fixture(settings).await;
        seed(&fx.dataset, 3);

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();

        let status = fx.exporter.batch(&operator(), &started.job_id).await.unwrap();
        assert!(status.done);
        assert_eq!(status.processed, 3);

        let job_before = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        let status = fx.exporter.batch(&operator(), &started.job_id).await.unwrap();
        assert!(status.done);
        assert_eq!(status.processed, 3);
        let job_after = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        assert_eq!(job_before.version, job_after.version);
    }

    #[tokio::test]
    async fn test_download_streams_header_and_rows_then_deletes() {
        let fx = fixture(ExportSettings::default()).await;
        seed(&fx.dataset, 3);

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();
        let status = fx.exporter.batch(&operator(), &started.job_id).await.unwrap();
        assert!(status.done);

        let (filename, bytes) = fx
            .exporter
            .download(&operator(), &started.job_id)
            .await
            .unwrap();
        assert!(filename.ends_with(".csv"));

        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with(csv::UTF8_BOM));
        let lines: Vec<&str> = text.trim_start_matches(csv::UTF8_BOM).lines().collect();
        assert_eq!(lines.len(), 4); // header + 3 rows
        assert_eq!(lines[0], "entry_id,form_id,status,date_created,email");

        // The job is consumed.
        let err = fx
            .exporter
            .download(&operator(), &started.job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_internal_meta_keys_excluded_from_columns() {
        let fx = fixture(ExportSettings::default()).await;
        let mut meta = BTreeMap::new();
        meta.insert("_expansion_error".to_string(), "oops".to_string());
        meta.insert("city".to_string(), "London".to_string());
        fx.dataset.insert(Entry {
            id: 0,
            form_id: 1,
            status: "active".to_string(),
            created_at: Utc::now(),
            raw_fields: None,
            meta,
        });

        let started = fx
            .exporter
            .start(&operator(), ExportFilter::default())
            .await
            .unwrap();
        let job = fx.jobs.get(&started.job_id).await.unwrap().unwrap();
        assert_eq!(job.columns, vec!["city".to_string()]);
    }
}
