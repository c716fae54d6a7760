//! Durable, expiring job state store
//!
//! Holds in-flight [`ExportJob`] descriptors keyed by job id. Expiry is
//! enforced by the store itself: reads lazily drop expired entries, and
//! [`JobStore::sweep_expired`] reclaims whatever remains so orphaned
//! artifacts can be garbage-collected.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::core::export::ExportJob;
use crate::utils::error::{EngineError, Result};

/// Key→state map for in-flight export jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Store a new job with the given time-to-live.
    async fn put(&self, job: ExportJob, ttl: Duration) -> Result<()>;

    /// Load a job. Expired or unknown ids return `None`.
    async fn get(&self, job_id: &str) -> Result<Option<ExportJob>>;

    /// Persist a mutated job, guarded by an optimistic version check:
    /// fails with [`EngineError::Conflict`] when the stored version does
    /// not equal `expected_version`. On success the stored version is
    /// bumped and the TTL is refreshed.
    async fn update(&self, job: ExportJob, expected_version: u64) -> Result<()>;

    /// Delete a job. Deleting an absent job is not an error.
    async fn delete(&self, job_id: &str) -> Result<()>;

    /// Drop every expired entry, returning the reaped jobs so the caller
    /// can clean up their artifacts.
    async fn sweep_expired(&self) -> Result<Vec<ExportJob>>;
}

struct StoredJob {
    job: ExportJob,
    ttl: Duration,
    expires_at: DateTime<Utc>,
}

impl StoredJob {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// In-memory job store with lazy TTL expiry
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, StoredJob>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (possibly expired, not yet reaped) entries.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, job: ExportJob, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| EngineError::storage(format!("invalid job ttl: {}", e)))?;
        debug!(job_id = %job.job_id, %expires_at, "storing export job");
        let stored = StoredJob {
            job,
            ttl,
            expires_at,
        };
        self.jobs.write().insert(stored.job.job_id.clone(), stored);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<ExportJob>> {
        let mut jobs = self.jobs.write();
        match jobs.get(job_id) {
            Some(stored) if stored.is_expired() => {
                debug!(job_id, "export job expired, dropping on read");
                jobs.remove(job_id);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.job.clone())),
            None => Ok(None),
        }
    }

    async fn update(&self, mut job: ExportJob, expected_version: u64) -> Result<()> {
        let mut jobs = self.jobs.write();
        let stored = jobs
            .get_mut(&job.job_id)
            .filter(|s| !s.is_expired())
            .ok_or_else(|| {
                EngineError::not_found(format!("export job {} not found or expired", job.job_id))
            })?;

        if stored.job.version != expected_version {
            return Err(EngineError::conflict(format!(
                "export job {} version {} does not match expected {}",
                job.job_id, stored.job.version, expected_version
            )));
        }

        job.version = expected_version + 1;
        stored.job = job;
        // Each successful batch keeps the job alive for another full TTL.
        stored.expires_at = Utc::now()
            + chrono::Duration::from_std(stored.ttl)
                .map_err(|e| EngineError::storage(format!("invalid job ttl: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, job_id: &str) -> Result<()> {
        self.jobs.write().remove(job_id);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<Vec<ExportJob>> {
        let mut jobs = self.jobs.write();
        let expired_ids: Vec<String> = jobs
            .iter()
            .filter(|(_, s)| s.is_expired())
            .map(|(id, _)| id.clone())
            .collect();

        let mut reaped = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            if let Some(stored) = jobs.remove(&id) {
                reaped.push(stored.job);
            }
        }
        Ok(reaped)
    }
}
