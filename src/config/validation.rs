//! Configuration validation

use std::collections::HashSet;

use tracing::warn;

use super::models::*;
use crate::utils::error::{EngineError, Result};

/// Validation seam for configuration structures
pub trait Validate {
    /// Check the structure for invalid or inconsistent values.
    fn validate(&self) -> Result<()>;
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(EngineError::config("server host must not be empty"));
        }
        if self.port == 0 {
            return Err(EngineError::config("server port must not be 0"));
        }
        Ok(())
    }
}

impl Validate for JobsConfig {
    fn validate(&self) -> Result<()> {
        if self.export_batch_size == 0 {
            return Err(EngineError::config("export_batch_size must be at least 1"));
        }
        if self.schema_scan_chunk_size == 0 {
            return Err(EngineError::config(
                "schema_scan_chunk_size must be at least 1",
            ));
        }
        if self.job_ttl_secs == 0 {
            return Err(EngineError::config("job_ttl_secs must be at least 1"));
        }
        if self.call_time_budget_ms == 0 {
            return Err(EngineError::config("call_time_budget_ms must be at least 1"));
        }
        if self.artifact_dir.is_empty() {
            return Err(EngineError::config("artifact_dir must not be empty"));
        }
        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.token_secret.len() < 16 {
            return Err(EngineError::config(
                "token_secret must be at least 16 characters",
            ));
        }
        if self.operators.is_empty() {
            warn!("no operators configured, every request will be rejected");
        }

        let mut ids = HashSet::new();
        for op in &self.operators {
            if op.id.is_empty() {
                return Err(EngineError::config("operator id must not be empty"));
            }
            if !ids.insert(op.id.as_str()) {
                return Err(EngineError::config(format!(
                    "duplicate operator id: {}",
                    op.id
                )));
            }
            if op.api_key_sha256.len() != 64
                || !op.api_key_sha256.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(EngineError::config(format!(
                    "operator {} api_key_sha256 must be 64 hex characters",
                    op.id
                )));
            }
        }
        Ok(())
    }
}
