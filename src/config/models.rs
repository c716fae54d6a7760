//! Configuration data structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Migration and export job tuning
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Actix worker threads; 0 means one per core
    #[serde(default)]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

/// Tuning for batched jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Rows written per export batch call
    #[serde(default = "default_export_batch_size")]
    pub export_batch_size: usize,
    /// Export job lifetime between calls, in seconds
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
    /// Per-call time budget for batch loops, in milliseconds
    #[serde(default = "default_call_budget_ms")]
    pub call_time_budget_ms: u64,
    /// Directory holding export artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
    /// Rows fetched per chunk during export column discovery
    #[serde(default = "default_scan_chunk_size")]
    pub schema_scan_chunk_size: usize,
}

impl JobsConfig {
    /// Export job TTL as a [`Duration`].
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    /// Per-call time budget as a [`Duration`].
    pub fn call_budget(&self) -> Duration {
        Duration::from_millis(self.call_time_budget_ms)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            export_batch_size: default_export_batch_size(),
            job_ttl_secs: default_job_ttl_secs(),
            call_time_budget_ms: default_call_budget_ms(),
            artifact_dir: default_artifact_dir(),
            schema_scan_chunk_size: default_scan_chunk_size(),
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing phase tokens
    #[serde(default)]
    pub token_secret: String,
    /// Phase token lifetime, in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Known operators
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

impl AuthConfig {
    /// Phase token TTL as a [`Duration`].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            operators: Vec::new(),
        }
    }
}

/// One configured operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Stable operator id
    pub id: String,
    /// Display name
    pub name: String,
    /// Lowercase hex SHA-256 of the operator's API key
    pub api_key_sha256: String,
    /// Whether the operator may run migrations
    #[serde(default)]
    pub admin: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_export_batch_size() -> usize {
    100
}

fn default_job_ttl_secs() -> u64 {
    3600
}

fn default_call_budget_ms() -> u64 {
    20_000
}

fn default_artifact_dir() -> String {
    "./data/exports".to_string()
}

fn default_scan_chunk_size() -> usize {
    500
}

fn default_token_ttl_secs() -> u64 {
    300
}
