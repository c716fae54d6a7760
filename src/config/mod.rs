//! Configuration management
//!
//! Configuration loads from a YAML file with environment overrides for
//! deployment-specific values. Everything has a working default except
//! the auth section, which must name a token secret and at least one
//! operator before requests can succeed.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::utils::error::{EngineError, Result};

/// Main configuration struct for the engine
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Engine configuration
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::config(format!("failed to read config file: {}", e)))?;

        let engine: EngineConfig = serde_yaml::from_str(&content)
            .map_err(|e| EngineError::config(format!("failed to parse config: {}", e)))?;

        let mut config = Self { engine };
        config.apply_env();
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables override whatever the file said.
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("ENGINE_HOST") {
            self.engine.server.host = host;
        }
        if let Ok(port) = std::env::var("ENGINE_PORT") {
            match port.parse() {
                Ok(port) => self.engine.server.port = port,
                Err(_) => warn!("ignoring unparseable ENGINE_PORT: {}", port),
            }
        }
        if let Ok(secret) = std::env::var("ENGINE_TOKEN_SECRET") {
            self.engine.auth.token_secret = secret;
        }
        if let Ok(dir) = std::env::var("ENGINE_ARTIFACT_DIR") {
            self.engine.jobs.artifact_dir = dir;
        }
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.engine.server
    }

    /// Get job tuning configuration
    pub fn jobs(&self) -> &JobsConfig {
        &self.engine.jobs
    }

    /// Get auth configuration
    pub fn auth(&self) -> &AuthConfig {
        &self.engine.auth
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.engine
            .server
            .validate()
            .map_err(|e| EngineError::config(format!("server config error: {}", e)))?;
        self.engine
            .jobs
            .validate()
            .map_err(|e| EngineError::config(format!("jobs config error: {}", e)))?;
        self.engine
            .auth
            .validate()
            .map_err(|e| EngineError::config(format!("auth config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip_with_defaults() {
        let yaml = r#"
server:
  port: 9000
auth:
  token_secret: 0123456789abcdef
  operators:
    - id: op-1
      name: Operator One
      api_key_sha256: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
      admin: true
"#;
        let engine: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        let config = Config { engine };
        config.validate().unwrap();

        assert_eq!(config.server().port, 9000);
        assert_eq!(config.jobs().export_batch_size, 100);
        assert!(config.auth().operators[0].admin);
    }

    #[test]
    fn test_missing_auth_fails_validation() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }
}
