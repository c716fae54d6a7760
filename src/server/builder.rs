//! Server builder and run_server function
//!
//! This module provides the ServerBuilder for easier server configuration
//! and the run_server function for automatic configuration loading.

use tracing::{info, warn};

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::{EngineError, Result};

/// Server builder for easier configuration
pub struct ServerBuilder {
    config: Option<Config>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the HTTP server
    pub async fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| EngineError::config("configuration is required"))?;
        HttpServer::new(&config).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the server with automatic configuration loading
pub async fn run_server() -> Result<()> {
    info!("🚀 Starting EntryFlow engine");

    let config_path =
        std::env::var("ENGINE_CONFIG").unwrap_or_else(|_| "config/engine.yaml".to_string());
    info!("📄 Loading configuration file: {}", config_path);

    let config = match Config::from_file(&config_path).await {
        Ok(config) => {
            info!("✅ Configuration file loaded successfully");
            config
        }
        Err(e) => {
            warn!(
                "⚠️  Configuration file loading failed, using default config: {}",
                e
            );
            warn!("💡 Without operators and a token secret every request will be rejected");
            Config::default()
        }
    };

    let server = HttpServer::new(&config).await?;
    info!(
        "🌐 Server starting at: http://{}:{}",
        config.server().host,
        config.server().port
    );
    info!("📋 API Endpoints:");
    info!("   GET  /health - Health check");
    info!("   POST /api/v1/tokens - Issue phase token");
    info!("   GET  /api/v1/migrations - List migrations");
    info!("   GET  /api/v1/migrations/{{key}}/status - Migration status");
    info!("   POST /api/v1/migrations/{{key}}/run - Run migration batch");
    info!("   POST /api/v1/exports - Start CSV export");
    info!("   POST /api/v1/exports/{{job_id}}/batch - Append export batch");
    info!("   GET  /api/v1/exports/{{job_id}}/download - Download CSV");

    server.start().await
}
