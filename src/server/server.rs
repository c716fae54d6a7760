//! HTTP server core implementation

use std::sync::Arc;

use actix_web::{
    middleware::DefaultHeaders, web, App, HttpServer as ActixHttpServer,
};
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::auth::{AuthSystem, TokenValidator};
use crate::config::{Config, ServerConfig};
use crate::core::export::{CsvExporter, DefaultFormatter, ExportSettings};
use crate::core::migrations::MigrationManager;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::{Dataset, FsArtifactStore, MemoryDataset, MemoryJobStore};
use crate::utils::error::{EngineError, Result};

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the default in-memory dataset.
    pub async fn new(config: &Config) -> Result<Self> {
        let dataset: Arc<dyn Dataset> = Arc::new(MemoryDataset::new());
        Self::with_dataset(config, dataset).await
    }

    /// Create a server over an externally supplied dataset.
    pub async fn with_dataset(config: &Config, dataset: Arc<dyn Dataset>) -> Result<Self> {
        info!("Creating HTTP server");

        let jobs = config.jobs();
        let manager = MigrationManager::new(Arc::clone(&dataset), jobs.call_budget());

        let artifacts = Arc::new(FsArtifactStore::new(jobs.artifact_dir.clone()).await?);
        let exporter = CsvExporter::new(
            dataset,
            Arc::new(MemoryJobStore::new()),
            artifacts,
            Arc::new(DefaultFormatter),
            ExportSettings {
                batch_size: jobs.export_batch_size,
                job_ttl: jobs.job_ttl(),
                scan_chunk_size: jobs.schema_scan_chunk_size,
                call_budget: jobs.call_budget(),
            },
        );

        let auth = AuthSystem::new(config.auth());
        let tokens = TokenValidator::new(
            config.auth().token_secret.as_bytes().to_vec(),
            config.auth().token_ttl(),
        );

        let state = AppState::new(config.clone(), manager, exporter, auth, tokens);

        Ok(Self {
            config: config.server().clone(),
            state,
        })
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        let workers = self.config.workers;

        let mut server = ActixHttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(TracingLogger::default())
                .wrap(DefaultHeaders::new().add(("Server", "EntryFlow")))
                .configure(routes::health::configure_routes)
                .configure(routes::tokens::configure_routes)
                .configure(routes::migrations::configure_routes)
                .configure(routes::exports::configure_routes)
        })
        .bind(&bind_addr)
        .map_err(|e| {
            EngineError::internal(format!("failed to bind {}: {}", bind_addr, e))
        })?;

        if workers > 0 {
            server = server.workers(workers);
        }

        info!("HTTP server listening on {}", bind_addr);
        server
            .run()
            .await
            .map_err(|e| EngineError::internal(format!("server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
