//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::auth::{AuthSystem, TokenValidator};
use crate::config::Config;
use crate::core::export::CsvExporter;
use crate::core::migrations::MigrationManager;

/// HTTP server state shared across handlers
///
/// All fields are wrapped in Arc so the state clones cheaply into each
/// worker.
#[derive(Clone)]
pub struct AppState {
    /// Engine configuration (shared read-only)
    pub config: Arc<Config>,
    /// Migration facade
    pub manager: Arc<MigrationManager>,
    /// Export controller
    pub exporter: Arc<CsvExporter>,
    /// API key authentication
    pub auth: Arc<AuthSystem>,
    /// Phase token issuance and validation
    pub tokens: Arc<TokenValidator>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(
        config: Config,
        manager: MigrationManager,
        exporter: CsvExporter,
        auth: AuthSystem,
        tokens: TokenValidator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            manager: Arc::new(manager),
            exporter: Arc::new(exporter),
            auth: Arc::new(auth),
            tokens: Arc::new(tokens),
        }
    }
}
