//! # EntryFlow
//!
//! A batched, resumable data-processing engine for form entry datasets.
//! Long-running maintenance work is split into short bounded calls so it
//! survives restrictive execution environments: data migrations run one
//! batch per request, and CSV exports follow a client-driven
//! start/batch/download protocol with all progress kept in an expiring
//! job store.
//!
//! ## Embedded usage
//!
//! ```rust,no_run
//! use entryflow::{Config, Engine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/engine.yaml").await?;
//!     let engine = Engine::new(config).await?;
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod auth;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{EngineError, Result};

pub use crate::core::export::{
    BatchStatus, CsvExporter, ExportFilter, ExportSettings, StartedExport,
};
pub use crate::core::migrations::{
    ExecutionResult, MigrationDefinition, MigrationManager, MigrationRegistry, MigrationStrategy,
    StatusSnapshot,
};
pub use storage::{Dataset, Entry, EntryFilter, MemoryDataset};

use tracing::info;

/// The engine with its HTTP surface
pub struct Engine {
    config: Config,
    server: server::server::HttpServer,
}

impl Engine {
    /// Create a new engine instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new engine instance");

        let server = server::server::HttpServer::new(&config).await?;
        Ok(Self { config, server })
    }

    /// Run the engine server
    pub async fn run(self) -> Result<()> {
        info!("Starting EntryFlow engine");
        info!("Configuration: {:#?}", self.config);

        self.server.start().await?;
        Ok(())
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
