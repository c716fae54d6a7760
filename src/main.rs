//! EntryFlow - batched, resumable data-processing engine

use std::process::ExitCode;

use entryflow::server;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env overrides before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    // Start server (auto-loads config/engine.yaml)
    match server::builder::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
