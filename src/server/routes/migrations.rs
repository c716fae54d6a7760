//! Migration endpoints
//!
//! Listing and status are open to any identified operator; running a
//! batch requires an admin operator.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::auth::Action;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::server::utils::identify;
use crate::utils::error::EngineError;

/// Configure migration routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/migrations")
            .route("", web::get().to(list_migrations))
            .route("/{key}/status", web::get().to(migration_status))
            .route("/{key}/run", web::post().to(run_migration)),
    );
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    /// 1-based batch counter, echoed in messages for operator visibility
    #[serde(default = "default_batch_number")]
    batch_number: u32,
}

fn default_batch_number() -> u32 {
    1
}

/// List every registered migration in display order.
async fn list_migrations(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::ViewMigrations)?;

    let migrations = state.manager.get_migrations();
    Ok(HttpResponse::Ok().json(ApiResponse::success(migrations)))
}

/// Status snapshot for one migration.
async fn migration_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::ViewMigrations)?;

    let snapshot = state.manager.get_migration_status(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(snapshot)))
}

/// Run one batch of a migration.
async fn run_migration(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RunRequest>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::RunMigration)?;

    info!(migration = %path.as_str(), operator = %identity.id, batch = body.batch_number, "migration batch requested");
    let result = state.manager.run_migration(&path, body.batch_number).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}
