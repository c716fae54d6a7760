//! CSV export endpoints
//!
//! The three export phases map to three routes. Start and batch require
//! an export-scoped phase token; download consumes a single-use
//! download-scoped token passed as a query parameter so plain link
//! clicks work.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::{Action, SCOPE_DOWNLOAD, SCOPE_EXPORT};
use crate::core::export::ExportFilter;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::server::utils::{identify, phase_token};
use crate::utils::error::EngineError;

/// Configure export routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/exports")
            .route("", web::post().to(start_export))
            .route("/{job_id}/batch", web::post().to(export_batch))
            .route("/{job_id}/download", web::get().to(download_export)),
    );
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    token: String,
}

/// Start an export job.
async fn start_export(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ExportFilter>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::Export)?;
    state
        .tokens
        .validate(&phase_token(&req)?, &identity, SCOPE_EXPORT)?;

    let started = state.exporter.start(&identity, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(started)))
}

/// Append the next batch to an export job.
async fn export_batch(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::Export)?;
    state
        .tokens
        .validate(&phase_token(&req)?, &identity, SCOPE_EXPORT)?;

    let status = state.exporter.batch(&identity, &path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

/// Download the finished CSV and destroy the job.
async fn download_export(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse, EngineError> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::Export)?;
    state
        .tokens
        .consume(&query.token, &identity, SCOPE_DOWNLOAD)?;

    let (filename, bytes) = state.exporter.download(&identity, &path).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}
