//! Health check and status endpoints

use std::borrow::Cow;

use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/status", web::get().to(system_status))
        .route("/version", web::get().to(version_info));
}

#[derive(Debug, serde::Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    timestamp: DateTime<Utc>,
    version: Cow<'static, str>,
}

#[derive(Debug, serde::Serialize)]
struct SystemStatus {
    status: Cow<'static, str>,
    timestamp: DateTime<Utc>,
    version: Cow<'static, str>,
    build_time: Cow<'static, str>,
    git_hash: Cow<'static, str>,
    migrations: usize,
}

/// Basic health check endpoint
///
/// Used by load balancers and monitoring systems.
pub async fn health_check(_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");

    let health_status = HealthStatus {
        status: Cow::Borrowed("healthy"),
        timestamp: Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(health_status)))
}

/// System status with build metadata
async fn system_status(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let status = SystemStatus {
        status: Cow::Borrowed("running"),
        timestamp: Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        build_time: Cow::Borrowed(env!("BUILD_TIME")),
        git_hash: Cow::Borrowed(env!("GIT_HASH")),
        migrations: state.manager.get_migrations().len(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

/// Version endpoint
async fn version_info() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))))
}
