//! Phase token issuance

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{Action, SCOPE_DOWNLOAD, SCOPE_EXPORT};
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::server::utils::identify;
use crate::utils::error::{EngineError, Result};

/// Configure token routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/tokens", web::post().to(issue_token));
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    scope: String,
}

#[derive(Debug, Serialize)]
struct IssuedToken {
    token: String,
    scope: String,
    expires_in_secs: u64,
}

fn check_scope(scope: &str) -> Result<()> {
    match scope {
        SCOPE_EXPORT | SCOPE_DOWNLOAD => Ok(()),
        other => Err(EngineError::validation(format!(
            "unknown token scope: {}",
            other
        ))),
    }
}

/// Issue a short-lived token for one export phase scope.
async fn issue_token(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TokenRequest>,
) -> Result<HttpResponse> {
    let identity = identify(&req, &state)?;
    state.auth.authorize(&identity, Action::IssueToken)?;
    check_scope(&body.scope)?;

    let token = state.tokens.issue(&identity, &body.scope);
    Ok(HttpResponse::Ok().json(ApiResponse::success(IssuedToken {
        token,
        scope: body.scope.clone(),
        expires_in_secs: state.config.auth().token_ttl_secs,
    })))
}
