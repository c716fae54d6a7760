//! Handler helpers

use actix_web::HttpRequest;

use crate::auth::Identity;
use crate::server::state::AppState;
use crate::utils::error::{EngineError, Result};

/// Header carrying the operator API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the phase token for export calls
pub const PHASE_TOKEN_HEADER: &str = "x-phase-token";

/// Resolve the caller identity from the API key header.
pub fn identify(req: &HttpRequest, state: &AppState) -> Result<Identity> {
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| EngineError::unauthorized("missing API key"))?;
    state.auth.identify(key)
}

/// Extract the phase token header.
pub fn phase_token(req: &HttpRequest) -> Result<String> {
    req.headers()
        .get(PHASE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| EngineError::unauthorized("missing phase token"))
}
