//! Public registration and code verification routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::debug;

use domain::models::access_code::{is_well_formed, VerifyCodeResponse};
use domain::models::registration::RegisterRequest;
use persistence::repositories::AccessCodeRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RegistrationService;

/// POST /api/v1/register
///
/// Redeems an access code and registers a participant. Responds `201` with
/// the participant ID and ticket payload; refusals map per the error
/// taxonomy (used/expired/unknown code, duplicate email, pool exhaustion).
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = RegistrationService::from_state(&state);
    let response = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/verify/:code
///
/// Non-mutating code verification. Always `200`; a malformed or unknown
/// code reports `valid: false` rather than an error, so door staff get a
/// uniform response shape.
pub async fn verify_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let normalized = code.trim().to_ascii_uppercase();

    if !is_well_formed(&normalized) {
        debug!(code = %normalized, "Verify request for malformed code");
        return Ok(Json(VerifyCodeResponse::not_found(&normalized)));
    }

    let repo = AccessCodeRepository::new(state.pool.clone());
    let response = match repo.find_by_code(&normalized).await? {
        Some(access_code) => VerifyCodeResponse::from_code(&access_code, Utc::now()),
        None => VerifyCodeResponse::not_found(&normalized),
    };

    Ok(Json(response))
}
