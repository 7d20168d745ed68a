//! Scanner check-in route.

use axum::{extract::State, response::IntoResponse, Json};

use domain::models::registration::CheckInRequest;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RegistrationService;

/// POST /api/v1/scanner/checkin
///
/// Checks a participant in by scanned reference (registration UUID or
/// access code). Idempotent: a second scan answers `200` with
/// `already_checked_in: true` and the original timestamp.
pub async fn check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = RegistrationService::from_state(&state);
    let response = service.check_in(req).await?;
    Ok(Json(response))
}
