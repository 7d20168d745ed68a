//! Admin access-code management routes.
//!
//! All handlers here sit behind the admin passcode middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use domain::models::access_code::{
    is_well_formed, AccessCodeSummary, CleanupReport, CreateAccessCodesRequest,
};
use domain::models::ReleaseOutcome;
use persistence::repositories::AccessCodeRepository;
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Query parameters for the code inventory listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListCodesQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Response for the code inventory listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListCodesResponse {
    pub data: Vec<AccessCodeSummary>,
    pub next_cursor: Option<String>,
}

/// POST /api/v1/admin/access-codes
///
/// Generates a batch of unique codes. Partial success is reported, not
/// rolled back; a batch where nothing could be issued answers 503.
pub async fn create_codes(
    State(state): State<AppState>,
    Json(req): Json<CreateAccessCodesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let expires_at = req.expires_at(Utc::now());
    let repo = AccessCodeRepository::new(state.pool.clone());
    let report = repo
        .create_batch(req.count, expires_at, req.event_name.as_deref())
        .await;

    if report.success_count == 0 && report.total_requested > 0 {
        warn!(
            requested = report.total_requested,
            "Batch generation issued no codes"
        );
        return Err(ApiError::GenerationExhausted);
    }

    info!(
        requested = report.total_requested,
        issued = report.success_count,
        expires_at = %expires_at,
        "Access code batch generated"
    );

    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/admin/access-codes
///
/// Cursor-paginated inventory, newest first, with derived status.
pub async fn list_codes(
    State(state): State<AppState>,
    Query(query): Query<ListCodesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let cursor = query
        .cursor
        .as_deref()
        .map(decode_cursor)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid cursor".to_string()))?;

    let repo = AccessCodeRepository::new(state.pool.clone());
    // Fetch one over the page size to learn whether another page exists.
    let mut codes = repo.list(cursor, limit + 1).await?;

    let next_cursor = if codes.len() as i64 > limit {
        codes.truncate(limit as usize);
        codes.last().map(|c| encode_cursor(c.created_at, c.id))
    } else {
        None
    };

    Ok(Json(ListCodesResponse {
        data: codes.into_iter().map(AccessCodeSummary::from).collect(),
        next_cursor,
    }))
}

/// GET /api/v1/admin/access-codes/stats
///
/// Inventory counters split by derived status.
pub async fn code_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = AccessCodeRepository::new(state.pool.clone());
    let stats = repo.stats().await?;
    Ok(Json(stats))
}

/// POST /api/v1/admin/access-codes/:code/release
///
/// Resets a used code that has no registration behind it, returning it to
/// the reservable pool. Codes backing a registration are never released.
pub async fn release_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let normalized = code.trim().to_ascii_uppercase();
    if !is_well_formed(&normalized) {
        return Err(ApiError::Validation(
            "Access code must be 8 characters, A-Z and 0-9".to_string(),
        ));
    }

    let repo = AccessCodeRepository::new(state.pool.clone());
    match repo.release(&normalized).await? {
        ReleaseOutcome::Released(access_code) => {
            info!(code = %access_code.code, "Access code released");
            Ok(Json(AccessCodeSummary::from(access_code)))
        }
        ReleaseOutcome::NotReleasable => Err(ApiError::Conflict(
            "Code is not used or already backs a registration".to_string(),
        )),
        ReleaseOutcome::NotFound => Err(ApiError::NotFound("Access code not found".to_string())),
    }
}

/// DELETE /api/v1/admin/cleanup
///
/// Deletes every expired code immediately, same sweep the hourly job runs.
pub async fn cleanup_expired(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AccessCodeRepository::new(state.pool.clone());
    let deleted_count = repo.cleanup_expired().await?;

    info!(deleted_count, "Expired access codes removed");

    Ok(Json(CleanupReport { deleted_count }))
}
