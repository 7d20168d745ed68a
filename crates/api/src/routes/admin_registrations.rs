//! Admin registration management routes.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::registration::{
    ListRegistrationsQuery, ListRegistrationsResponse, RegistrationSummary, StatusUpdateOutcome,
    UpdateStatusRequest,
};
use domain::models::PoolStatusResponse;
use persistence::repositories::RegistrationRepository;
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::RegistrationService;

const DEFAULT_PAGE_SIZE: i64 = 50;

/// How many upcoming IDs the pool status previews.
const NEXT_AVAILABLE_PREVIEW: usize = 10;

/// GET /api/v1/admin/registrations
///
/// Cursor-paginated listing, newest first, with optional `status` and
/// `email` filters.
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.validate()?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let cursor = query
        .cursor
        .as_deref()
        .map(decode_cursor)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid cursor".to_string()))?;

    let repo = RegistrationRepository::new(state.pool.clone());
    // Fetch one over the page size to learn whether another page exists.
    let mut registrations = repo
        .list(query.status, query.email.as_deref(), cursor, limit + 1)
        .await?;

    let next_cursor = if registrations.len() as i64 > limit {
        registrations.truncate(limit as usize);
        registrations
            .last()
            .map(|r| encode_cursor(r.created_at, r.id))
    } else {
        None
    };

    Ok(Json(ListRegistrationsResponse {
        data: registrations
            .into_iter()
            .map(RegistrationSummary::from)
            .collect(),
        next_cursor,
    }))
}

/// GET /api/v1/admin/registrations/:id
///
/// Full registration detail including the participant snapshot.
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let registration = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    Ok(Json(registration))
}

/// PATCH /api/v1/admin/registrations/:id/status
///
/// Transitions a registration. Only `confirmed → cancelled` and
/// `confirmed → attended` are allowed; everything else answers 409.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    match repo.update_status(id, req.status).await? {
        StatusUpdateOutcome::Updated(registration) => {
            info!(
                registration_id = %registration.id,
                status = %registration.status,
                "Registration status updated"
            );
            Ok(Json(registration))
        }
        StatusUpdateOutcome::InvalidTransition(current) => Err(ApiError::Conflict(format!(
            "Cannot transition a {} registration to {}",
            current, req.status
        ))),
        StatusUpdateOutcome::NotFound => {
            Err(ApiError::NotFound("Registration not found".to_string()))
        }
    }
}

/// POST /api/v1/admin/registrations/:id/resend
///
/// Re-renders the stored ticket payload and queues the confirmation email
/// again.
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = RegistrationService::from_state(&state);
    let response = service.resend_confirmation(id).await?;
    Ok(Json(response))
}

/// GET /api/v1/admin/participant-ids
///
/// Pool usage counters plus a short preview of the next available IDs.
pub async fn pool_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let issued = repo.list_participant_ids().await?;

    let pool = state.config.event.id_pool();
    let used = pool.used_numbers(issued.iter().map(String::as_str));

    Ok(Json(PoolStatusResponse {
        prefix: pool.prefix().to_string(),
        usage: pool.usage(&used),
        next_available: pool.next_available(&used, NEXT_AVAILABLE_PREVIEW),
    }))
}
