use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::RegistrationError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Access code has already been used")]
    AlreadyUsed,

    #[error("Access code has expired")]
    Expired,

    #[error("A registration with this email already exists")]
    DuplicateRegistration,

    #[error("Registration is not in a confirmed state")]
    NotConfirmed,

    #[error("Participant ID pool is exhausted")]
    CapacityExhausted,

    #[error("Could not generate a unique access code")]
    GenerationExhausted,

    #[error("Ticket rendering failed: {0}")]
    TicketRender(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::AlreadyUsed => (StatusCode::CONFLICT, "already_used", self.to_string()),
            ApiError::Expired => (StatusCode::CONFLICT, "expired", self.to_string()),
            ApiError::DuplicateRegistration => (
                StatusCode::CONFLICT,
                "duplicate_registration",
                self.to_string(),
            ),
            ApiError::NotConfirmed => (StatusCode::CONFLICT, "not_confirmed", self.to_string()),
            ApiError::CapacityExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "capacity_exhausted",
                self.to_string(),
            ),
            ApiError::GenerationExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "generation_exhausted",
                self.to_string(),
            ),
            ApiError::TicketRender(msg) => (
                StatusCode::BAD_GATEWAY,
                "ticket_render_error",
                format!("Ticket rendering failed: {}", msg),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(msg) => ApiError::Validation(msg),
            RegistrationError::CodeNotFound | RegistrationError::RegistrationNotFound => {
                ApiError::NotFound(err.to_string())
            }
            RegistrationError::AlreadyUsed => ApiError::AlreadyUsed,
            RegistrationError::Expired => ApiError::Expired,
            RegistrationError::DuplicateRegistration => ApiError::DuplicateRegistration,
            RegistrationError::NotConfirmed => ApiError::NotConfirmed,
            RegistrationError::CapacityExhausted => ApiError::CapacityExhausted,
            RegistrationError::GenerationExhausted => ApiError::GenerationExhausted,
            RegistrationError::TicketRender(msg) => ApiError::TicketRender(msg),
            RegistrationError::Storage(source) => {
                ApiError::Internal(format!("Storage error: {}", source))
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("23505") {
                    ApiError::Conflict("Resource already exists".into())
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation(message)
    }
}
