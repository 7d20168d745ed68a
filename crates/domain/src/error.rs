//! Domain error union for the registration pipeline.

use thiserror::Error;

/// Errors surfaced by code, registration and check-in operations.
///
/// Every variant carries a stable wire tag so HTTP handlers and jobs report
/// refusals consistently.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(String),

    #[error("Access code not found")]
    CodeNotFound,

    #[error("Access code has already been used")]
    AlreadyUsed,

    #[error("Access code has expired")]
    Expired,

    #[error("A registration with this email already exists")]
    DuplicateRegistration,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Registration is not in a confirmed state")]
    NotConfirmed,

    #[error("Participant ID pool is exhausted")]
    CapacityExhausted,

    #[error("Could not generate a unique access code")]
    GenerationExhausted,

    #[error("Ticket rendering failed: {0}")]
    TicketRender(String),

    #[error("Storage error")]
    Storage(#[from] sqlx::Error),
}

impl RegistrationError {
    /// Stable machine-readable tag reported on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::CodeNotFound | Self::RegistrationNotFound => "not_found",
            Self::AlreadyUsed => "already_used",
            Self::Expired => "expired",
            Self::DuplicateRegistration => "duplicate_registration",
            Self::NotConfirmed => "not_confirmed",
            Self::CapacityExhausted => "capacity_exhausted",
            Self::GenerationExhausted => "generation_exhausted",
            Self::TicketRender(_) => "ticket_render_error",
            Self::Storage(_) => "internal_error",
        }
    }
}
