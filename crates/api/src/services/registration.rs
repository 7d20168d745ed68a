//! Registration workflow orchestration.
//!
//! Owns the pipeline from redemption to ticket: validate, duplicate-email
//! check, reserve the code, allocate a participant ID, persist, render the
//! ticket, dispatch the confirmation email. The registration row is durable
//! before rendering or email dispatch; neither can undo it.

use chrono::Utc;
use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use domain::error::RegistrationError;
use domain::models::registration::{
    CheckInRequest, CheckInResponse, NewRegistration, RegisterRequest, RegisterResponse,
    Registration, ResendResponse, ScanReference,
};
use domain::models::{CheckInOutcome, IdPool, ReserveOutcome, TicketPayload};
use persistence::repositories::{AccessCodeRepository, InsertOutcome, RegistrationRepository};

use crate::app::AppState;
use crate::services::{EmailService, TicketService};

/// Participant-ID collisions tolerated before the registration is abandoned.
const MAX_ALLOCATION_ATTEMPTS: usize = 3;

/// Orchestrates registration, scanner check-in and confirmation resends.
#[derive(Clone)]
pub struct RegistrationService {
    codes: AccessCodeRepository,
    registrations: RegistrationRepository,
    pool: IdPool,
    event_name: String,
    ticket: TicketService,
    email: EmailService,
}

impl RegistrationService {
    /// Builds the service from shared application state.
    pub fn from_state(state: &AppState) -> Self {
        Self {
            codes: AccessCodeRepository::new(state.pool.clone()),
            registrations: RegistrationRepository::new(state.pool.clone()),
            pool: state.config.event.id_pool(),
            event_name: state.config.event.name.clone(),
            ticket: state.ticket.clone(),
            email: state.email.clone(),
        }
    }

    /// Redeems an access code and registers a participant.
    ///
    /// The conditional update inside `reserve` is the only redemption gate;
    /// everything after it either completes the registration or reports why
    /// it could not (the code stays consumed either way, admins can
    /// `release` stranded ones).
    pub async fn register(
        &self,
        mut req: RegisterRequest,
    ) -> Result<RegisterResponse, RegistrationError> {
        req.normalize();
        req.validate()
            .map_err(|e| RegistrationError::Validation(validation_message(&e)))?;

        if self.registrations.email_taken(&req.email).await? {
            return Err(RegistrationError::DuplicateRegistration);
        }

        let reserved = match self.codes.reserve(&req.access_code).await? {
            ReserveOutcome::Reserved(code) => code,
            ReserveOutcome::NotFound => return Err(RegistrationError::CodeNotFound),
            ReserveOutcome::AlreadyUsed => return Err(RegistrationError::AlreadyUsed),
            ReserveOutcome::Expired => return Err(RegistrationError::Expired),
        };

        info!(code = %reserved.code, "Access code reserved");

        let (registration, payload) = self.persist_with_fresh_id(&req, &reserved.code).await?;

        info!(
            registration_id = %registration.id,
            participant_id = %registration.participant_id,
            access_code = %registration.access_code,
            "Registration persisted"
        );
        counter!("registrations_created_total").increment(1);

        let ticket_url = self
            .ticket
            .render(&payload)
            .await
            .map_err(|e| RegistrationError::TicketRender(e.to_string()))?;

        self.dispatch_confirmation(&registration, ticket_url.as_deref());

        Ok(RegisterResponse {
            registration_id: registration.id,
            participant_id: registration.participant_id,
            qr_payload: registration.qr_payload,
            ticket_url,
            status: registration.status,
        })
    }

    /// Allocates a participant ID and inserts the row, retrying on
    /// participant-ID collisions. The unique indexes stay authoritative;
    /// the in-memory scan only narrows the candidate set.
    async fn persist_with_fresh_id(
        &self,
        req: &RegisterRequest,
        code: &str,
    ) -> Result<(Registration, TicketPayload), RegistrationError> {
        let participant = req.participant();
        let issued = self.registrations.list_participant_ids().await?;
        let mut used = self.pool.used_numbers(issued.iter().map(String::as_str));

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let participant_id = self
                .pool
                .allocate(&used)
                .ok_or(RegistrationError::CapacityExhausted)?;

            let id = Uuid::new_v4();
            let payload = TicketPayload::new(
                id,
                participant.full_name(),
                participant.email.clone(),
                self.event_name.clone(),
                Utc::now(),
            );
            let qr_payload = payload
                .encode()
                .map_err(|e| RegistrationError::TicketRender(e.to_string()))?;

            let new = NewRegistration {
                id,
                access_code: code.to_string(),
                participant_id: participant_id.clone(),
                participant: participant.clone(),
                qr_payload,
            };

            match self.registrations.insert(&new).await? {
                InsertOutcome::Inserted(registration) => return Ok((registration, payload)),
                InsertOutcome::DuplicateCode => return Err(RegistrationError::AlreadyUsed),
                InsertOutcome::DuplicateParticipantId => {
                    warn!(
                        attempt,
                        participant_id = %participant_id,
                        "Participant ID collided with a concurrent registration, retrying"
                    );
                    if let Some(n) = self.pool.parse(&participant_id) {
                        used.insert(n);
                    }
                }
            }
        }

        Err(RegistrationError::CapacityExhausted)
    }

    /// Checks in a participant by registration ID or access code.
    ///
    /// Idempotent: a repeated scan reports `already_checked_in` with the
    /// original timestamp.
    pub async fn check_in(&self, req: CheckInRequest) -> Result<CheckInResponse, RegistrationError> {
        req.validate()
            .map_err(|e| RegistrationError::Validation(validation_message(&e)))?;

        let reference = ScanReference::parse(&req.reference).ok_or_else(|| {
            RegistrationError::Validation(
                "reference is neither a registration ID nor an access code".to_string(),
            )
        })?;

        let registration_id = match reference {
            ScanReference::RegistrationId(id) => id,
            ScanReference::AccessCode(code) => {
                match self.registrations.find_by_access_code(&code).await? {
                    Some(reg) => reg.id,
                    None => return Err(RegistrationError::RegistrationNotFound),
                }
            }
        };

        match self.registrations.check_in(registration_id).await? {
            CheckInOutcome::CheckedIn(reg) => {
                info!(
                    registration_id = %reg.id,
                    participant_id = %reg.participant_id,
                    "Participant checked in"
                );
                counter!("checkins_total").increment(1);
                let checked_in_at = reg.checked_in_at.unwrap_or_else(Utc::now);
                Ok(CheckInResponse::new(&reg, false, checked_in_at))
            }
            CheckInOutcome::AlreadyCheckedIn(reg) => {
                let checked_in_at = reg.checked_in_at.unwrap_or_else(Utc::now);
                Ok(CheckInResponse::new(&reg, true, checked_in_at))
            }
            CheckInOutcome::NotConfirmed(_) => Err(RegistrationError::NotConfirmed),
            CheckInOutcome::NotFound => Err(RegistrationError::RegistrationNotFound),
        }
    }

    /// Re-renders the stored ticket payload and resends the confirmation
    /// email.
    pub async fn resend_confirmation(
        &self,
        id: Uuid,
    ) -> Result<ResendResponse, RegistrationError> {
        let registration = self
            .registrations
            .find_by_id(id)
            .await?
            .ok_or(RegistrationError::RegistrationNotFound)?;

        let payload = TicketPayload::decode(&registration.qr_payload)
            .map_err(|e| RegistrationError::TicketRender(e.to_string()))?;
        let ticket_url = self
            .ticket
            .render(&payload)
            .await
            .map_err(|e| RegistrationError::TicketRender(e.to_string()))?;

        self.dispatch_confirmation(&registration, ticket_url.as_deref());

        info!(registration_id = %registration.id, "Confirmation resend queued");

        Ok(ResendResponse {
            registration_id: registration.id,
            email: registration.participant.email.clone(),
            queued: true,
        })
    }

    /// Dispatches the confirmation email without awaiting it. Failures are
    /// logged and counted inside the email service, never surfaced.
    fn dispatch_confirmation(&self, registration: &Registration, ticket_url: Option<&str>) {
        let email = self.email.clone();
        let event_name = self.event_name.clone();
        let to = registration.participant.email.clone();
        let name = registration.participant.full_name();
        let participant_id = registration.participant_id.clone();
        let qr_payload = registration.qr_payload.clone();
        let ticket_url = ticket_url.map(String::from);
        let registration_id = registration.id;

        tokio::spawn(async move {
            if let Err(e) = email
                .send_confirmation(
                    &to,
                    &name,
                    &participant_id,
                    &event_name,
                    &qr_payload,
                    ticket_url.as_deref(),
                )
                .await
            {
                warn!(
                    registration_id = %registration_id,
                    error = %e,
                    "Confirmation email failed"
                );
            }
        });
    }
}

/// Flattens validator output into one stable, human-readable message.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid {}", field));
                format!("{}: {}", field, message)
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
