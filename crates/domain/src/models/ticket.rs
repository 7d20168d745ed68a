//! Ticket payload issued to registered participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag embedded in every ticket payload.
pub const TICKET_KIND: &str = "event-ticket";

/// Participant identity embedded in a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketParticipant {
    pub name: String,
    pub email: String,
}

/// The machine-readable payload behind a ticket QR.
///
/// The serialized form is persisted on the registration and embedded in the
/// confirmation email; rendering it into an image is delegated to the client
/// or an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketPayload {
    pub registration_id: Uuid,
    pub kind: String,
    pub participant: TicketParticipant,
    pub event: String,
    pub issued_at: DateTime<Utc>,
}

impl TicketPayload {
    pub fn new(
        registration_id: Uuid,
        participant_name: String,
        participant_email: String,
        event: String,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            registration_id,
            kind: TICKET_KIND.to_string(),
            participant: TicketParticipant {
                name: participant_name,
                email: participant_email,
            },
            event,
            issued_at,
        }
    }

    /// Compact JSON form, exactly what gets rendered and stored.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a payload previously produced by [`TicketPayload::encode`].
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
