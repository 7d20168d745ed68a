//! Domain models for EventGate.

pub mod access_code;
pub mod participant;
pub mod registration;
pub mod ticket;

pub use access_code::{AccessCode, CodeStatus, ReleaseOutcome, ReserveOutcome};
pub use participant::{IdPool, Participant, PoolStatusResponse};
pub use registration::{CheckInOutcome, Registration, RegistrationStatus};
pub use ticket::TicketPayload;
