//! Domain layer for the EventGate backend.
//!
//! This crate contains:
//! - Domain models (AccessCode, Participant, Registration, TicketPayload)
//! - Access-code generation and format rules
//! - The participant-ID pool allocator
//! - The shared domain error union

pub mod error;
pub mod models;

pub use error::RegistrationError;
