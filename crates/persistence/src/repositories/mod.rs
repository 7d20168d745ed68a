//! Repository implementations for database access.

pub mod access_code;
pub mod registration;

pub use access_code::{AccessCodeRepository, CreateCodeError};
pub use registration::{InsertOutcome, RegistrationRepository};
