//! Database entity definitions.

pub mod access_code;
pub mod registration;

pub use access_code::AccessCodeEntity;
pub use registration::{RegistrationEntity, RegistrationStatusDb};
