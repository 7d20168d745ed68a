//! HTTP route handlers.

pub mod admin_codes;
pub mod admin_registrations;
pub mod health;
pub mod registrations;
pub mod scanner;
