//! Shared utilities and common types for the EventGate backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, passcode comparison)
//! - Common validation logic
//! - Cursor pagination helpers

pub mod crypto;
pub mod pagination;
pub mod validation;
