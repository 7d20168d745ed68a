//! Persistence layer for the EventGate backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query metrics helpers

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
