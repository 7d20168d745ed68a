//! Access code entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::access_code::AccessCode;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for access codes.
#[derive(Debug, Clone, FromRow)]
pub struct AccessCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub is_used: bool,
    pub event_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<AccessCodeEntity> for AccessCode {
    fn from(entity: AccessCodeEntity) -> Self {
        AccessCode {
            id: entity.id,
            code: entity.code,
            is_used: entity.is_used,
            event_name: entity.event_name,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            used_at: entity.used_at,
        }
    }
}
