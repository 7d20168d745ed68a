//! Registration entity for database operations.

use chrono::{DateTime, Utc};
use domain::models::participant::Participant;
use domain::models::registration::{Registration, RegistrationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database mapping for the `registration_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Confirmed,
    Cancelled,
    Attended,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db_status: RegistrationStatusDb) -> Self {
        match db_status {
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
            RegistrationStatusDb::Attended => RegistrationStatus::Attended,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
            RegistrationStatus::Attended => RegistrationStatusDb::Attended,
        }
    }
}

/// Database entity for registrations. The participant snapshot is embedded
/// in the row.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub access_code: String,
    pub participant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub age: i32,
    pub gender: String,
    pub district: String,
    pub occupation: String,
    pub interest: String,
    pub affiliation: Option<String>,
    pub status: RegistrationStatusDb,
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Registration {
            id: entity.id,
            access_code: entity.access_code,
            participant_id: entity.participant_id,
            participant: Participant {
                first_name: entity.first_name,
                last_name: entity.last_name,
                email: entity.email,
                phone: entity.phone,
                age: entity.age,
                gender: entity.gender,
                district: entity.district,
                occupation: entity.occupation,
                interest: entity.interest,
                affiliation: entity.affiliation,
            },
            status: entity.status.into(),
            qr_payload: entity.qr_payload,
            created_at: entity.created_at,
            checked_in_at: entity.checked_in_at,
        }
    }
}
