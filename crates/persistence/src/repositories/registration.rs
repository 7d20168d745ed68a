//! Registration repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::registration::{
    CheckInOutcome, NewRegistration, Registration, RegistrationStatus, StatusUpdateOutcome,
};

use crate::entities::{RegistrationEntity, RegistrationStatusDb};
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, access_code, participant_id, first_name, last_name, \
     email, phone, age, gender, district, occupation, interest, affiliation, status, \
     qr_payload, created_at, checked_in_at";

/// Outcome of a registration insert.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Registration),
    /// Unique violation on the access-code index; the code already backs a
    /// registration.
    DuplicateCode,
    /// Unique violation on the participant-ID index; the caller picks a
    /// fresh ID and retries.
    DuplicateParticipantId,
}

/// Repository for registration database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a registration row, classifying unique violations by the
    /// constraint that fired.
    pub async fn insert(&self, new: &NewRegistration) -> Result<InsertOutcome, sqlx::Error> {
        let timer = QueryTimer::new("insert_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations (
                id, access_code, participant_id, first_name, last_name, email,
                phone, age, gender, district, occupation, interest, affiliation,
                qr_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(&new.access_code)
        .bind(&new.participant_id)
        .bind(&new.participant.first_name)
        .bind(&new.participant.last_name)
        .bind(&new.participant.email)
        .bind(&new.participant.phone)
        .bind(new.participant.age)
        .bind(&new.participant.gender)
        .bind(&new.participant.district)
        .bind(&new.participant.occupation)
        .bind(&new.participant.interest)
        .bind(&new.participant.affiliation)
        .bind(&new.qr_payload)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(entity) => Ok(InsertOutcome::Inserted(entity.into())),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                match db_err.constraint() {
                    Some("registrations_access_code_key") => Ok(InsertOutcome::DuplicateCode),
                    Some("registrations_participant_id_key") => {
                        Ok(InsertOutcome::DuplicateParticipantId)
                    }
                    _ => Err(sqlx::Error::Database(db_err)),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Find a registration by its ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Registration::from))
    }

    /// Find the registration backed by an access code.
    pub async fn find_by_access_code(
        &self,
        code: &str,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_code");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE access_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Registration::from))
    }

    /// Case-insensitive duplicate-email probe. Best-effort: the access-code
    /// unique index stays the authoritative duplicate gate.
    pub async fn email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("email_taken");
        let result: Result<Option<i32>, sqlx::Error> = sqlx::query_scalar(
            "SELECT 1 FROM registrations WHERE LOWER(email) = LOWER($1) LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.is_some())
    }

    /// Every issued participant ID; input for deriving the pool's used set.
    pub async fn list_participant_ids(&self) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("list_participant_ids");
        let result = sqlx::query_scalar::<_, String>("SELECT participant_id FROM registrations")
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Atomic first-write-wins check-in.
    ///
    /// On zero rows a follow-up read classifies the refusal: a record that
    /// already carries a timestamp reports idempotent success with the
    /// original instant, anything else was never confirmed.
    pub async fn check_in(&self, id: Uuid) -> Result<CheckInOutcome, sqlx::Error> {
        let timer = QueryTimer::new("check_in");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET checked_in_at = NOW()
            WHERE id = $1 AND status = 'confirmed' AND checked_in_at IS NULL
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(entity) = result? {
            return Ok(CheckInOutcome::CheckedIn(entity.into()));
        }

        match self.find_by_id(id).await? {
            None => Ok(CheckInOutcome::NotFound),
            Some(reg) if reg.checked_in_at.is_some() => Ok(CheckInOutcome::AlreadyCheckedIn(reg)),
            Some(reg) => Ok(CheckInOutcome::NotConfirmed(reg.status)),
        }
    }

    /// Applies an admin transition. Only confirmed rows move; the predicate
    /// keeps the transition atomic.
    pub async fn update_status(
        &self,
        id: Uuid,
        to: RegistrationStatus,
    ) -> Result<StatusUpdateOutcome, sqlx::Error> {
        let timer = QueryTimer::new("update_registration_status");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET status = $2
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(RegistrationStatusDb::from(to))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(entity) = result? {
            return Ok(StatusUpdateOutcome::Updated(entity.into()));
        }

        match self.find_by_id(id).await? {
            None => Ok(StatusUpdateOutcome::NotFound),
            Some(reg) => Ok(StatusUpdateOutcome::InvalidTransition(reg.status)),
        }
    }

    /// Newest-first page of registrations with optional status and email
    /// filters.
    pub async fn list(
        &self,
        status: Option<RegistrationStatus>,
        email: Option<&str>,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE ($1 IS NULL OR status = $1)
              AND ($2 IS NULL OR LOWER(email) = LOWER($2))
              AND ($3 IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#
        ))
        .bind(status.map(RegistrationStatusDb::from))
        .bind(email)
        .bind(cursor.map(|(created_at, _)| created_at))
        .bind(cursor.map(|(_, id)| id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Registration::from).collect())
    }
}
