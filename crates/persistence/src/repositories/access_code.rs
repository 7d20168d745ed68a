//! Access code repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::access_code::{
    code_format_ok, generate_candidate, AccessCode, CodeStats, GenerationFailure,
    GenerationReport, ReleaseOutcome, ReserveOutcome,
};

use crate::entities::AccessCodeEntity;
use crate::metrics::QueryTimer;

/// Candidate attempts per code before giving up.
const GENERATION_ATTEMPTS: u32 = 10;

/// Tolerated duplicate-key losses on insert before giving up.
const INSERT_RETRIES: u32 = 3;

/// Error from unique-code creation.
#[derive(Debug, thiserror::Error)]
pub enum CreateCodeError {
    /// The attempt budget ran out without landing a unique code.
    #[error("could not produce a unique code in {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Repository for access-code database operations.
#[derive(Clone)]
pub struct AccessCodeRepository {
    pool: PgPool,
}

impl AccessCodeRepository {
    /// Creates a new AccessCodeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a code by its exact value.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<AccessCode>, sqlx::Error> {
        let timer = QueryTimer::new("find_code");
        let result = sqlx::query_as::<_, AccessCodeEntity>(
            r#"
            SELECT id, code, is_used, event_name, created_at, expires_at, used_at
            FROM access_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(AccessCode::from))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("code_exists");
        let result: Result<Option<i32>, sqlx::Error> =
            sqlx::query_scalar("SELECT 1 FROM access_codes WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        Ok(result?.is_some())
    }

    /// Insert a code row. Uniqueness violations surface as database errors.
    pub async fn insert(
        &self,
        code: &str,
        expires_at: DateTime<Utc>,
        event_name: Option<&str>,
    ) -> Result<AccessCode, sqlx::Error> {
        let timer = QueryTimer::new("insert_code");
        let result = sqlx::query_as::<_, AccessCodeEntity>(
            r#"
            INSERT INTO access_codes (code, expires_at, event_name)
            VALUES ($1, $2, $3)
            RETURNING id, code, is_used, event_name, created_at, expires_at, used_at
            "#,
        )
        .bind(code)
        .bind(expires_at)
        .bind(event_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    /// Produces and stores one unique code.
    ///
    /// Candidates failing the format rules or already present burn one
    /// generation attempt; losing a duplicate-key race on insert burns one
    /// insert retry. Either budget running out yields `Exhausted`.
    pub async fn create_unique(
        &self,
        expires_at: DateTime<Utc>,
        event_name: Option<&str>,
    ) -> Result<AccessCode, CreateCodeError> {
        let mut attempts = 0u32;
        let mut race_losses = 0u32;

        while attempts < GENERATION_ATTEMPTS {
            attempts += 1;
            let candidate = generate_candidate();
            if !code_format_ok(&candidate) {
                continue;
            }
            if self.code_exists(&candidate).await? {
                continue;
            }
            match self.insert(&candidate, expires_at, event_name).await {
                Ok(code) => return Ok(code),
                Err(err) if is_unique_violation(&err) => {
                    // Lost the insert race to a concurrent writer.
                    race_losses += 1;
                    if race_losses >= INSERT_RETRIES {
                        return Err(CreateCodeError::Exhausted { attempts });
                    }
                }
                Err(err) => return Err(CreateCodeError::Db(err)),
            }
        }

        Err(CreateCodeError::Exhausted {
            attempts: GENERATION_ATTEMPTS,
        })
    }

    /// Issues a batch of codes, collecting per-index failures. Partial
    /// success is reported, never rolled back.
    pub async fn create_batch(
        &self,
        count: u32,
        expires_at: DateTime<Utc>,
        event_name: Option<&str>,
    ) -> GenerationReport {
        let mut issued = Vec::with_capacity(count as usize);
        let mut errors = Vec::new();

        for index in 0..count {
            match self.create_unique(expires_at, event_name).await {
                Ok(code) => issued.push(code),
                Err(CreateCodeError::Exhausted { attempts }) => {
                    errors.push(GenerationFailure {
                        index,
                        message: format!("exhausted after {} attempts", attempts),
                    });
                }
                Err(CreateCodeError::Db(err)) => {
                    tracing::error!(index, error = %err, "code generation storage error");
                    errors.push(GenerationFailure {
                        index,
                        message: "storage error".to_string(),
                    });
                }
            }
        }

        let success_count = issued.len() as u32;
        GenerationReport {
            issued,
            errors,
            success_count,
            total_requested: count,
        }
    }

    /// Atomically reserves a code. The conditional update is the only
    /// redemption gate; exactly one concurrent caller observes a row.
    ///
    /// On zero rows a follow-up read classifies the refusal for reporting.
    /// A row that reads back reservable was taken and released by nobody:
    /// a concurrent writer interleaved, so it reports as already used.
    pub async fn reserve(&self, code: &str) -> Result<ReserveOutcome, sqlx::Error> {
        let timer = QueryTimer::new("reserve_code");
        let result = sqlx::query_as::<_, AccessCodeEntity>(
            r#"
            UPDATE access_codes
            SET is_used = TRUE, used_at = NOW()
            WHERE code = $1 AND is_used = FALSE AND expires_at > NOW()
            RETURNING id, code, is_used, event_name, created_at, expires_at, used_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(entity) = result? {
            return Ok(ReserveOutcome::Reserved(entity.into()));
        }

        match self.find_by_code(code).await? {
            None => Ok(ReserveOutcome::NotFound),
            Some(existing) if existing.is_used => Ok(ReserveOutcome::AlreadyUsed),
            Some(existing) if existing.expires_at <= Utc::now() => Ok(ReserveOutcome::Expired),
            Some(_) => Ok(ReserveOutcome::AlreadyUsed),
        }
    }

    /// Resets a used code that has no registration behind it. Escape hatch
    /// for codes stranded by a crash between reserve and persist.
    pub async fn release(&self, code: &str) -> Result<ReleaseOutcome, sqlx::Error> {
        let timer = QueryTimer::new("release_code");
        let result = sqlx::query_as::<_, AccessCodeEntity>(
            r#"
            UPDATE access_codes
            SET is_used = FALSE, used_at = NULL
            WHERE code = $1
              AND is_used = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM registrations r WHERE r.access_code = access_codes.code
              )
            RETURNING id, code, is_used, event_name, created_at, expires_at, used_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        if let Some(entity) = result? {
            return Ok(ReleaseOutcome::Released(entity.into()));
        }

        match self.find_by_code(code).await? {
            None => Ok(ReleaseOutcome::NotFound),
            Some(_) => Ok(ReleaseOutcome::NotReleasable),
        }
    }

    /// Deletes every code whose expiry has passed, used or not.
    pub async fn cleanup_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("cleanup_expired_codes");
        let result = sqlx::query("DELETE FROM access_codes WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Inventory counters matching the derived status rules: used wins over
    /// expired, expired only counts unused codes past expiry.
    pub async fn stats(&self) -> Result<CodeStats, sqlx::Error> {
        let timer = QueryTimer::new("code_stats");
        let result: Result<(i64, i64, i64, i64), sqlx::Error> = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE NOT is_used AND expires_at > NOW()),
                COUNT(*) FILTER (WHERE is_used),
                COUNT(*) FILTER (WHERE NOT is_used AND expires_at <= NOW())
            FROM access_codes
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let (total, unused, used, expired) = result?;
        Ok(CodeStats {
            total,
            unused,
            used,
            expired,
        })
    }

    /// Newest-first page of codes for the admin inventory.
    pub async fn list(
        &self,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<AccessCode>, sqlx::Error> {
        let timer = QueryTimer::new("list_codes");
        let result = sqlx::query_as::<_, AccessCodeEntity>(
            r#"
            SELECT id, code, is_used, event_name, created_at, expires_at, used_at
            FROM access_codes
            WHERE ($1 IS NULL OR (created_at, id) < ($1, $2))
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(cursor.map(|(created_at, _)| created_at))
        .bind(cursor.map(|(_, id)| id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(AccessCode::from).collect())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
