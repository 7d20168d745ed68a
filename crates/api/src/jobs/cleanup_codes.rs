//! Expired access-code cleanup job.

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use persistence::repositories::AccessCodeRepository;

use super::scheduler::{Job, JobFrequency};

/// Hourly sweep that deletes expired access codes, used or not.
///
/// Expiry is evaluated against database `NOW()`, same rule the reserve gate
/// applies, so the sweep can never delete a code that would still reserve.
pub struct CleanupCodesJob {
    repo: AccessCodeRepository,
}

impl CleanupCodesJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: AccessCodeRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for CleanupCodesJob {
    fn name(&self) -> &'static str {
        "cleanup_codes"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let deleted = self
            .repo
            .cleanup_expired()
            .await
            .context("failed to delete expired access codes")?;

        if deleted > 0 {
            info!(deleted, "Cleaned up expired access codes");
            metrics::counter!("expired_codes_deleted_total").increment(deleted);
        }

        Ok(())
    }
}
