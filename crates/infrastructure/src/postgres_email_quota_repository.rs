use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_application::EmailQuotaRepository;
use courier_core::{AppError, AppId, AppResult};
use sqlx::PgPool;

/// PostgreSQL-backed email send log.
#[derive(Clone)]
pub struct PostgresEmailQuotaRepository {
    pool: PgPool,
}

impl PostgresEmailQuotaRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailQuotaRepository for PostgresEmailQuotaRepository {
    async fn count_sends_since(&self, app_id: AppId, since: DateTime<Utc>) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM app_email_quota_log
            WHERE app_id = $1 AND sent_at >= $2
            "#,
        )
        .bind(app_id.as_uuid())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count email sends for app '{app_id}': {error}"
            ))
        })?;

        u64::try_from(count)
            .map_err(|_| AppError::Internal(format!("negative email send count {count}")))
    }

    async fn record_send(&self, app_id: AppId, sent_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_email_quota_log (app_id, sent_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(app_id.as_uuid())
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record email send for app '{app_id}': {error}"
            ))
        })?;

        Ok(())
    }
}
