use async_trait::async_trait;
use courier_application::AppDefinitionRepository;
use courier_core::{AppError, AppId, AppResult};
use serde_json::Value;
use sqlx::PgPool;

/// PostgreSQL-backed application definition repository.
#[derive(Clone)]
pub struct PostgresAppDefinitionRepository {
    pool: PgPool,
}

impl PostgresAppDefinitionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppDefinitionRepository for PostgresAppDefinitionRepository {
    async fn find_definition(&self, app_id: AppId) -> AppResult<Option<Value>> {
        sqlx::query_scalar::<_, Value>(
            r#"
            SELECT definition
            FROM apps
            WHERE id = $1
            "#,
        )
        .bind(app_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load definition for app '{app_id}': {error}"
            ))
        })
    }
}
