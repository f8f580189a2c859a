use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_application::ServiceSecretRepository;
use courier_core::{AppError, AppId, AppResult};
use courier_domain::{AuthenticationMethod, ServiceSecret};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct ServiceSecretRow {
    id: Uuid,
    app_id: Uuid,
    service_name: String,
    url_patterns: Vec<String>,
    authentication_method: String,
    identifier: String,
    secret: Vec<u8>,
    token_url: Option<String>,
    access_token: Option<Vec<u8>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ServiceSecretRow> for ServiceSecret {
    type Error = AppError;

    fn try_from(row: ServiceSecretRow) -> Result<Self, Self::Error> {
        let authentication_method = AuthenticationMethod::from_str(
            row.authentication_method.as_str(),
        )
        .map_err(|error| {
            AppError::Internal(format!(
                "stored service secret '{}' is corrupt: {error}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            app_id: AppId::from_uuid(row.app_id),
            service_name: row.service_name,
            url_patterns: row.url_patterns,
            authentication_method,
            identifier: row.identifier,
            secret: row.secret,
            token_url: row.token_url,
            access_token: row.access_token,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed service secret repository.
#[derive(Clone)]
pub struct PostgresServiceSecretRepository {
    pool: PgPool,
}

impl PostgresServiceSecretRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a service secret whose material is already encrypted.
    pub async fn insert_secret(&self, secret: &ServiceSecret) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_service_secrets (
                id,
                app_id,
                service_name,
                url_patterns,
                authentication_method,
                identifier,
                secret,
                token_url,
                access_token,
                expires_at,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(secret.id)
        .bind(secret.app_id.as_uuid())
        .bind(secret.service_name.as_str())
        .bind(&secret.url_patterns)
        .bind(secret.authentication_method.as_str())
        .bind(secret.identifier.as_str())
        .bind(&secret.secret)
        .bind(secret.token_url.as_deref())
        .bind(secret.access_token.as_deref())
        .bind(secret.expires_at)
        .bind(secret.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store service secret '{}': {error}",
                secret.id
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl ServiceSecretRepository for PostgresServiceSecretRepository {
    async fn list_secrets(&self, app_id: AppId) -> AppResult<Vec<ServiceSecret>> {
        let rows = sqlx::query_as::<_, ServiceSecretRow>(
            r#"
            SELECT
                id,
                app_id,
                service_name,
                url_patterns,
                authentication_method,
                identifier,
                secret,
                token_url,
                access_token,
                expires_at,
                created_at
            FROM app_service_secrets
            WHERE app_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(app_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list service secrets for app '{app_id}': {error}"
            ))
        })?;

        rows.into_iter().map(ServiceSecret::try_from).collect()
    }

    async fn update_secret_token(
        &self,
        secret_id: Uuid,
        encrypted_token: &[u8],
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE app_service_secrets
            SET access_token = $2, expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(secret_id)
        .bind(encrypted_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store token for service secret '{secret_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "service secret '{secret_id}' does not exist"
            )));
        }

        Ok(())
    }
}
