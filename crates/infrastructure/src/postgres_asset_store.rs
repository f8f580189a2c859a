use async_trait::async_trait;
use courier_application::{AssetStore, StoredAsset};
use courier_core::{AppError, AppId, AppResult};
use sqlx::{FromRow, PgPool};

#[derive(FromRow)]
struct AssetRow {
    data: Vec<u8>,
    filename: Option<String>,
    mime: Option<String>,
}

/// PostgreSQL-backed application asset store.
#[derive(Clone)]
pub struct PostgresAssetStore {
    pool: PgPool,
}

impl PostgresAssetStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetStore for PostgresAssetStore {
    async fn get_asset(&self, app_id: AppId, asset_id: &str) -> AppResult<Option<StoredAsset>> {
        let row = sqlx::query_as::<_, AssetRow>(
            r#"
            SELECT data, filename, mime
            FROM app_assets
            WHERE app_id = $1 AND id = $2
            "#,
        )
        .bind(app_id.as_uuid())
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load asset '{asset_id}' for app '{app_id}': {error}"
            ))
        })?;

        Ok(row.map(|row| StoredAsset {
            data: row.data,
            filename: row.filename,
            mime: row.mime,
        }))
    }
}
