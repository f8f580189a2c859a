//! In-memory storage for definitions, secrets, assets and the email send log.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_application::{
    AppDefinitionRepository, AssetStore, EmailQuotaRepository, ServiceSecretRepository,
    StoredAsset,
};
use courier_core::{AppError, AppId, AppResult};
use courier_domain::ServiceSecret;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory adapter implementing every action storage port.
#[derive(Default)]
pub struct InMemoryActionStore {
    definitions: RwLock<HashMap<AppId, Value>>,
    secrets: RwLock<Vec<ServiceSecret>>,
    assets: RwLock<HashMap<(AppId, String), StoredAsset>>,
    sends: RwLock<Vec<(AppId, DateTime<Utc>)>>,
}

impl InMemoryActionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces an application definition.
    pub async fn save_definition(&self, app_id: AppId, definition: Value) {
        self.definitions.write().await.insert(app_id, definition);
    }

    /// Stores a service secret whose material is already encrypted.
    pub async fn insert_secret(&self, secret: ServiceSecret) {
        self.secrets.write().await.push(secret);
    }

    /// Stores an application asset.
    pub async fn insert_asset(&self, app_id: AppId, asset_id: impl Into<String>, asset: StoredAsset) {
        self.assets
            .write()
            .await
            .insert((app_id, asset_id.into()), asset);
    }
}

#[async_trait]
impl AppDefinitionRepository for InMemoryActionStore {
    async fn find_definition(&self, app_id: AppId) -> AppResult<Option<Value>> {
        Ok(self.definitions.read().await.get(&app_id).cloned())
    }
}

#[async_trait]
impl ServiceSecretRepository for InMemoryActionStore {
    async fn list_secrets(&self, app_id: AppId) -> AppResult<Vec<ServiceSecret>> {
        let mut secrets = self
            .secrets
            .read()
            .await
            .iter()
            .filter(|secret| secret.app_id == app_id)
            .cloned()
            .collect::<Vec<_>>();
        secrets.sort_by_key(|secret| secret.created_at);
        Ok(secrets)
    }

    async fn update_secret_token(
        &self,
        secret_id: Uuid,
        encrypted_token: &[u8],
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut secrets = self.secrets.write().await;
        let secret = secrets
            .iter_mut()
            .find(|secret| secret.id == secret_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("service secret '{secret_id}' does not exist"))
            })?;

        secret.access_token = Some(encrypted_token.to_vec());
        secret.expires_at = Some(expires_at);
        Ok(())
    }
}

#[async_trait]
impl AssetStore for InMemoryActionStore {
    async fn get_asset(&self, app_id: AppId, asset_id: &str) -> AppResult<Option<StoredAsset>> {
        Ok(self
            .assets
            .read()
            .await
            .get(&(app_id, asset_id.to_owned()))
            .cloned())
    }
}

#[async_trait]
impl EmailQuotaRepository for InMemoryActionStore {
    async fn count_sends_since(&self, app_id: AppId, since: DateTime<Utc>) -> AppResult<u64> {
        let count = self
            .sends
            .read()
            .await
            .iter()
            .filter(|(entry_app, sent_at)| *entry_app == app_id && *sent_at >= since)
            .count();

        u64::try_from(count)
            .map_err(|_| AppError::Internal("email send count overflow".to_owned()))
    }

    async fn record_send(&self, app_id: AppId, sent_at: DateTime<Utc>) -> AppResult<()> {
        self.sends.write().await.push((app_id, sent_at));
        Ok(())
    }
}
