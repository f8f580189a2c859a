use std::sync::Arc;

use courier_application::{
    ActionDispatchService, AppDefinitionRepository, AssetStore, AuthenticationService,
    EmailQuotaRepository, EmailQuotaService, SecretEncryptor, ServiceSecretRepository,
};
use courier_core::AppError;
use courier_domain::EmailQuotaPolicy;
use courier_infrastructure::{
    AesSecretEncryptor, InMemoryActionStore, PostgresAppDefinitionRepository,
    PostgresAssetStore, PostgresEmailQuotaRepository, PostgresServiceSecretRepository,
    ReqwestRequestForwarder, ReqwestTokenEndpointClient,
};
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackendConfig};
use crate::dev_seed;
use crate::state::AppState;

use super::database::connect_and_migrate;
use super::email::build_mail_transport;

struct StorageAdapters {
    definitions: Arc<dyn AppDefinitionRepository>,
    secrets: Arc<dyn ServiceSecretRepository>,
    assets: Arc<dyn AssetStore>,
    email_quota: Arc<dyn EmailQuotaRepository>,
}

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let secret_encryptor: Arc<dyn SecretEncryptor> =
        Arc::new(AesSecretEncryptor::from_hex(&config.secret_encryption_key)?);

    let storage = match &config.storage {
        StorageBackendConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            StorageAdapters {
                definitions: Arc::new(PostgresAppDefinitionRepository::new(pool.clone())),
                secrets: Arc::new(PostgresServiceSecretRepository::new(pool.clone())),
                assets: Arc::new(PostgresAssetStore::new(pool.clone())),
                email_quota: Arc::new(PostgresEmailQuotaRepository::new(pool)),
            }
        }
        StorageBackendConfig::Memory { seed_file } => {
            let store = Arc::new(InMemoryActionStore::new());
            if let Some(seed_file) = seed_file {
                let seeded_apps =
                    dev_seed::load_from_file(store.as_ref(), secret_encryptor.as_ref(), seed_file)
                        .await?;
                info!(seed_file = %seed_file, seeded_apps, "in-memory storage seeded");
            }
            StorageAdapters {
                definitions: store.clone(),
                secrets: store.clone(),
                assets: store.clone(),
                email_quota: store,
            }
        }
    };

    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let authentication_service = AuthenticationService::new(
        storage.secrets,
        secret_encryptor,
        Arc::new(ReqwestTokenEndpointClient::new(http_client.clone())),
    );
    let email_quota_service = EmailQuotaService::new(
        storage.email_quota,
        EmailQuotaPolicy::from_settings(config.email_quota_enabled, config.email_daily_quota),
    );
    let mail_transport = build_mail_transport(config, http_client)?;

    Ok(AppState {
        action_dispatch_service: ActionDispatchService::new(
            storage.definitions,
            authentication_service,
            Arc::new(ReqwestRequestForwarder::new(config.action_proxy_timeout)?),
            mail_transport,
            storage.assets,
            email_quota_service,
            config.email_from_address.as_str(),
        ),
    })
}
