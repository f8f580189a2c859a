//! Development fixtures for the in-memory storage backend.
//!
//! The fixture is a JSON document listing applications with their
//! definitions, service secrets (in plaintext, encrypted on load) and assets
//! (read from files relative to the fixture).

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use courier_application::{SecretEncryptor, StoredAsset};
use courier_core::{AppError, AppId, AppResult};
use courier_domain::{AuthenticationMethod, ServiceSecret};
use courier_infrastructure::InMemoryActionStore;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct DevSeed {
    #[serde(default)]
    apps: Vec<SeedApp>,
}

#[derive(Debug, Deserialize)]
struct SeedApp {
    id: AppId,
    definition: Value,
    #[serde(default)]
    secrets: Vec<SeedSecret>,
    #[serde(default)]
    assets: Vec<SeedAsset>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedSecret {
    service_name: String,
    url_patterns: Vec<String>,
    authentication_method: AuthenticationMethod,
    identifier: String,
    secret: String,
    #[serde(default)]
    token_url: Option<String>,
}

impl std::fmt::Debug for SeedSecret {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SeedSecret")
            .field("service_name", &self.service_name)
            .field("authentication_method", &self.authentication_method)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SeedAsset {
    id: String,
    path: PathBuf,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    mime: Option<String>,
}

/// Loads the fixture at `seed_file` into `store` and returns the number of
/// applications seeded.
pub async fn load_from_file(
    store: &InMemoryActionStore,
    encryptor: &dyn SecretEncryptor,
    seed_file: &str,
) -> AppResult<usize> {
    let seed_path = Path::new(seed_file);
    let raw = tokio::fs::read_to_string(seed_path).await.map_err(|error| {
        AppError::Validation(format!("failed to read DEV_SEED_FILE '{seed_file}': {error}"))
    })?;
    let seed = serde_json::from_str::<DevSeed>(&raw).map_err(|error| {
        AppError::Validation(format!("invalid DEV_SEED_FILE '{seed_file}': {error}"))
    })?;

    let base_dir = seed_path.parent().unwrap_or_else(|| Path::new("."));
    apply_seed(store, encryptor, seed, base_dir).await
}

async fn apply_seed(
    store: &InMemoryActionStore,
    encryptor: &dyn SecretEncryptor,
    seed: DevSeed,
    base_dir: &Path,
) -> AppResult<usize> {
    let seeded_apps = seed.apps.len();
    // Secrets apply in creation order, so keep the fixture order visible in
    // `created_at`.
    let base_time = Utc::now();
    let mut sequence = 0_i64;

    for app in seed.apps {
        store.save_definition(app.id, app.definition).await;

        for secret in app.secrets {
            store
                .insert_secret(ServiceSecret {
                    id: Uuid::new_v4(),
                    app_id: app.id,
                    service_name: secret.service_name,
                    url_patterns: secret.url_patterns,
                    authentication_method: secret.authentication_method,
                    identifier: secret.identifier,
                    secret: encryptor.encrypt(secret.secret.as_bytes())?,
                    token_url: secret.token_url,
                    access_token: None,
                    expires_at: None,
                    created_at: base_time + Duration::milliseconds(sequence),
                })
                .await;
            sequence += 1;
        }

        for asset in app.assets {
            let asset_path = base_dir.join(&asset.path);
            let data = tokio::fs::read(&asset_path).await.map_err(|error| {
                AppError::Validation(format!(
                    "failed to read seed asset '{}': {error}",
                    asset_path.display()
                ))
            })?;
            store
                .insert_asset(
                    app.id,
                    asset.id,
                    StoredAsset {
                        data,
                        filename: asset.filename,
                        mime: asset.mime,
                    },
                )
                .await;
        }
    }

    Ok(seeded_apps)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use courier_application::{
        AppDefinitionRepository, AssetStore, SecretEncryptor, ServiceSecretRepository,
    };
    use courier_core::{AppId, AppResult};
    use courier_domain::AuthenticationMethod;
    use courier_infrastructure::{AesSecretEncryptor, InMemoryActionStore};
    use serde_json::json;

    use super::{DevSeed, apply_seed, load_from_file};

    const APP_ID: &str = "0b4f1c8e-5a57-4b0f-9d35-6a4f0b1f7c11";

    #[tokio::test]
    async fn seeds_definitions_and_encrypted_secrets_in_order() -> AppResult<()> {
        let store = InMemoryActionStore::new();
        let encryptor = AesSecretEncryptor::new(&[7_u8; 32]);
        let seed = serde_json::from_value::<DevSeed>(json!({
            "apps": [{
                "id": APP_ID,
                "definition": { "orders": { "type": "request", "method": "GET", "url": "https://api.example.com/orders" } },
                "secrets": [
                    {
                        "serviceName": "Orders",
                        "urlPatterns": ["https://api.example.com/"],
                        "authenticationMethod": "http-basic",
                        "identifier": "barista",
                        "secret": "espresso"
                    },
                    {
                        "serviceName": "Orders key",
                        "urlPatterns": ["https://api.example.com/"],
                        "authenticationMethod": "query-parameter",
                        "identifier": "key",
                        "secret": "k1"
                    }
                ]
            }]
        }))
        .map_err(|error| courier_core::AppError::Internal(error.to_string()))?;

        let seeded = apply_seed(&store, &encryptor, seed, Path::new(".")).await?;
        let app_id = APP_ID.parse::<AppId>()?;

        assert_eq!(seeded, 1);
        assert!(store.find_definition(app_id).await?.is_some());

        let secrets = store.list_secrets(app_id).await?;
        assert_eq!(secrets.len(), 2);
        assert_eq!(
            secrets[0].authentication_method,
            AuthenticationMethod::HttpBasic
        );
        assert!(secrets[0].created_at < secrets[1].created_at);
        assert_ne!(secrets[0].secret, b"espresso".to_vec());
        assert_eq!(encryptor.decrypt(&secrets[0].secret)?, b"espresso".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn assets_are_read_relative_to_the_fixture() -> AppResult<()> {
        let directory = std::env::temp_dir().join(format!("courier-seed-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&directory)
            .map_err(|error| courier_core::AppError::Internal(error.to_string()))?;
        std::fs::write(directory.join("menu.txt"), b"espresso 2.50")
            .map_err(|error| courier_core::AppError::Internal(error.to_string()))?;
        let fixture = json!({
            "apps": [{
                "id": APP_ID,
                "definition": {},
                "assets": [{ "id": "menu", "path": "menu.txt", "filename": "menu.txt", "mime": "text/plain" }]
            }]
        });
        let seed_file = directory.join("seed.json");
        std::fs::write(&seed_file, fixture.to_string())
            .map_err(|error| courier_core::AppError::Internal(error.to_string()))?;

        let store = InMemoryActionStore::new();
        let encryptor = AesSecretEncryptor::new(&[7_u8; 32]);
        let seeded =
            load_from_file(&store, &encryptor, &seed_file.to_string_lossy()).await?;
        let asset = store
            .get_asset(APP_ID.parse::<AppId>()?, "menu")
            .await?
            .map(|asset| asset.data);

        assert_eq!(seeded, 1);
        assert_eq!(asset, Some(b"espresso 2.50".to_vec()));
        let _ = std::fs::remove_dir_all(&directory);
        Ok(())
    }

    #[tokio::test]
    async fn missing_fixture_is_a_validation_error() {
        let store = InMemoryActionStore::new();
        let encryptor = AesSecretEncryptor::new(&[7_u8; 32]);

        let result = load_from_file(&store, &encryptor, "/nonexistent/courier-seed.json").await;

        assert!(matches!(result, Err(courier_core::AppError::Validation(_))));
    }
}
