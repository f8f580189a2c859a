//! In-process fakes for the action ports, shared by service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use courier_core::{AppError, AppId, AppResult};
use courier_domain::{AuthenticationMethod, ServiceSecret};

use crate::action_ports::{
    AppDefinitionRepository, AssetStore, EmailQuotaRepository, MailTransport, OutboundRequest,
    OutgoingEmail, RequestForwarder, SecretEncryptor, ServiceSecretRepository, StoredAsset,
    TokenEndpointClient, TokenGrant, UpstreamResponse,
};

fn lock_error<T>(error: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(format!("failed to lock fake state: {error}"))
}

/// Marks ciphertext with a prefix so tests notice missing decryption.
pub struct PrefixEncryptor;

impl SecretEncryptor for PrefixEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let mut result = b"enc:".to_vec();
        result.extend_from_slice(plaintext);
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        ciphertext
            .strip_prefix(b"enc:")
            .map(<[u8]>::to_vec)
            .ok_or_else(|| AppError::Internal("ciphertext is missing prefix".to_owned()))
    }
}

pub fn encrypted(value: &str) -> Vec<u8> {
    format!("enc:{value}").into_bytes()
}

/// Builds a secret created `order` seconds after a fixed base time.
pub fn service_secret(
    app_id: AppId,
    order: i64,
    method: AuthenticationMethod,
    patterns: &[&str],
    identifier: &str,
    secret: &str,
) -> ServiceSecret {
    ServiceSecret {
        id: Uuid::new_v4(),
        app_id,
        service_name: format!("service {order}"),
        url_patterns: patterns.iter().map(|pattern| (*pattern).to_owned()).collect(),
        authentication_method: method,
        identifier: identifier.to_owned(),
        secret: encrypted(secret),
        token_url: None,
        access_token: None,
        expires_at: None,
        created_at: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(order),
    }
}

#[derive(Default)]
pub struct FakeSecretRepository {
    pub secrets: Mutex<Vec<ServiceSecret>>,
    pub token_updates: Mutex<Vec<(Uuid, Vec<u8>, DateTime<Utc>)>>,
}

impl FakeSecretRepository {
    pub fn with_secrets(secrets: Vec<ServiceSecret>) -> Self {
        Self {
            secrets: Mutex::new(secrets),
            token_updates: Mutex::new(Vec::new()),
        }
    }

    pub fn token_update_count(&self) -> usize {
        self.token_updates
            .lock()
            .map(|updates| updates.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ServiceSecretRepository for FakeSecretRepository {
    async fn list_secrets(&self, app_id: AppId) -> AppResult<Vec<ServiceSecret>> {
        Ok(self
            .secrets
            .lock()
            .map_err(lock_error)?
            .iter()
            .filter(|secret| secret.app_id == app_id)
            .cloned()
            .collect())
    }

    async fn update_secret_token(
        &self,
        secret_id: Uuid,
        encrypted_token: &[u8],
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut secrets = self.secrets.lock().map_err(lock_error)?;
        if let Some(secret) = secrets.iter_mut().find(|secret| secret.id == secret_id) {
            secret.access_token = Some(encrypted_token.to_vec());
            secret.expires_at = Some(expires_at);
        }

        self.token_updates.lock().map_err(lock_error)?.push((
            secret_id,
            encrypted_token.to_vec(),
            expires_at,
        ));
        Ok(())
    }
}

/// Token endpoint that hands out numbered tokens, or fails when `fail` is set.
#[derive(Default)]
pub struct FakeTokenClient {
    pub calls: Mutex<Vec<(String, String, String)>>,
    pub fail: bool,
    pub lifetime_seconds: Option<i64>,
}

impl FakeTokenClient {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
            lifetime_seconds: None,
        }
    }

    pub fn with_lifetime(lifetime_seconds: i64) -> Self {
        Self {
            lifetime_seconds: Some(lifetime_seconds),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TokenEndpointClient for FakeTokenClient {
    async fn request_client_credentials(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<TokenGrant> {
        let mut calls = self.calls.lock().map_err(lock_error)?;
        calls.push((
            token_url.to_owned(),
            client_id.to_owned(),
            client_secret.to_owned(),
        ));

        if self.fail {
            return Err(AppError::TokenRefreshFailed(
                "token endpoint returned 401".to_owned(),
            ));
        }

        Ok(TokenGrant {
            access_token: format!("fresh-token-{}", calls.len()),
            expires_in: Some(self.lifetime_seconds.unwrap_or(3600)),
        })
    }
}

#[derive(Default)]
pub struct FakeDefinitionRepository {
    pub definitions: HashMap<AppId, Value>,
}

#[async_trait]
impl AppDefinitionRepository for FakeDefinitionRepository {
    async fn find_definition(&self, app_id: AppId) -> AppResult<Option<Value>> {
        Ok(self.definitions.get(&app_id).cloned())
    }
}

/// Forwarder that records requests and answers with a canned response.
pub struct FakeForwarder {
    pub requests: Mutex<Vec<OutboundRequest>>,
    pub response: AppResult<UpstreamResponse>,
}

impl FakeForwarder {
    pub fn responding(response: UpstreamResponse) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response: Ok(response),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response: Err(AppError::UpstreamUnreachable(
                "connection refused".to_owned(),
            )),
        }
    }

    pub fn recorded(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RequestForwarder for FakeForwarder {
    async fn forward(&self, request: OutboundRequest) -> AppResult<UpstreamResponse> {
        self.requests.lock().map_err(lock_error)?.push(request);
        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err(error) => Err(AppError::UpstreamUnreachable(error.to_string())),
        }
    }
}

#[derive(Default)]
pub struct FakeMailTransport {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl FakeMailTransport {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for FakeMailTransport {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("smtp relay rejected message".to_owned()));
        }

        self.sent.lock().map_err(lock_error)?.push(email);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAssetStore {
    pub assets: HashMap<(AppId, String), StoredAsset>,
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn get_asset(&self, app_id: AppId, asset_id: &str) -> AppResult<Option<StoredAsset>> {
        Ok(self.assets.get(&(app_id, asset_id.to_owned())).cloned())
    }
}

#[derive(Default)]
pub struct FakeQuotaRepository {
    pub entries: Mutex<Vec<(AppId, DateTime<Utc>)>>,
    pub fail_writes: bool,
}

impl FakeQuotaRepository {
    pub fn entry_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EmailQuotaRepository for FakeQuotaRepository {
    async fn count_sends_since(&self, app_id: AppId, since: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .entries
            .lock()
            .map_err(lock_error)?
            .iter()
            .filter(|(entry_app, sent_at)| *entry_app == app_id && *sent_at >= since)
            .count() as u64)
    }

    async fn record_send(&self, app_id: AppId, sent_at: DateTime<Utc>) -> AppResult<()> {
        if self.fail_writes {
            return Err(AppError::Internal("quota log is read-only".to_owned()));
        }
        self.entries.lock().map_err(lock_error)?.push((app_id, sent_at));
        Ok(())
    }
}
