use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::{AppId, AppResult};
use courier_domain::ServiceSecret;
use uuid::Uuid;

/// Repository port for per-application service secrets.
#[async_trait]
pub trait ServiceSecretRepository: Send + Sync {
    /// Lists all secrets of an application in ascending creation order.
    async fn list_secrets(&self, app_id: AppId) -> AppResult<Vec<ServiceSecret>>;

    /// Overwrites the cached client-credentials token of a secret.
    async fn update_secret_token(
        &self,
        secret_id: Uuid,
        encrypted_token: &[u8],
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Port for encrypting/decrypting secret material at rest.
pub trait SecretEncryptor: Send + Sync {
    /// Encrypts plaintext for storage.
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>>;

    /// Decrypts stored ciphertext.
    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>>;
}

/// Token issued by a client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token value.
    pub access_token: String,
    /// Lifetime in seconds as reported by the token endpoint.
    pub expires_in: Option<i64>,
}

impl Debug for TokenGrant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenGrant")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Port for OAuth2 token endpoints.
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    /// Performs a client-credentials grant against `token_url`.
    async fn request_client_credentials(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<TokenGrant>;
}
