use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use courier_core::{AppError, AppResult};
use courier_domain::{AuthenticationMethod, ServiceSecret};
use tracing::{info, warn};

use crate::action_ports::{SecretEncryptor, ServiceSecretRepository, TokenEndpointClient};

use super::decrypt_text;

/// Upper bound for a token lifetime reported by a token endpoint.
const MAX_TOKEN_LIFETIME_SECONDS: i64 = 366 * 24 * 60 * 60;

/// Cached client-credentials bearer tokens, persisted encrypted on the
/// service secret itself.
#[derive(Clone)]
pub(crate) struct TokenCache {
    secret_repository: Arc<dyn ServiceSecretRepository>,
    secret_encryptor: Arc<dyn SecretEncryptor>,
    token_client: Arc<dyn TokenEndpointClient>,
}

impl TokenCache {
    /// Creates a token cache.
    #[must_use]
    pub(crate) fn new(
        secret_repository: Arc<dyn ServiceSecretRepository>,
        secret_encryptor: Arc<dyn SecretEncryptor>,
        token_client: Arc<dyn TokenEndpointClient>,
    ) -> Self {
        Self {
            secret_repository,
            secret_encryptor,
            token_client,
        }
    }

    /// Returns a bearer token for a client-credentials secret, refreshing it
    /// from the token endpoint when the cached one has expired.
    pub(crate) async fn access_token(&self, secret: &ServiceSecret) -> AppResult<String> {
        if secret.authentication_method != AuthenticationMethod::ClientCredentials {
            return Err(AppError::Internal(format!(
                "service secret '{}' does not use client credentials",
                secret.id
            )));
        }

        let now = Utc::now();
        if let Some(ciphertext) = secret.fresh_access_token(now) {
            return decrypt_text(self.secret_encryptor.as_ref(), ciphertext, secret);
        }

        let token_url = secret.token_url.as_deref().ok_or_else(|| {
            AppError::TokenRefreshFailed(format!(
                "service secret '{}' has no token URL",
                secret.id
            ))
        })?;
        let client_secret = decrypt_text(self.secret_encryptor.as_ref(), &secret.secret, secret)?;

        let grant = self
            .token_client
            .request_client_credentials(token_url, secret.identifier.as_str(), &client_secret)
            .await
            .map_err(|error| match error {
                AppError::TokenRefreshFailed(message) => AppError::TokenRefreshFailed(message),
                other => AppError::TokenRefreshFailed(other.to_string()),
            })?;

        let expires_at = token_expiry(now, grant.expires_in)?;
        let encrypted = self
            .secret_encryptor
            .encrypt(grant.access_token.as_bytes())?;

        if let Err(error) = self
            .secret_repository
            .update_secret_token(secret.id, &encrypted, expires_at)
            .await
        {
            warn!(
                error = %error,
                secret_id = %secret.id,
                "failed to persist refreshed client credentials token"
            );
        } else {
            info!(
                secret_id = %secret.id,
                expires_at = %expires_at,
                "refreshed client credentials token"
            );
        }

        Ok(grant.access_token)
    }
}

/// Computes when a freshly granted token stops being reusable. A missing or
/// negative lifetime expires immediately.
fn token_expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> AppResult<DateTime<Utc>> {
    let lifetime = expires_in.unwrap_or(0).max(0);
    if lifetime > MAX_TOKEN_LIFETIME_SECONDS {
        return Err(AppError::TokenRefreshFailed(format!(
            "token endpoint reported an implausible lifetime of {lifetime} seconds"
        )));
    }

    Duration::try_seconds(lifetime)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            AppError::TokenRefreshFailed(format!(
                "token lifetime of {lifetime} seconds is out of range"
            ))
        })
}
