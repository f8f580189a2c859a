//! Outbound authentication for request actions.
//!
//! Eligible service secrets are folded, oldest first, into one
//! [`AugmentationSet`]. `Authorization` and the TLS client identity go to the
//! first secret that claims them; cookies and query parameters accumulate.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use courier_core::{AppError, AppId, AppResult};
use courier_domain::{AugmentationSet, AuthenticationMethod, ClientIdentity, ServiceSecret};
use tracing::{debug, warn};

use crate::action_ports::{SecretEncryptor, ServiceSecretRepository, TokenEndpointClient};

mod token_cache;

use token_cache::TokenCache;

/// Application service resolving service secrets into request augmentations.
#[derive(Clone)]
pub struct AuthenticationService {
    secret_repository: Arc<dyn ServiceSecretRepository>,
    secret_encryptor: Arc<dyn SecretEncryptor>,
    token_cache: TokenCache,
}

impl AuthenticationService {
    /// Creates a new authentication service.
    #[must_use]
    pub fn new(
        secret_repository: Arc<dyn ServiceSecretRepository>,
        secret_encryptor: Arc<dyn SecretEncryptor>,
        token_client: Arc<dyn TokenEndpointClient>,
    ) -> Self {
        let token_cache = TokenCache::new(
            secret_repository.clone(),
            secret_encryptor.clone(),
            token_client,
        );

        Self {
            secret_repository,
            secret_encryptor,
            token_cache,
        }
    }

    /// Builds the augmentations for one outbound call to `url`.
    pub async fn augmentations_for(&self, app_id: AppId, url: &str) -> AppResult<AugmentationSet> {
        let mut secrets = self
            .secret_repository
            .list_secrets(app_id)
            .await?
            .into_iter()
            .filter(|secret| secret.is_eligible_for(url))
            .collect::<Vec<_>>();
        secrets.sort_by_key(|secret| secret.created_at);

        let mut augmentations = AugmentationSet::new();
        for secret in &secrets {
            self.apply_secret(secret, &mut augmentations).await?;
        }

        debug!(
            app_id = %app_id,
            eligible_secrets = secrets.len(),
            augmentations = ?augmentations,
            "resolved outbound authentication"
        );

        Ok(augmentations)
    }

    async fn apply_secret(
        &self,
        secret: &ServiceSecret,
        augmentations: &mut AugmentationSet,
    ) -> AppResult<()> {
        match secret.authentication_method {
            AuthenticationMethod::HttpBasic => {
                if augmentations.has_authorization() {
                    return Ok(());
                }

                let password = self.decrypt_secret(secret)?;
                let credentials = STANDARD.encode(format!("{}:{password}", secret.identifier));
                augmentations.claim_authorization(format!("Basic {credentials}"));
            }
            AuthenticationMethod::ClientCertificate => {
                if augmentations.has_client_identity() {
                    return Ok(());
                }

                augmentations.claim_client_identity(ClientIdentity {
                    certificate_pem: secret.identifier.clone(),
                    private_key_pem: self.decrypt_secret(secret)?,
                });
            }
            AuthenticationMethod::ClientCredentials => {
                if augmentations.has_authorization() {
                    return Ok(());
                }

                match self.token_cache.access_token(secret).await {
                    Ok(token) => {
                        augmentations.claim_authorization(format!("Bearer {token}"));
                    }
                    Err(error) => {
                        warn!(
                            error = %error,
                            secret_id = %secret.id,
                            service_name = %secret.service_name,
                            "client credentials token unavailable, skipping secret"
                        );
                    }
                }
            }
            AuthenticationMethod::Cookie => {
                let value = self.decrypt_secret(secret)?;
                augmentations.add_cookie(secret.identifier.clone(), value);
            }
            AuthenticationMethod::CustomHeader => {
                if secret.identifier.eq_ignore_ascii_case("authorization")
                    && augmentations.has_authorization()
                {
                    return Ok(());
                }

                let value = self.decrypt_secret(secret)?;
                augmentations.set_header(secret.identifier.clone(), value);
            }
            AuthenticationMethod::QueryParameter => {
                let value = self.decrypt_secret(secret)?;
                augmentations.add_query_parameter(secret.identifier.clone(), value);
            }
        }

        Ok(())
    }

    fn decrypt_secret(&self, secret: &ServiceSecret) -> AppResult<String> {
        decrypt_text(self.secret_encryptor.as_ref(), &secret.secret, secret)
    }
}

pub(crate) fn decrypt_text(
    encryptor: &dyn SecretEncryptor,
    ciphertext: &[u8],
    secret: &ServiceSecret,
) -> AppResult<String> {
    let plaintext = encryptor.decrypt(ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| {
        AppError::Internal(format!(
            "secret material of service secret '{}' is not valid UTF-8",
            secret.id
        ))
    })
}

#[cfg(test)]
mod tests;
