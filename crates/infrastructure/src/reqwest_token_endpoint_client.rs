//! OAuth2 client-credentials grants over `reqwest`.

use async_trait::async_trait;
use courier_application::{TokenEndpointClient, TokenGrant};
use courier_core::{AppError, AppResult};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// `reqwest`-based [`TokenEndpointClient`].
#[derive(Clone)]
pub struct ReqwestTokenEndpointClient {
    client: Client,
}

impl ReqwestTokenEndpointClient {
    /// Creates a token endpoint client on top of a shared HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Token endpoints disagree on whether `expires_in` is a number or a string.
fn lifetime_seconds(expires_in: Option<&Value>) -> Option<i64> {
    match expires_in? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|seconds| seconds as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl TokenEndpointClient for ReqwestTokenEndpointClient {
    async fn request_client_credentials(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<TokenGrant> {
        let response = self
            .client
            .post(token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|error| {
                AppError::TokenRefreshFailed(format!(
                    "token endpoint request failed: {}",
                    error.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenRefreshFailed(format!(
                "token endpoint returned status {status}"
            )));
        }

        let payload = response.json::<TokenResponse>().await.map_err(|error| {
            AppError::TokenRefreshFailed(format!(
                "token endpoint returned an unreadable body: {}",
                error.without_url()
            ))
        })?;

        if payload.access_token.trim().is_empty() {
            return Err(AppError::TokenRefreshFailed(
                "token endpoint returned an empty access token".to_owned(),
            ));
        }

        Ok(TokenGrant {
            expires_in: lifetime_seconds(payload.expires_in.as_ref()),
            access_token: payload.access_token,
        })
    }
}
