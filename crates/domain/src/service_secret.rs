use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use courier_core::{AppError, AppId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a service secret authenticates outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticationMethod {
    /// `Authorization: Basic` from identifier (username) and secret (password).
    HttpBasic,
    /// TLS client identity from identifier (certificate PEM) and secret
    /// (private key PEM).
    ClientCertificate,
    /// OAuth2 client-credentials bearer token.
    ClientCredentials,
    /// Cookie named by the identifier.
    Cookie,
    /// Header named by the identifier.
    CustomHeader,
    /// Query parameter named by the identifier.
    QueryParameter,
}

impl AuthenticationMethod {
    /// Returns a stable storage value for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpBasic => "http-basic",
            Self::ClientCertificate => "client-certificate",
            Self::ClientCredentials => "client-credentials",
            Self::Cookie => "cookie",
            Self::CustomHeader => "custom-header",
            Self::QueryParameter => "query-parameter",
        }
    }
}

impl FromStr for AuthenticationMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "http-basic" => Ok(Self::HttpBasic),
            "client-certificate" => Ok(Self::ClientCertificate),
            "client-credentials" => Ok(Self::ClientCredentials),
            "cookie" => Ok(Self::Cookie),
            "custom-header" => Ok(Self::CustomHeader),
            "query-parameter" => Ok(Self::QueryParameter),
            _ => Err(AppError::Validation(format!(
                "unknown authentication method '{value}'"
            ))),
        }
    }
}

/// One URL pattern of a service secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPattern<'a> {
    /// Selects URLs starting with the prefix.
    Include(&'a str),
    /// Excludes URLs starting with the prefix (written as `!prefix`).
    Exclude(&'a str),
}

impl<'a> UrlPattern<'a> {
    /// Parses a stored pattern string.
    #[must_use]
    pub fn parse(pattern: &'a str) -> Self {
        match pattern.strip_prefix('!') {
            Some(prefix) => Self::Exclude(prefix),
            None => Self::Include(pattern),
        }
    }
}

/// Returns whether a set of patterns selects the candidate URL: at least one
/// inclusion prefix matches and no exclusion prefix does.
#[must_use]
pub fn patterns_select_url<S: AsRef<str>>(patterns: &[S], url: &str) -> bool {
    let mut included = false;
    for pattern in patterns {
        match UrlPattern::parse(pattern.as_ref()) {
            UrlPattern::Exclude(prefix) if url.starts_with(prefix) => return false,
            UrlPattern::Exclude(_) => {}
            UrlPattern::Include(prefix) => included |= url.starts_with(prefix),
        }
    }

    included
}

/// Per-application credential plus the URLs it applies to.
///
/// `secret` and `access_token` hold ciphertext produced by the secret
/// encryptor and are never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceSecret {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning application.
    pub app_id: AppId,
    /// Display name shown to application owners.
    pub service_name: String,
    /// Prefix patterns, `!` marks an exclusion.
    pub url_patterns: Vec<String>,
    /// Authentication strategy.
    pub authentication_method: AuthenticationMethod,
    /// Plaintext identifier whose role depends on the method.
    pub identifier: String,
    /// Encrypted secret whose role depends on the method.
    pub secret: Vec<u8>,
    /// Token endpoint for client-credentials secrets.
    pub token_url: Option<String>,
    /// Encrypted cached bearer token for client-credentials secrets.
    pub access_token: Option<Vec<u8>>,
    /// Expiry of the cached bearer token.
    pub expires_at: Option<DateTime<Utc>>,
    /// Registration time; secrets are applied in ascending order of it.
    pub created_at: DateTime<Utc>,
}

impl ServiceSecret {
    /// Returns whether this secret applies to the candidate URL.
    #[must_use]
    pub fn is_eligible_for(&self, url: &str) -> bool {
        patterns_select_url(&self.url_patterns, url)
    }

    /// Returns the cached token ciphertext when it is still valid at `now`.
    #[must_use]
    pub fn fresh_access_token(&self, now: DateTime<Utc>) -> Option<&[u8]> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if expires_at > now => Some(token.as_slice()),
            _ => None,
        }
    }
}

impl Debug for ServiceSecret {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ServiceSecret")
            .field("id", &self.id)
            .field("app_id", &self.app_id)
            .field("service_name", &self.service_name)
            .field("url_patterns", &self.url_patterns)
            .field("authentication_method", &self.authentication_method)
            .field("token_url", &self.token_url)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
