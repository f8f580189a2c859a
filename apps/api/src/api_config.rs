use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use courier_core::{AppError, NonEmptyString};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Clone)]
pub enum StorageBackendConfig {
    Postgres { database_url: String },
    Memory { seed_file: Option<String> },
}

#[derive(Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage: StorageBackendConfig,
    pub api_host: String,
    pub api_port: u16,
    pub secret_encryption_key: String,
    pub email_provider: EmailProviderConfig,
    pub email_from_address: NonEmptyString,
    pub email_quota_enabled: bool,
    pub email_daily_quota: Option<u64>,
    pub action_proxy_timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_owned())
            .as_str()
        {
            "postgres" => StorageBackendConfig::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            "memory" => StorageBackendConfig::Memory {
                seed_file: optional_env("DEV_SEED_FILE"),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let secret_encryption_key = required_non_empty_env("SECRET_ENCRYPTION_KEY")?;

        let email_provider = match env::var("EMAIL_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        let email_from_address = NonEmptyString::new(
            env::var("EMAIL_FROM_ADDRESS").unwrap_or_else(|_| "noreply@courier.local".to_owned()),
        )?;
        let email_quota_enabled = env::var("EMAIL_QUOTA_ENABLED")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let email_daily_quota = optional_env("EMAIL_DAILY_QUOTA")
            .map(|value| {
                value.parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid EMAIL_DAILY_QUOTA: {error}"))
                })
            })
            .transpose()?;
        let action_proxy_timeout = optional_env("ACTION_PROXY_TIMEOUT_SECONDS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|error| {
                        AppError::Validation(format!(
                            "invalid ACTION_PROXY_TIMEOUT_SECONDS: {error}"
                        ))
                    })
            })
            .transpose()?;

        Ok(Self {
            migrate_only,
            storage,
            api_host,
            api_port,
            secret_encryption_key,
            email_provider,
            email_from_address,
            email_quota_enabled,
            email_daily_quota,
            action_proxy_timeout,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
