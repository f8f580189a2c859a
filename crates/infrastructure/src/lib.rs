//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_secret_encryptor;
mod console_mail_transport;
mod in_memory_action_store;
mod postgres_app_definition_repository;
mod postgres_asset_store;
mod postgres_email_quota_repository;
mod postgres_service_secret_repository;
mod reqwest_request_forwarder;
mod reqwest_token_endpoint_client;
mod smtp_mail_transport;

pub use aes_secret_encryptor::AesSecretEncryptor;
pub use console_mail_transport::ConsoleMailTransport;
pub use in_memory_action_store::InMemoryActionStore;
pub use postgres_app_definition_repository::PostgresAppDefinitionRepository;
pub use postgres_asset_store::PostgresAssetStore;
pub use postgres_email_quota_repository::PostgresEmailQuotaRepository;
pub use postgres_service_secret_repository::PostgresServiceSecretRepository;
pub use reqwest_request_forwarder::ReqwestRequestForwarder;
pub use reqwest_token_endpoint_client::ReqwestTokenEndpointClient;
pub use smtp_mail_transport::{SmtpMailConfig, SmtpMailTransport};
