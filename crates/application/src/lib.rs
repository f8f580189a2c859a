//! Application services and ports.

#![forbid(unsafe_code)]

mod action_dispatch_service;
mod action_ports;
mod authentication_service;
mod email_quota_service;

#[cfg(test)]
mod test_fakes;

pub use action_dispatch_service::{ActionDispatchService, ActionOutcome, InboundCall};
pub use action_ports::{
    AppDefinitionRepository, AssetStore, EmailQuotaRepository, MailAttachment, MailTransport,
    OutboundRequest, OutgoingEmail, RequestForwarder, SecretEncryptor, ServiceSecretRepository,
    StoredAsset, TokenEndpointClient, TokenGrant, UpstreamResponse,
};
pub use authentication_service::AuthenticationService;
pub use email_quota_service::EmailQuotaService;
