mod definitions;
mod mail;
mod outbound;
mod quota;
mod secrets;

pub use definitions::AppDefinitionRepository;
pub use mail::{AssetStore, MailAttachment, MailTransport, OutgoingEmail, StoredAsset};
pub use outbound::{OutboundRequest, RequestForwarder, UpstreamResponse};
pub use quota::EmailQuotaRepository;
pub use secrets::{SecretEncryptor, ServiceSecretRepository, TokenEndpointClient, TokenGrant};
