use async_trait::async_trait;
use courier_core::{AppId, AppResult};

/// Attachment handed to the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailAttachment {
    /// Remote file the transport downloads at send time.
    Remote {
        /// Source URL.
        url: String,
        /// File name override.
        filename: Option<String>,
        /// Headers sent with the download request.
        http_headers: Vec<(String, String)>,
    },
    /// Attachment content already in memory.
    Inline {
        /// Raw bytes.
        content: Vec<u8>,
        /// File name shown to recipients.
        filename: String,
        /// MIME type, when known.
        content_type: Option<String>,
    },
}

/// Composed email message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<String>,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
    /// Attachments in declaration order.
    pub attachments: Vec<MailAttachment>,
}

/// Port for delivering composed emails.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends one email.
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Asset content stored for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Raw bytes.
    pub data: Vec<u8>,
    /// Original file name.
    pub filename: Option<String>,
    /// MIME type.
    pub mime: Option<String>,
}

/// Port for application asset storage.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns an asset by id, if it exists.
    async fn get_asset(&self, app_id: AppId, asset_id: &str) -> AppResult<Option<StoredAsset>>;
}
