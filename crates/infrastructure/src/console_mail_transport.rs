//! Console mail transport for development. Logs emails to tracing output.

use async_trait::async_trait;
use courier_application::{MailAttachment, MailTransport, OutgoingEmail};
use courier_core::AppResult;
use tracing::info;

/// Development mail transport that logs emails instead of sending them.
#[derive(Clone)]
pub struct ConsoleMailTransport;

impl ConsoleMailTransport {
    /// Creates a new console mail transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn attachment_name(attachment: &MailAttachment) -> &str {
    match attachment {
        MailAttachment::Remote { url, filename, .. } => filename.as_deref().unwrap_or(url),
        MailAttachment::Inline { filename, .. } => filename,
    }
}

#[async_trait]
impl MailTransport for ConsoleMailTransport {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let attachments = email
            .attachments
            .iter()
            .map(attachment_name)
            .collect::<Vec<_>>();

        info!(
            from = %email.from,
            to = ?email.to,
            cc = ?email.cc,
            bcc = ?email.bcc,
            subject = %email.subject,
            attachments = ?attachments,
            "--- EMAIL (console) ---\n{}\n--- END EMAIL ---",
            email.text
        );

        Ok(())
    }
}
