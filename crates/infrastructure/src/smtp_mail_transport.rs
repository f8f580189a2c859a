//! SMTP mail transport using the `lettre` crate.

use async_trait::async_trait;
use courier_application::{MailAttachment, MailTransport, OutgoingEmail};
use courier_core::{AppError, AppResult};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reqwest::header::CONTENT_TYPE;
use url::Url;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// SMTP transport configuration.
#[derive(Clone)]
pub struct SmtpMailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
}

/// Production mail transport relaying through an SMTP server.
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    http_client: reqwest::Client,
}

impl SmtpMailTransport {
    /// Creates an SMTP transport. `http_client` downloads remote attachments.
    pub fn new(config: SmtpMailConfig, http_client: reqwest::Client) -> AppResult<Self> {
        let credentials = Credentials::new(config.username, config.password);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            http_client,
        })
    }

    async fn attachment_part(&self, attachment: MailAttachment) -> AppResult<SinglePart> {
        match attachment {
            MailAttachment::Inline {
                content,
                filename,
                content_type,
            } => Ok(Attachment::new(filename)
                .body(content, content_type_or_default(content_type.as_deref()))),
            MailAttachment::Remote {
                url,
                filename,
                http_headers,
            } => {
                let (content, content_type) = self.download(url.as_str(), &http_headers).await?;
                let filename = filename.unwrap_or_else(|| filename_from_url(url.as_str()));
                Ok(Attachment::new(filename)
                    .body(content, content_type_or_default(content_type.as_deref())))
            }
        }
    }

    async fn download(
        &self,
        url: &str,
        http_headers: &[(String, String)],
    ) -> AppResult<(Vec<u8>, Option<String>)> {
        let mut request = self.http_client.get(url);
        for (name, value) in http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|error| {
            AppError::UpstreamUnreachable(format!(
                "failed to download attachment: {}",
                error.without_url()
            ))
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnreachable(format!(
                "attachment download returned status {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let content = response.bytes().await.map_err(|error| {
            AppError::UpstreamUnreachable(format!(
                "failed to read attachment: {}",
                error.without_url()
            ))
        })?;

        Ok((content.to_vec(), content_type))
    }

    async fn build_message(&self, email: OutgoingEmail) -> AppResult<Message> {
        let mut builder = Message::builder()
            .from(parse_mailbox(email.from.as_str())?)
            .subject(email.subject);
        for address in &email.to {
            builder = builder.to(parse_mailbox(address)?);
        }
        for address in &email.cc {
            builder = builder.cc(parse_mailbox(address)?);
        }
        for address in &email.bcc {
            builder = builder.bcc(parse_mailbox(address)?);
        }

        let body = MultiPart::alternative_plain_html(email.text, email.html);
        let message = if email.attachments.is_empty() {
            builder.multipart(body)
        } else {
            let mut mixed = MultiPart::mixed().multipart(body);
            for attachment in email.attachments {
                mixed = mixed.singlepart(self.attachment_part(attachment).await?);
            }
            builder.multipart(mixed)
        };

        message.map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
    }
}

fn parse_mailbox(address: &str) -> AppResult<Mailbox> {
    address.parse().map_err(|error| {
        AppError::InvalidEmailContent(format!("invalid email address '{address}': {error}"))
    })
}

fn content_type_or_default(content_type: Option<&str>) -> ContentType {
    content_type
        .and_then(|value| ContentType::parse(value).ok())
        .or_else(|| ContentType::parse(FALLBACK_CONTENT_TYPE).ok())
        .unwrap_or(ContentType::TEXT_PLAIN)
}

fn filename_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_owned))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| "attachment".to_owned())
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let message = self.build_message(email).await?;

        self.mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;

        Ok(())
    }
}
