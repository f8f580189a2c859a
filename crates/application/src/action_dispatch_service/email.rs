use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use courier_domain::{EmailActionDefinition, HttpMethod, resolve_template};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::*;
use crate::action_ports::{MailAttachment, OutgoingEmail};

impl ActionDispatchService {
    pub(super) async fn dispatch_email(
        &self,
        app_id: AppId,
        path: &ActionPath,
        action: &EmailActionDefinition,
        inbound: &InboundCall,
    ) -> AppResult<ActionOutcome> {
        ensure_email_method(inbound.method)?;

        let data = &inbound.data;
        let to = recipients(&resolve_template(&action.to, data));
        let cc = recipients(&resolve_template(&action.cc, data));
        let bcc = recipients(&resolve_template(&action.bcc, data));
        if to.is_empty() && cc.is_empty() && bcc.is_empty() {
            info!(
                app_id = %app_id,
                action_path = %path.as_str(),
                "email action has no recipients, skipping"
            );
            return Ok(ActionOutcome::EmailSkipped);
        }

        let subject = required_text(&resolve_template(&action.subject, data), "subject")?;
        let text = required_text(&resolve_template(&action.body, data), "body")?;
        let attachments = self
            .resolve_attachments(app_id, &resolve_template(&action.attachments, data))
            .await?;

        self.email_quota.ensure_capacity(app_id).await?;

        let recipient_count = to.len() + cc.len() + bcc.len();
        let attachment_count = attachments.len();
        self.mail_transport
            .send(OutgoingEmail {
                to,
                cc,
                bcc,
                from: self.sender_address.clone(),
                subject,
                html: html_body(text.as_str()),
                text,
                attachments,
            })
            .await?;

        // The mail is already out; a failed log write must not invite a resend.
        if let Err(error) = self.email_quota.record_send(app_id).await {
            warn!(
                app_id = %app_id,
                action_path = %path.as_str(),
                error = %error,
                "failed to record email send in the quota log"
            );
        }
        info!(
            app_id = %app_id,
            action_path = %path.as_str(),
            recipients = recipient_count,
            attachments = attachment_count,
            "sent email action"
        );

        Ok(ActionOutcome::EmailSent)
    }

    async fn resolve_attachments(
        &self,
        app_id: AppId,
        attachments: &Value,
    ) -> AppResult<Vec<MailAttachment>> {
        let entries = match attachments {
            Value::Null => return Ok(Vec::new()),
            Value::Array(entries) => entries.iter().collect::<Vec<_>>(),
            single => vec![single],
        };

        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::String(url) if is_remote(url) => resolved.push(MailAttachment::Remote {
                    url: url.clone(),
                    filename: None,
                    http_headers: Vec::new(),
                }),
                Value::Object(descriptor) if descriptor.contains_key("target") => {
                    if let Some(attachment) = self.target_attachment(app_id, descriptor).await? {
                        resolved.push(attachment);
                    }
                }
                Value::Object(descriptor) if descriptor.contains_key("content") => {
                    match inline_attachment(descriptor) {
                        Some(attachment) => resolved.push(attachment),
                        None => warn!(app_id = %app_id, "dropping malformed inline attachment"),
                    }
                }
                _ => warn!(app_id = %app_id, "dropping unrecognized attachment entry"),
            }
        }

        Ok(resolved)
    }

    async fn target_attachment(
        &self,
        app_id: AppId,
        descriptor: &Map<String, Value>,
    ) -> AppResult<Option<MailAttachment>> {
        let Some(target) = descriptor.get("target").and_then(Value::as_str) else {
            warn!(app_id = %app_id, "dropping attachment with non-text target");
            return Ok(None);
        };
        let filename = text_field(descriptor, "filename");

        if is_remote(target) {
            let http_headers = text_field(descriptor, "accept")
                .map(|accept| vec![("Accept".to_owned(), accept)])
                .unwrap_or_default();

            return Ok(Some(MailAttachment::Remote {
                url: target.to_owned(),
                filename,
                http_headers,
            }));
        }

        let Some(asset) = self.asset_store.get_asset(app_id, target).await? else {
            info!(app_id = %app_id, asset_id = %target, "attachment asset not found, omitting");
            return Ok(None);
        };

        Ok(Some(MailAttachment::Inline {
            content: asset.data,
            filename: filename
                .or(asset.filename)
                .unwrap_or_else(|| target.to_owned()),
            content_type: asset.mime,
        }))
    }
}

/// Recipients from a resolved template: one address, a list of addresses,
/// or nothing. Blank entries are ignored.
pub(super) fn ensure_email_method(method: HttpMethod) -> AppResult<()> {
    if method != HttpMethod::Post {
        return Err(AppError::MethodNotAllowed(format!(
            "email actions only accept POST, got {method}"
        )));
    }

    Ok(())
}

fn recipients(value: &Value) -> Vec<String> {
    let addresses = match value {
        Value::String(address) => vec![address.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    addresses
        .into_iter()
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

fn required_text(value: &Value, field: &str) -> AppResult<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(AppError::InvalidEmailContent(format!(
            "email {field} must resolve to non-empty text"
        ))),
    }
}

fn is_remote(target: &str) -> bool {
    let lowered = target.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn text_field(descriptor: &Map<String, Value>, key: &str) -> Option<String> {
    descriptor
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Inline `{content, filename, contentType?, encoding?}` attachment. Content
/// is text unless `encoding` is `base64`.
fn inline_attachment(descriptor: &Map<String, Value>) -> Option<MailAttachment> {
    let content = descriptor.get("content").and_then(Value::as_str)?;
    let filename = text_field(descriptor, "filename")?;
    let content = match text_field(descriptor, "encoding").as_deref() {
        Some("base64") => STANDARD.decode(content).ok()?,
        _ => content.as_bytes().to_vec(),
    };

    Some(MailAttachment::Inline {
        content,
        filename,
        content_type: text_field(descriptor, "contentType"),
    })
}

/// HTML rendition of a plain-text body: escaped, with line breaks kept.
fn html_body(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + 16);
    for character in text.replace("\r\n", "\n").chars() {
        match character {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\n' => html.push_str("<br>"),
            other => html.push(other),
        }
    }
    html
}
