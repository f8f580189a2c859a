use std::sync::Arc;

use courier_application::MailTransport;
use courier_core::AppError;
use courier_infrastructure::{ConsoleMailTransport, SmtpMailConfig, SmtpMailTransport};

use crate::api_config::{ApiConfig, EmailProviderConfig};

pub(super) fn build_mail_transport(
    config: &ApiConfig,
    http_client: reqwest::Client,
) -> Result<Arc<dyn MailTransport>, AppError> {
    let transport: Arc<dyn MailTransport> = match &config.email_provider {
        EmailProviderConfig::Console => Arc::new(ConsoleMailTransport::new()),
        EmailProviderConfig::Smtp(smtp) => {
            let smtp_config = SmtpMailConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
            };
            Arc::new(SmtpMailTransport::new(smtp_config, http_client)?)
        }
    };

    Ok(transport)
}
