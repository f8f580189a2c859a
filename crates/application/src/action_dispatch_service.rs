//! Dispatch of request and email actions declared in application definitions.

use std::sync::Arc;

use courier_core::{AppError, AppId, AppResult};
use courier_domain::{ActionDefinition, ActionKind, ActionPath, HttpMethod};
use tracing::info;

use crate::action_ports::{
    AppDefinitionRepository, AssetStore, MailTransport, RequestForwarder, UpstreamResponse,
};
use crate::{AuthenticationService, EmailQuotaService};

mod email;
mod inbound;
mod request;

pub use inbound::InboundCall;

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Upstream response to relay unchanged.
    Relayed(UpstreamResponse),
    /// Email accepted by the mail transport.
    EmailSent,
    /// Email action resolved to no recipients; nothing was sent.
    EmailSkipped,
}

/// Application service executing request and email actions.
#[derive(Clone)]
pub struct ActionDispatchService {
    definitions: Arc<dyn AppDefinitionRepository>,
    authentication: AuthenticationService,
    forwarder: Arc<dyn RequestForwarder>,
    mail_transport: Arc<dyn MailTransport>,
    asset_store: Arc<dyn AssetStore>,
    email_quota: EmailQuotaService,
    sender_address: String,
}

impl ActionDispatchService {
    /// Creates an action dispatch service.
    #[must_use]
    pub fn new(
        definitions: Arc<dyn AppDefinitionRepository>,
        authentication: AuthenticationService,
        forwarder: Arc<dyn RequestForwarder>,
        mail_transport: Arc<dyn MailTransport>,
        asset_store: Arc<dyn AssetStore>,
        email_quota: EmailQuotaService,
        sender_address: impl Into<String>,
    ) -> Self {
        Self {
            definitions,
            authentication,
            forwarder,
            mail_transport,
            asset_store,
            email_quota,
            sender_address: sender_address.into(),
        }
    }

    /// Resolves the action at `action_path` inside the application's
    /// definition and executes it for one inbound call.
    pub async fn dispatch(
        &self,
        app_id: AppId,
        action_path: &str,
        inbound: InboundCall,
    ) -> AppResult<ActionOutcome> {
        let (path, action) = self.resolve(app_id, action_path).await?;
        self.execute(app_id, &path, action, inbound).await
    }

    /// Same as [`Self::dispatch`] for a call still in transport form. The
    /// inbound data is parsed only once the action accepts the method, so an
    /// email action reached with GET is rejected before its `data` is read.
    pub async fn dispatch_transport(
        &self,
        app_id: AppId,
        action_path: &str,
        method: HttpMethod,
        data_parameter: Option<&str>,
        body: &[u8],
    ) -> AppResult<ActionOutcome> {
        let (path, action) = self.resolve(app_id, action_path).await?;
        if action.kind() == ActionKind::Email {
            email::ensure_email_method(method)?;
        }

        let inbound = InboundCall::from_transport(method, data_parameter, body)?;
        self.execute(app_id, &path, action, inbound).await
    }

    async fn resolve(
        &self,
        app_id: AppId,
        action_path: &str,
    ) -> AppResult<(ActionPath, ActionDefinition)> {
        let path = ActionPath::parse(action_path)?;
        let definition = self
            .definitions
            .find_definition(app_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("app '{app_id}' does not exist")))?;
        let action = path.resolve_action(&definition)?;

        Ok((path, action))
    }

    async fn execute(
        &self,
        app_id: AppId,
        path: &ActionPath,
        action: ActionDefinition,
        inbound: InboundCall,
    ) -> AppResult<ActionOutcome> {
        info!(
            app_id = %app_id,
            action_path = %path.as_str(),
            action_kind = action.kind().as_str(),
            method = %inbound.method,
            "dispatching action"
        );

        match action {
            ActionDefinition::Request(request) => self
                .dispatch_request(app_id, path, &request, &inbound)
                .await
                .map(ActionOutcome::Relayed),
            ActionDefinition::Email(email) => {
                self.dispatch_email(app_id, path, &email, &inbound).await
            }
        }
    }
}
