use courier_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::HttpMethod;

/// Kind of a dispatchable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Outbound HTTP request proxied on behalf of the end user.
    Request,
    /// Transactional email.
    Email,
}

impl ActionKind {
    /// Returns the stable `type` value used in application definitions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Email => "email",
        }
    }

    fn from_type(value: &str) -> Option<Self> {
        match value {
            "request" => Some(Self::Request),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

/// Request action as declared in an application definition. Every value
/// except `method` is a template resolved against inbound data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestActionDefinition {
    /// Declared method. Inbound calls must use the same one.
    #[serde(default)]
    pub method: HttpMethod,
    /// Absolute target URL template.
    pub url: Value,
    /// Static header templates applied before authentication headers.
    #[serde(default)]
    pub headers: Map<String, Value>,
    /// Query parameter templates appended to the URL.
    #[serde(default)]
    pub query: Map<String, Value>,
    /// Body template. Inbound data is forwarded when absent.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Email action as declared in an application definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailActionDefinition {
    /// Primary recipients template.
    #[serde(default)]
    pub to: Value,
    /// Carbon-copy recipients template.
    #[serde(default)]
    pub cc: Value,
    /// Blind carbon-copy recipients template.
    #[serde(default)]
    pub bcc: Value,
    /// Subject template.
    #[serde(default)]
    pub subject: Value,
    /// Body template.
    #[serde(default)]
    pub body: Value,
    /// Attachment list template.
    #[serde(default)]
    pub attachments: Value,
}

/// Dispatchable action located in an application definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDefinition {
    /// `type: request`.
    Request(RequestActionDefinition),
    /// `type: email`.
    Email(EmailActionDefinition),
}

impl ActionDefinition {
    /// Interprets a definition node as an action. Anything that is not an
    /// object with a recognised `type` is an invalid action.
    pub fn from_node(node: &Value) -> AppResult<Self> {
        let type_value = node
            .as_object()
            .and_then(|object| object.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidAction("node is not an action".to_owned()))?;

        let kind = ActionKind::from_type(type_value).ok_or_else(|| {
            AppError::InvalidAction(format!("action type '{type_value}' cannot be dispatched"))
        })?;

        let invalid = |error: serde_json::Error| {
            AppError::InvalidAction(format!("malformed {} action: {error}", kind.as_str()))
        };

        match kind {
            ActionKind::Request => serde_json::from_value(node.clone())
                .map(Self::Request)
                .map_err(invalid),
            ActionKind::Email => serde_json::from_value(node.clone())
                .map(Self::Email)
                .map_err(invalid),
        }
    }

    /// Returns the action kind.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Request(_) => ActionKind::Request,
            Self::Email(_) => ActionKind::Email,
        }
    }
}
