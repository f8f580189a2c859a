use courier_core::{AppError, AppResult};
use courier_domain::HttpMethod;
use serde_json::Value;

/// One inbound invocation of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCall {
    /// Method the caller used.
    pub method: HttpMethod,
    /// Inbound data templates are resolved against.
    pub data: Value,
}

impl InboundCall {
    /// Creates an inbound call from already parsed data.
    #[must_use]
    pub fn new(method: HttpMethod, data: Value) -> Self {
        Self { method, data }
    }

    /// Parses inbound data from the transport. Methods that carry a body read
    /// JSON from it; the others read URL-decoded JSON from the `data` query
    /// parameter. Missing or blank input yields `null`.
    pub fn from_transport(
        method: HttpMethod,
        data_parameter: Option<&str>,
        body: &[u8],
    ) -> AppResult<Self> {
        let data = if method.carries_body() {
            parse_json(body, "request body")?
        } else {
            parse_json(data_parameter.unwrap_or_default().as_bytes(), "data parameter")?
        };

        Ok(Self::new(method, data))
    }
}

fn parse_json(raw: &[u8], source: &str) -> AppResult<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(raw)
        .map_err(|error| AppError::Validation(format!("{source} is not valid JSON: {error}")))
}
