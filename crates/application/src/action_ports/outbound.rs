use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use courier_core::AppResult;
use courier_domain::{ClientIdentity, HttpMethod};

/// Fully composed outbound call: action headers and authentication
/// augmentations are already merged.
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL including the final query string.
    pub url: String,
    /// Header pairs in application order.
    pub headers: Vec<(String, String)>,
    /// Serialized request body.
    pub body: Option<Vec<u8>>,
    /// TLS client identity to present.
    pub client_identity: Option<ClientIdentity>,
}

impl OutboundRequest {
    /// Returns the first header value with the given name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl Debug for OutboundRequest {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let header_names = self
            .headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();

        formatter
            .debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("client_identity", &self.client_identity.is_some())
            .finish_non_exhaustive()
    }
}

/// Upstream response relayed to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// Status code.
    pub status: u16,
    /// Header pairs with raw values.
    pub headers: Vec<(String, Vec<u8>)>,
    /// Body bytes exactly as received.
    pub body: Vec<u8>,
}

/// Port for issuing outbound HTTP calls.
#[async_trait]
pub trait RequestForwarder: Send + Sync {
    /// Issues the call. Transport failures map to
    /// `AppError::UpstreamUnreachable`; upstream error statuses are returned
    /// as regular responses.
    async fn forward(&self, request: OutboundRequest) -> AppResult<UpstreamResponse>;
}
