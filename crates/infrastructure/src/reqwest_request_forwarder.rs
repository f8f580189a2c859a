//! Outbound request forwarding over `reqwest`.
//!
//! Responses are relayed exactly as received: the client never negotiates or
//! decodes content encodings, so compressed bodies keep their
//! `Content-Encoding` and `Content-Length`.

use std::time::Duration;

use async_trait::async_trait;
use courier_application::{OutboundRequest, RequestForwarder, UpstreamResponse};
use courier_core::{AppError, AppResult};
use courier_domain::ClientIdentity;
use reqwest::{Client, Identity, Method};
use tracing::debug;
use url::Url;

/// Connection-level headers that describe the upstream hop, not the payload.
const HOP_BY_HOP_HEADERS: [&str; 7] = [
    "connection",
    "transfer-encoding",
    "keep-alive",
    "proxy-connection",
    "upgrade",
    "trailer",
    "te",
];

/// `reqwest`-based [`RequestForwarder`].
#[derive(Clone)]
pub struct ReqwestRequestForwarder {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestRequestForwarder {
    /// Creates a forwarder. `timeout` bounds each outbound call when set.
    pub fn new(timeout: Option<Duration>) -> AppResult<Self> {
        Ok(Self {
            client: build_client(None)?,
            timeout,
        })
    }

    fn client_for(&self, identity: Option<&ClientIdentity>) -> AppResult<Client> {
        match identity {
            Some(identity) => build_client(Some(identity)),
            None => Ok(self.client.clone()),
        }
    }
}

fn build_client(identity: Option<&ClientIdentity>) -> AppResult<Client> {
    let mut builder = Client::builder()
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .no_zstd();

    if let Some(identity) = identity {
        let pem = format!(
            "{}\n{}",
            identity.private_key_pem.trim_end(),
            identity.certificate_pem.trim_end()
        );
        let identity = Identity::from_pem(pem.as_bytes()).map_err(|error| {
            AppError::Internal(format!("invalid client certificate identity: {error}"))
        })?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}

fn target_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_else(|| "<invalid url>".to_owned())
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop_by_hop| name.eq_ignore_ascii_case(hop_by_hop))
}

#[async_trait]
impl RequestForwarder for ReqwestRequestForwarder {
    async fn forward(&self, request: OutboundRequest) -> AppResult<UpstreamResponse> {
        let client = self.client_for(request.client_identity.as_ref())?;
        let host = target_host(request.url.as_str());
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|error| {
            AppError::InvalidAction(format!("unsupported outbound method: {error}"))
        })?;

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        // Error texts drop the URL: query strings may carry secret material.
        let response = builder.send().await.map_err(|error| {
            if error.is_builder() {
                AppError::InvalidAction(format!(
                    "outbound request to '{host}' is malformed: {}",
                    error.without_url()
                ))
            } else {
                AppError::UpstreamUnreachable(format!(
                    "request to '{host}' failed: {}",
                    error.without_url()
                ))
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
            .collect::<Vec<_>>();
        let body = response.bytes().await.map_err(|error| {
            AppError::UpstreamUnreachable(format!(
                "reading response from '{host}' failed: {}",
                error.without_url()
            ))
        })?;

        debug!(host = %host, status, body_bytes = body.len(), "upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests;
