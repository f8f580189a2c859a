use courier_domain::{RequestActionDefinition, resolve_template, value_to_text};
use serde_json::Value;
use tracing::info;
use url::Url;

use super::*;
use crate::action_ports::OutboundRequest;

const AUTHORIZATION: &str = "Authorization";
const COOKIE: &str = "Cookie";
const CONTENT_TYPE: &str = "Content-Type";

impl ActionDispatchService {
    pub(super) async fn dispatch_request(
        &self,
        app_id: AppId,
        path: &ActionPath,
        action: &RequestActionDefinition,
        inbound: &InboundCall,
    ) -> AppResult<UpstreamResponse> {
        if inbound.method != action.method {
            return Err(AppError::InvalidAction(
                "method does not match the request action method".to_owned(),
            ));
        }

        let data = &inbound.data;
        let target = value_to_text(&resolve_template(&action.url, data));
        let mut url = parse_target(target.as_str())?;
        let augmentations = self
            .authentication
            .augmentations_for(app_id, target.as_str())
            .await?;

        let query_pairs = resolve_pairs(&action.query, data)
            .into_iter()
            .chain(augmentations.query_parameters().iter().cloned())
            .collect::<Vec<_>>();
        if !query_pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(query_pairs);
        }

        let mut headers = Vec::new();
        for (name, value) in resolve_pairs(&action.headers, data) {
            overlay_header(&mut headers, name, value);
        }
        for (name, value) in augmentations.headers() {
            overlay_header(&mut headers, name.clone(), value.clone());
        }
        if let Some(authorization) = augmentations.authorization() {
            overlay_header(&mut headers, AUTHORIZATION.to_owned(), authorization.to_owned());
        }
        if let Some(cookies) = augmentations.cookie_header() {
            overlay_header(&mut headers, COOKIE.to_owned(), cookies);
        }

        let body = outbound_body(action, inbound)?;
        if body.is_some()
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
        {
            headers.push((CONTENT_TYPE.to_owned(), "application/json".to_owned()));
        }

        let request = OutboundRequest {
            method: action.method,
            url: url.into(),
            headers,
            body,
            client_identity: augmentations.client_identity().cloned(),
        };

        let response = self.forwarder.forward(request).await?;
        info!(
            app_id = %app_id,
            action_path = %path.as_str(),
            status = response.status,
            body_bytes = response.body.len(),
            "relayed request action response"
        );

        Ok(response)
    }
}

fn parse_target(target: &str) -> AppResult<Url> {
    let url = Url::parse(target).map_err(|error| {
        AppError::InvalidAction(format!("request action url '{target}' is invalid: {error}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidAction(format!(
            "request action url '{target}' must use http or https"
        )));
    }

    Ok(url)
}

/// Resolves a template map into name/value pairs, dropping entries that
/// resolve to `null`.
fn resolve_pairs(templates: &serde_json::Map<String, Value>, data: &Value) -> Vec<(String, String)> {
    templates
        .iter()
        .filter_map(|(name, template)| match resolve_template(template, data) {
            Value::Null => None,
            resolved => Some((name.clone(), value_to_text(&resolved))),
        })
        .collect()
}

fn overlay_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name.as_str()));
    headers.push((name, value));
}

fn outbound_body(
    action: &RequestActionDefinition,
    inbound: &InboundCall,
) -> AppResult<Option<Vec<u8>>> {
    if !action.method.carries_body() {
        return Ok(None);
    }

    let payload = match &action.body {
        Some(template) => resolve_template(template, &inbound.data),
        None => inbound.data.clone(),
    };
    if payload.is_null() {
        return Ok(None);
    }

    serde_json::to_vec(&payload)
        .map(Some)
        .map_err(|error| AppError::Internal(format!("failed to serialize request body: {error}")))
}
