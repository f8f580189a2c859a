use std::str::FromStr;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use courier_application::{ActionOutcome, UpstreamResponse};
use courier_core::{AppError, AppId};
use courier_domain::HttpMethod;
use tracing::warn;

use crate::dto::ActionDataQuery;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn dispatch_action_handler(
    State(state): State<AppState>,
    method: Method,
    Path((app_id, action_path)): Path<(String, String)>,
    Query(query): Query<ActionDataQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let app_id = AppId::from_str(&app_id)?;
    let method = HttpMethod::from_str(method.as_str())?;

    let outcome = state
        .action_dispatch_service
        .dispatch_transport(app_id, &action_path, method, query.data.as_deref(), &body)
        .await?;

    match outcome {
        ActionOutcome::Relayed(upstream) => Ok(relay_response(upstream)?),
        ActionOutcome::EmailSent | ActionOutcome::EmailSkipped => {
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

fn relay_response(upstream: UpstreamResponse) -> Result<Response, AppError> {
    let status = StatusCode::from_u16(upstream.status).map_err(|error| {
        AppError::Internal(format!(
            "upstream returned unusable status {}: {error}",
            upstream.status
        ))
    })?;

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in upstream.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_bytes(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header = %name, "dropping unrepresentable upstream header"),
        }
    }

    Ok(response)
}
