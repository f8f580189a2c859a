use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health check response.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Query parameters accepted on action calls.
///
/// Methods without a body carry their JSON payload in `data`.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/action-data-query.ts"
)]
pub struct ActionDataQuery {
    #[serde(default)]
    pub data: Option<String>,
}
