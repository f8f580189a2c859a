use async_trait::async_trait;
use courier_core::{AppId, AppResult};
use serde_json::Value;

/// Repository port for hosted application definitions.
#[async_trait]
pub trait AppDefinitionRepository: Send + Sync {
    /// Returns the parsed definition tree of an application, if it exists.
    async fn find_definition(&self, app_id: AppId) -> AppResult<Option<Value>>;
}
