use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::{AppId, AppResult};

/// Repository port for the append-only email send log.
#[async_trait]
pub trait EmailQuotaRepository: Send + Sync {
    /// Counts sends of an application at or after `since`.
    async fn count_sends_since(&self, app_id: AppId, since: DateTime<Utc>) -> AppResult<u64>;

    /// Appends one send entry.
    async fn record_send(&self, app_id: AppId, sent_at: DateTime<Utc>) -> AppResult<()>;
}
