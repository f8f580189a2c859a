//! Daily email quota per application.
//!
//! The window is the current UTC day: sends logged at or after the most
//! recent UTC midnight count against the limit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_core::{AppError, AppId, AppResult};
use courier_domain::{EmailQuotaPolicy, next_utc_midnight, start_of_utc_day};

use crate::action_ports::EmailQuotaRepository;

/// Application service enforcing the daily email quota.
#[derive(Clone)]
pub struct EmailQuotaService {
    repository: Arc<dyn EmailQuotaRepository>,
    policy: EmailQuotaPolicy,
}

impl EmailQuotaService {
    /// Creates a new quota service.
    #[must_use]
    pub fn new(repository: Arc<dyn EmailQuotaRepository>, policy: EmailQuotaPolicy) -> Self {
        Self { repository, policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> EmailQuotaPolicy {
        self.policy
    }

    /// Fails with `AppError::QuotaExceeded` when the application has no sends
    /// left today. Never writes to the log.
    pub async fn ensure_capacity(&self, app_id: AppId) -> AppResult<()> {
        self.ensure_capacity_at(app_id, Utc::now()).await
    }

    /// Same as [`Self::ensure_capacity`] evaluated at `now`.
    pub async fn ensure_capacity_at(&self, app_id: AppId, now: DateTime<Utc>) -> AppResult<()> {
        let EmailQuotaPolicy::Daily { limit } = self.policy else {
            return Ok(());
        };

        let used = self
            .repository
            .count_sends_since(app_id, start_of_utc_day(now))
            .await?;

        if !self.policy.allows(used) {
            return Err(AppError::QuotaExceeded(format!(
                "daily email quota of {limit} reached, resets at {}",
                next_utc_midnight(now).to_rfc3339()
            )));
        }

        Ok(())
    }

    /// Logs one successful send. Does nothing when the quota is not enforced.
    pub async fn record_send(&self, app_id: AppId) -> AppResult<()> {
        self.record_send_at(app_id, Utc::now()).await
    }

    /// Same as [`Self::record_send`] with an explicit timestamp.
    pub async fn record_send_at(&self, app_id: AppId, sent_at: DateTime<Utc>) -> AppResult<()> {
        if !self.policy.is_enforced() {
            return Ok(());
        }

        self.repository.record_send(app_id, sent_at).await
    }
}
