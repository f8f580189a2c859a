use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Daily email send policy for applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailQuotaPolicy {
    /// Every send is allowed and nothing is logged.
    Unlimited,
    /// At most `limit` sends per application per UTC day.
    Daily {
        /// Sends allowed between two UTC midnights.
        limit: u64,
    },
}

impl EmailQuotaPolicy {
    /// Builds the policy from the feature flag and the configured limit.
    /// Both must be present for the quota to be enforced.
    #[must_use]
    pub fn from_settings(enabled: bool, daily_limit: Option<u64>) -> Self {
        match (enabled, daily_limit) {
            (true, Some(limit)) => Self::Daily { limit },
            _ => Self::Unlimited,
        }
    }

    /// Whether sends are counted at all.
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        matches!(self, Self::Daily { .. })
    }

    /// Whether another send is allowed after `used` sends today.
    #[must_use]
    pub fn allows(&self, used: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Daily { limit } => used < *limit,
        }
    }
}

/// Returns the most recent UTC midnight at or before `now`.
#[must_use]
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Returns the UTC midnight at which the quota window after `now` resets.
#[must_use]
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_utc_day(now) + Duration::days(1)
}
