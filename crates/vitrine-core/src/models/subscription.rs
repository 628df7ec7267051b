//! Persisted subscription record of a tenant.
//!
//! Status (expired, grace, blocked) is never stored; it is derived from
//! this record and the current instant by the billing crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionRecord {
    /// `None` means no package has been started yet.
    pub package_start_date: Option<DateTime<Utc>>,
    /// Package length in days. Zero means "use the default".
    pub package_days: u32,
    /// Days of continued service after expiry. Zero means "use the default".
    pub grace_period_days: u32,
    /// Administrative block, independent of dates.
    pub is_blocked: bool,
    pub last_notification_shown: Option<DateTime<Utc>>,
    pub renewal_dismissed_at: Option<DateTime<Utc>>,
    pub last_renewal_date: Option<DateTime<Utc>>,
}
