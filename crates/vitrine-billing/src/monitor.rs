//! Visible subscription prompts for the active tenant.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::debug;
use vitrine_core::clock::{SharedClock, SystemClock};
use vitrine_core::models::subscription::SubscriptionRecord;
use vitrine_core::models::tenant::TenantScope;
use vitrine_core::storage::SharedStore;

use crate::config::BillingConfig;
use crate::dismissal::{DailyDismissal, PopupDismissal};
use crate::status::{SubscriptionStatus, calculate_with};

/// What the UI should show right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub status: SubscriptionStatus,
    pub show_notification: bool,
    pub show_renewal_popup: bool,
    pub can_dismiss_popup: bool,
}

/// Combines [`calculate_with`] with the daily and session dismissals.
pub struct SubscriptionMonitor {
    config: BillingConfig,
    clock: SharedClock,
    offset: FixedOffset,
    daily: DailyDismissal,
    popup: PopupDismissal,
}

impl SubscriptionMonitor {
    /// `store` persists across sessions; `session_store` only within one.
    pub fn new(store: SharedStore, session_store: SharedStore) -> Self {
        Self {
            config: BillingConfig::default(),
            clock: Arc::new(SystemClock),
            offset: Utc.fix(),
            daily: DailyDismissal::new(store),
            popup: PopupDismissal::new(session_store),
        }
    }

    pub fn with_config(mut self, config: BillingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Local time zone used for calendar-day boundaries.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }

    pub fn status(&self, record: Option<&SubscriptionRecord>) -> SubscriptionStatus {
        calculate_with(record, &self.now(), &self.config)
    }

    pub fn evaluate(&self, tenant: &TenantScope, record: Option<&SubscriptionRecord>) -> SubscriptionView {
        let now = self.now();
        let status = calculate_with(record, &now, &self.config);

        let show_notification =
            status.should_show_notification && !self.daily.is_dismissed_today(tenant, &now);
        // A session dismissal only counts while the popup is still dismissible.
        let popup_dismissed = status.can_dismiss_popup && self.popup.is_dismissed(tenant);
        let show_renewal_popup = status.should_show_renewal_popup && !popup_dismissed;

        debug!(
            tenant_id = %tenant,
            days_remaining = status.days_remaining,
            days_overdue = status.days_overdue,
            blocked = status.is_blocked,
            show_notification,
            show_renewal_popup,
            "Evaluated subscription"
        );

        SubscriptionView {
            can_dismiss_popup: status.can_dismiss_popup,
            status,
            show_notification,
            show_renewal_popup,
        }
    }

    pub fn dismiss_notification(&self, tenant: &TenantScope) {
        self.daily.dismiss(tenant, &self.now());
    }

    /// Dismiss the renewal popup for this session. Refused once the grace
    /// period is over.
    pub fn dismiss_popup(&self, tenant: &TenantScope, record: Option<&SubscriptionRecord>) -> bool {
        if !self.status(record).can_dismiss_popup {
            debug!(tenant_id = %tenant, "Renewal popup is not dismissible");
            return false;
        }
        self.popup.dismiss(tenant);
        true
    }
}
