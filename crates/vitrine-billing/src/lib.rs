//! Vitrine Billing — subscription status derived from a tenant's package
//! record and the current date.
//!
//! [`calculate`] is pure. [`SubscriptionMonitor`] layers the two dismissal
//! trackers on top of it: a daily one for the pre-expiry notification and a
//! session one for the renewal popup.

pub mod config;
pub mod dismissal;
pub mod message;
pub mod monitor;
pub mod status;

pub use config::BillingConfig;
pub use dismissal::{DailyDismissal, PopupDismissal};
pub use message::{NotificationSeverity, expiry_message, format_days_remaining, notification_severity};
pub use monitor::{SubscriptionMonitor, SubscriptionView};
pub use status::{SubscriptionStatus, calculate, calculate_with};
