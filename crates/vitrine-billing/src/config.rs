//! Billing configuration.

#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Package length when a record carries none (default: 30).
    pub default_package_days: u32,
    /// Grace period when a record carries none (default: 7).
    pub default_grace_period_days: u32,
    /// Trailing package days during which the renewal notification shows
    /// (default: 4).
    pub notification_window_days: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_package_days: 30,
            default_grace_period_days: 7,
            notification_window_days: 4,
        }
    }
}
