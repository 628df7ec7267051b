//! User-facing wording for a [`SubscriptionStatus`].

use std::fmt;

use serde::Serialize;

use crate::status::SubscriptionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

pub fn format_days_remaining(days: i64) -> String {
    match days {
        0 => "Today".to_string(),
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

/// Banner text, or an empty string when nothing needs saying.
pub fn expiry_message(status: &SubscriptionStatus) -> String {
    if status.is_blocked {
        return "Your subscription has expired. Please renew to continue using the platform.".into();
    }
    if status.is_in_grace_period {
        let overdue = status.days_overdue;
        let left = i64::from(status.grace_period_days) - overdue;
        return format!(
            "Your subscription expired {overdue} day{} ago. You have {left} day{} left to renew before your account is blocked.",
            plural(overdue),
            plural(left),
        );
    }
    if status.is_expired {
        return "Your subscription has expired. Please renew to continue.".into();
    }
    if status.in_notification_window {
        return format!(
            "Your subscription expires in {}. Renew now to avoid service interruption.",
            format_days_remaining(status.days_remaining)
        );
    }
    String::new()
}

pub fn notification_severity(status: &SubscriptionStatus) -> NotificationSeverity {
    if status.is_blocked || status.is_expired || status.days_remaining <= 2 {
        NotificationSeverity::Error
    } else if status.days_remaining <= 4 {
        NotificationSeverity::Warning
    } else {
        NotificationSeverity::Info
    }
}
