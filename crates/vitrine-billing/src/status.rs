//! Subscription status calculation.
//!
//! All date arithmetic happens on calendar days in the time zone of `now`, so
//! the hour of day never moves a boundary.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use vitrine_core::models::subscription::SubscriptionRecord;

use crate::config::BillingConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    /// Days until the package ends, never negative.
    pub days_remaining: i64,
    pub days_overdue: i64,
    pub is_expired: bool,
    pub is_in_grace_period: bool,
    pub is_blocked: bool,
    /// Inside the pre-expiry notification window, before any dismissal.
    pub in_notification_window: bool,
    pub should_show_notification: bool,
    pub should_show_renewal_popup: bool,
    pub can_dismiss_popup: bool,
    pub package_end_date: NaiveDate,
    pub grace_end_date: NaiveDate,
    pub grace_period_days: u32,
}

/// [`calculate_with`] using [`BillingConfig::default`].
pub fn calculate<Tz: TimeZone>(record: Option<&SubscriptionRecord>, now: &DateTime<Tz>) -> SubscriptionStatus {
    calculate_with(record, now, &BillingConfig::default())
}

/// Derive the status of `record` on the calendar day of `now`.
pub fn calculate_with<Tz: TimeZone>(
    record: Option<&SubscriptionRecord>,
    now: &DateTime<Tz>,
    config: &BillingConfig,
) -> SubscriptionStatus {
    let today = now.date_naive();
    let Some((record, start)) = record.and_then(|r| r.package_start_date.map(|s| (r, s))) else {
        return unstarted(today, config);
    };

    let package_days = non_zero_or(record.package_days, config.default_package_days);
    let grace_period_days = non_zero_or(record.grace_period_days, config.default_grace_period_days);

    let start_day = start.with_timezone(&now.timezone()).date_naive();
    let package_end_date = add_days(start_day, package_days);
    let grace_end_date = add_days(package_end_date, grace_period_days);

    let days_remaining = (package_end_date - today).num_days();
    let days_overdue = (-days_remaining).max(0);
    let grace = i64::from(grace_period_days);

    let is_expired = days_remaining <= 0;
    let is_in_grace_period = is_expired && days_overdue <= grace;
    let is_blocked = record.is_blocked || days_overdue > grace;

    let in_notification_window =
        days_remaining > 0 && days_remaining <= i64::from(config.notification_window_days);
    let shown_today = record
        .last_notification_shown
        .is_some_and(|shown| same_local_day(&shown, now));

    SubscriptionStatus {
        days_remaining: days_remaining.max(0),
        days_overdue,
        is_expired,
        is_in_grace_period,
        is_blocked,
        in_notification_window,
        should_show_notification: in_notification_window && !shown_today,
        should_show_renewal_popup: is_expired,
        can_dismiss_popup: is_in_grace_period,
        package_end_date,
        grace_end_date,
        grace_period_days,
    }
}

/// No package started yet: a full default package ahead, nothing to show.
fn unstarted(today: NaiveDate, config: &BillingConfig) -> SubscriptionStatus {
    let package_end_date = add_days(today, config.default_package_days);
    SubscriptionStatus {
        days_remaining: i64::from(config.default_package_days),
        days_overdue: 0,
        is_expired: false,
        is_in_grace_period: false,
        is_blocked: false,
        in_notification_window: false,
        should_show_notification: false,
        should_show_renewal_popup: false,
        can_dismiss_popup: true,
        package_end_date,
        grace_end_date: add_days(package_end_date, config.default_grace_period_days),
        grace_period_days: config.default_grace_period_days,
    }
}

fn non_zero_or(value: u32, default: u32) -> u32 {
    if value == 0 { default } else { value }
}

fn add_days(day: NaiveDate, days: u32) -> NaiveDate {
    day.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Whether `instant` falls on the same calendar day as `now`, in `now`'s zone.
pub(crate) fn same_local_day<Tz: TimeZone>(instant: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    instant.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn record(start: &str, days: u32, grace: u32) -> SubscriptionRecord {
        SubscriptionRecord {
            package_start_date: Some(start.parse().unwrap()),
            package_days: days,
            grace_period_days: grace,
            ..Default::default()
        }
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn hour_of_day_does_not_matter() {
        let r = record("2026-01-01T23:59:00Z", 30, 7);
        let morning = calculate(Some(&r), &at("2026-01-30T00:01:00Z"));
        let night = calculate(Some(&r), &at("2026-01-30T23:59:00Z"));
        assert_eq!(morning.days_remaining, 1);
        assert_eq!(morning, night);
    }

    #[test]
    fn start_day_is_taken_in_local_zone() {
        // 23:30 UTC on Jan 1 is already Jan 2 in UTC+2.
        let r = record("2026-01-01T23:30:00Z", 30, 7);
        let status = calculate(Some(&r), &at("2026-01-31T12:00:00+02:00"));
        assert_eq!(status.package_end_date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(status.days_remaining, 1);
    }

    #[test]
    fn zero_lengths_use_defaults() {
        let r = record("2026-01-01T00:00:00Z", 0, 0);
        let status = calculate(Some(&r), &at("2026-01-01T10:00:00Z"));
        assert_eq!(status.days_remaining, 30);
        assert_eq!(status.grace_period_days, 7);
        assert_eq!(status.grace_end_date, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap());
    }

    #[test]
    fn missing_start_date_is_unstarted() {
        let r = SubscriptionRecord::default();
        let status = calculate(Some(&r), &at("2026-05-10T10:00:00Z"));
        assert_eq!(status, calculate(None, &at("2026-05-10T10:00:00Z")));
        assert_eq!(status.days_remaining, 30);
        assert!(status.can_dismiss_popup);
        assert!(!status.should_show_renewal_popup);
        assert!(!status.should_show_notification);
    }

    #[test]
    fn notification_window_is_last_four_days() {
        let r = record("2026-01-01T00:00:00Z", 30, 7);
        let shown: Vec<bool> = (25..=31)
            .map(|day| {
                let now = at(&format!("2026-01-{day:02}T09:00:00Z"));
                calculate(Some(&r), &now).should_show_notification
            })
            .collect();
        // Jan 27..=30 are 4..=1 days before the Jan 31 end.
        assert_eq!(shown, [false, false, true, true, true, true, false]);
    }

    #[test]
    fn record_dismissal_hides_notification_for_the_day() {
        let mut r = record("2026-01-01T00:00:00Z", 30, 7);
        r.last_notification_shown = Some("2026-01-28T08:00:00Z".parse().unwrap());
        let status = calculate(Some(&r), &at("2026-01-28T20:00:00Z"));
        assert!(status.in_notification_window);
        assert!(!status.should_show_notification);

        let next_day = calculate(Some(&r), &at("2026-01-29T00:00:01Z"));
        assert!(next_day.should_show_notification);
    }

    #[test]
    fn administrative_block_applies_before_expiry() {
        let mut r = record("2026-01-01T00:00:00Z", 30, 7);
        r.is_blocked = true;
        let status = calculate(Some(&r), &at("2026-01-10T00:00:00Z"));
        assert!(status.is_blocked);
        assert!(!status.is_expired);
    }
}
