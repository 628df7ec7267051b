//! Integration tests for subscription status and the dismissal trackers.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use vitrine_billing::{SubscriptionMonitor, calculate};
use vitrine_core::clock::ManualClock;
use vitrine_core::models::subscription::SubscriptionRecord;
use vitrine_core::models::tenant::TenantScope;
use vitrine_core::storage::{KeyValueStore, MemoryStore, SharedStore, keys};

fn record(start: DateTime<Utc>, package_days: u32, grace_period_days: u32) -> SubscriptionRecord {
    SubscriptionRecord {
        package_start_date: Some(start),
        package_days,
        grace_period_days,
        ..Default::default()
    }
}

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

struct Harness {
    monitor: SubscriptionMonitor,
    clock: Arc<ManualClock>,
    store: SharedStore,
    session: SharedStore,
}

fn setup(now: DateTime<Utc>) -> Harness {
    let clock = Arc::new(ManualClock::new(now));
    let store = MemoryStore::shared();
    let session = MemoryStore::shared();
    let monitor = SubscriptionMonitor::new(store.clone(), session.clone()).with_clock(clock.clone());
    Harness {
        monitor,
        clock,
        store,
        session,
    }
}

fn acme() -> TenantScope {
    TenantScope::parse("acme").unwrap()
}

#[test]
fn expiry_boundary_for_many_packages() {
    let starts = [utc(2025, 12, 31, 23), utc(2026, 2, 28, 0), utc(2026, 6, 15, 12)];
    for start in starts {
        for days in [1, 7, 30, 365] {
            let r = record(start, days, 7);
            let end = start.date_naive() + Duration::days(i64::from(days));
            let end_at = Utc.from_utc_datetime(&end.and_hms_opt(10, 0, 0).unwrap());

            let before = calculate(Some(&r), &(end_at - Duration::days(1)));
            assert_eq!(before.days_remaining, 1, "{start} + {days}");
            assert!(!before.is_expired, "{start} + {days}");

            let on = calculate(Some(&r), &end_at);
            assert!(on.is_expired, "{start} + {days}");
            assert_eq!(on.days_overdue, 0);
            assert_eq!(on.days_remaining, 0);
            assert!(on.is_in_grace_period);
            assert!(on.can_dismiss_popup);
            assert!(on.should_show_renewal_popup);
        }
    }
}

#[test]
fn eight_days_overdue_is_blocked() {
    let r = record(utc(2026, 1, 1, 9), 30, 7);
    // Package ends Jan 31; Feb 8 is 8 days overdue.
    let status = calculate(Some(&r), &utc(2026, 2, 8, 9));
    assert_eq!(status.days_overdue, 8);
    assert!(status.is_blocked);
    assert!(!status.is_in_grace_period);
    assert!(!status.can_dismiss_popup);
    assert!(status.should_show_renewal_popup);

    let last_grace_day = calculate(Some(&r), &utc(2026, 2, 7, 9));
    assert!(!last_grace_day.is_blocked);
    assert!(last_grace_day.can_dismiss_popup);
    assert_eq!(last_grace_day.grace_end_date, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap());
}

#[test]
fn notification_dismissal_resets_at_midnight() {
    let h = setup(utc(2026, 1, 28, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);

    assert!(h.monitor.evaluate(&acme(), Some(&r)).show_notification);
    h.monitor.dismiss_notification(&acme());
    assert!(h.store.get_item(&keys::notification_dismissed(&acme())).is_some());

    h.clock.set(utc(2026, 1, 28, 23));
    let later = h.monitor.evaluate(&acme(), Some(&r));
    assert!(later.status.should_show_notification);
    assert!(!later.show_notification);

    h.clock.set(utc(2026, 1, 29, 0) + Duration::minutes(1));
    assert!(h.monitor.evaluate(&acme(), Some(&r)).show_notification);
}

#[test]
fn notification_dismissal_uses_local_midnight() {
    let h = setup(utc(2026, 1, 28, 20));
    let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
    let monitor = SubscriptionMonitor::new(h.store.clone(), h.session.clone())
        .with_clock(h.clock.clone())
        .with_offset(plus_five);
    let r = record(utc(2026, 1, 1, 0), 30, 7);

    // 20:00 UTC is 01:00 on Jan 29 at UTC+5.
    monitor.dismiss_notification(&acme());
    h.clock.set(utc(2026, 1, 29, 18));
    assert!(!monitor.evaluate(&acme(), Some(&r)).show_notification);

    // 19:00 UTC on Jan 29 is midnight of Jan 30 locally.
    h.clock.set(utc(2026, 1, 29, 19));
    assert!(monitor.evaluate(&acme(), Some(&r)).show_notification);
}

#[test]
fn dismissals_are_per_tenant() {
    let h = setup(utc(2026, 1, 28, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);
    let other = TenantScope::parse("globex").unwrap();

    h.monitor.dismiss_notification(&acme());
    assert!(!h.monitor.evaluate(&acme(), Some(&r)).show_notification);
    assert!(h.monitor.evaluate(&other, Some(&r)).show_notification);
}

#[test]
fn popup_dismissal_holds_only_during_grace() {
    let h = setup(utc(2026, 2, 2, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);

    let view = h.monitor.evaluate(&acme(), Some(&r));
    assert!(view.show_renewal_popup);
    assert!(view.can_dismiss_popup);

    assert!(h.monitor.dismiss_popup(&acme(), Some(&r)));
    assert!(!h.monitor.evaluate(&acme(), Some(&r)).show_renewal_popup);
    assert_eq!(h.session.get_item(&keys::popup_dismissed(&acme())).as_deref(), Some("true"));

    // Grace ends Feb 7; the session dismissal no longer counts.
    h.clock.set(utc(2026, 2, 8, 9));
    let blocked = h.monitor.evaluate(&acme(), Some(&r));
    assert!(blocked.show_renewal_popup);
    assert!(!blocked.can_dismiss_popup);
    assert!(!h.monitor.dismiss_popup(&acme(), Some(&r)));
}

#[test]
fn popup_dismissal_does_not_survive_a_new_session() {
    let h = setup(utc(2026, 2, 2, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);
    h.monitor.dismiss_popup(&acme(), Some(&r));

    let fresh_session = SubscriptionMonitor::new(h.store.clone(), MemoryStore::shared()).with_clock(h.clock.clone());
    assert!(fresh_session.evaluate(&acme(), Some(&r)).show_renewal_popup);
}

#[test]
fn malformed_dismissal_is_ignored() {
    let h = setup(utc(2026, 1, 28, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);
    h.store.persist(&keys::notification_dismissed(&acme()), "yesterday-ish");
    assert!(h.monitor.evaluate(&acme(), Some(&r)).show_notification);
}

#[test]
fn no_record_shows_nothing() {
    let h = setup(utc(2026, 1, 28, 9));
    let view = h.monitor.evaluate(&acme(), None);
    assert!(!view.show_notification);
    assert!(!view.show_renewal_popup);
    assert!(view.can_dismiss_popup);
    assert_eq!(view.status.days_remaining, 30);
}

#[test]
fn view_serializes_camel_case() {
    let h = setup(utc(2026, 1, 30, 9));
    let r = record(utc(2026, 1, 1, 0), 30, 7);
    let json = serde_json::to_value(h.monitor.evaluate(&acme(), Some(&r))).unwrap();
    assert_eq!(json["status"]["daysRemaining"], 1);
    assert_eq!(json["status"]["packageEndDate"], "2026-01-31");
    assert_eq!(json["showNotification"], true);
}
