mod helpers;

use std::time::Duration;

use helpers::{default_settings, feed, ms, test_guard};
use sloguard::guard::{Clock, Evaluation, GuardSettings, GuardState, RecoveryPolicy};

#[test]
fn window_keeps_the_most_recent_capacity_samples() {
    let (guard, _, _) = test_guard(GuardSettings {
        capacity: 50,
        ..default_settings()
    });

    for v in 0..57u64 {
        guard.record_latency("acme", ms(v));
    }

    let window = guard.window("acme");
    assert_eq!(window.len(), 50);
    let expected: Vec<Duration> = (7..57u64).map(ms).collect();
    assert_eq!(window, expected);
}

#[test]
fn tail_breach_trips_and_starts_cooldown() {
    let (guard, flags, clock) = test_guard(default_settings());

    // 95 fast then 5 slow: sorted rank 95 lands on a 300 ms sample.
    feed(&guard, "acme", 95, 4);
    assert!(flags.get("acme").propagation_enabled);
    assert_eq!(guard.cooldown_until("acme"), None);

    let eval = guard.record_latency("acme", ms(300));
    assert!(eval.tripped());
    assert_eq!(
        eval,
        Evaluation::Tripped {
            estimate: ms(300),
            until: clock.now() + chrono::TimeDelta::minutes(10),
        }
    );

    assert!(!flags.get("acme").propagation_enabled);
    let until = guard.cooldown_until("acme").unwrap();
    assert!(until > clock.now());
    assert_eq!(guard.status("acme").state, GuardState::Cooldown);
}

#[test]
fn cooldown_suppresses_further_decisions() {
    let (guard, flags, clock) = test_guard(default_settings());
    feed(&guard, "acme", 95, 5);
    let until = guard.cooldown_until("acme").unwrap();

    // Operator turns the feature back on mid-cooldown; breaches must not undo it.
    flags.update_one("acme", "propagation_enabled", true);

    clock.advance(Duration::from_secs(60));
    for _ in 0..200 {
        let eval = guard.record_latency("acme", ms(900));
        assert_eq!(eval, Evaluation::CoolingDown { until });
    }

    assert_eq!(guard.cooldown_until("acme"), Some(until));
    assert!(flags.get("acme").propagation_enabled);
    // Samples were still recorded
    assert_eq!(guard.window("acme").len(), 300);
}

#[test]
fn samples_under_threshold_leave_flag_and_cooldown_alone() {
    let (guard, flags, _) = test_guard(default_settings());

    flags.update_one("acme", "propagation_enabled", false);
    for _ in 0..100 {
        guard.record_latency("acme", ms(249));
    }
    assert!(!flags.get("acme").propagation_enabled, "flag must stay untouched");
    assert_eq!(guard.cooldown_until("acme"), None);

    for _ in 0..100 {
        guard.record_latency("beta", ms(10));
    }
    assert!(flags.get("beta").propagation_enabled);
    assert_eq!(guard.cooldown_until("beta"), None);
}

#[test]
fn expiry_rearms_evaluation_without_restoring_flag() {
    let (guard, flags, clock) = test_guard(default_settings());
    feed(&guard, "acme", 95, 5);
    let first_until = guard.cooldown_until("acme").unwrap();

    // Fill the window with fast samples during cooldown.
    feed(&guard, "acme", 500, 0);

    clock.advance(Duration::from_secs(10 * 60 + 1));
    assert_eq!(guard.status("acme").state, GuardState::Monitoring);

    let eval = guard.record_latency("acme", ms(50));
    assert_eq!(eval, Evaluation::WithinSlo { estimate: ms(50) });
    assert!(
        !flags.get("acme").propagation_enabled,
        "manual recovery must not re-enable on expiry"
    );
    assert_eq!(guard.cooldown_until("acme"), Some(first_until));
}

#[test]
fn expiry_can_trip_again() {
    let (guard, flags, clock) = test_guard(default_settings());
    feed(&guard, "acme", 95, 5);
    let first_until = guard.cooldown_until("acme").unwrap();

    // Operator re-enables, but latency is still bad when the cooldown ends.
    flags.update_one("acme", "propagation_enabled", true);
    clock.advance(Duration::from_secs(10 * 60));

    let eval = guard.record_latency("acme", ms(300));
    assert!(eval.tripped());
    assert!(!flags.get("acme").propagation_enabled);
    assert!(guard.cooldown_until("acme").unwrap() > first_until);
}

#[test]
fn auto_recovery_reenables_after_expiry() {
    let (guard, flags, clock) = test_guard(GuardSettings {
        recovery: RecoveryPolicy::Auto,
        ..default_settings()
    });
    feed(&guard, "acme", 95, 5);
    assert!(!flags.get("acme").propagation_enabled);

    clock.advance(Duration::from_secs(5 * 60));
    guard.record_latency("acme", ms(300));
    assert!(!flags.get("acme").propagation_enabled, "still cooling down");

    // Latency is still bad, so the first post-expiry sample restores the
    // flag and then trips again on the same evaluation.
    clock.advance(Duration::from_secs(5 * 60));
    let eval = guard.record_latency("acme", ms(300));
    assert!(eval.tripped());
    assert!(!flags.get("acme").propagation_enabled);

    // After a clean window and another expiry the flag stays on.
    feed(&guard, "acme", 500, 0);
    clock.advance(Duration::from_secs(10 * 60));
    let eval = guard.record_latency("acme", ms(50));
    assert_eq!(eval, Evaluation::WithinSlo { estimate: ms(50) });
    assert!(flags.get("acme").propagation_enabled);
}

#[test]
fn tenants_are_isolated() {
    let (guard, flags, _) = test_guard(default_settings());
    feed(&guard, "slow-co", 95, 5);
    feed(&guard, "fast-co", 100, 0);

    assert!(!flags.get("slow-co").propagation_enabled);
    assert!(flags.get("fast-co").propagation_enabled);
    assert!(guard.cooldown_until("fast-co").is_none());
}

#[test]
fn extreme_durations_are_accepted() {
    let (guard, flags, _) = test_guard(GuardSettings {
        min_samples: 1,
        capacity: 1,
        ..default_settings()
    });

    assert_eq!(
        guard.record_latency("acme", Duration::ZERO),
        Evaluation::WithinSlo {
            estimate: Duration::ZERO
        }
    );
    assert!(guard.record_latency("acme", Duration::MAX).tripped());
    assert!(!flags.get("acme").propagation_enabled);
}

#[test]
fn huge_cooldown_saturates() {
    let (guard, _, _) = test_guard(GuardSettings {
        cooldown: Duration::MAX,
        ..default_settings()
    });
    feed(&guard, "acme", 95, 5);
    assert_eq!(
        guard.cooldown_until("acme"),
        Some(chrono::DateTime::<chrono::Utc>::MAX_UTC)
    );
}
