#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sloguard::flags::FlagStore;
use sloguard::guard::{GuardSettings, ManualClock, SloGuard};
use sloguard::Governor;

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Production-shaped settings: capacity 500, 250 ms threshold, 10 min cooldown,
/// 100 sample floor, p95.
pub fn default_settings() -> GuardSettings {
    GuardSettings::default()
}

/// A guard on a manual clock, with its flag store exposed.
pub fn test_guard(settings: GuardSettings) -> (SloGuard, Arc<FlagStore>, Arc<ManualClock>) {
    let flags = Arc::new(FlagStore::new());
    let clock = Arc::new(ManualClock::default());
    let guard = SloGuard::with_clock(settings, Arc::clone(&flags), clock.clone());
    (guard, flags, clock)
}

pub fn test_governor(settings: GuardSettings) -> (Governor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    (Governor::with_clock(settings, clock.clone()), clock)
}

/// Record `fast` samples at 50 ms followed by `slow` samples at 300 ms.
pub fn feed(guard: &SloGuard, tenant: &str, fast: usize, slow: usize) {
    for _ in 0..fast {
        guard.record_latency(tenant, ms(50));
    }
    for _ in 0..slow {
        guard.record_latency(tenant, ms(300));
    }
}
