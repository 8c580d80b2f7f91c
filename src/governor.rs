//! The surface request handlers talk to.
//!
//! A [`Governor`] pairs the shared [`FlagStore`] with the [`SloGuard`] that
//! manipulates it. Build one at startup and hand clones to every handler.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::flags::{FlagName, FlagStore};
use crate::guard::{Clock, Evaluation, GuardSettings, SloGuard, SystemClock};

#[derive(Debug, Clone)]
pub struct Governor {
    flags: Arc<FlagStore>,
    guard: Arc<SloGuard>,
}

impl Governor {
    pub fn new(settings: GuardSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: GuardSettings, clock: Arc<dyn Clock>) -> Self {
        let flags = Arc::new(FlagStore::new());
        let guard = Arc::new(SloGuard::with_clock(settings, Arc::clone(&flags), clock));
        Self { flags, guard }
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    pub fn guard(&self) -> &SloGuard {
        &self.guard
    }

    /// Whether the governed (expensive) path is currently allowed for `tenant`.
    pub fn is_feature_enabled(&self, tenant: &str) -> bool {
        self.flags.get(tenant).get(self.guard.settings().governed_flag)
    }

    pub fn is_slo_guard_enabled(&self, tenant: &str) -> bool {
        self.flags.get(tenant).get(FlagName::SloGuardEnabled)
    }

    /// Report a measured latency. Tenants with `slo_guard_enabled` off are not
    /// monitored and get `None` back.
    pub fn record_latency(&self, tenant: &str, latency: Duration) -> Option<Evaluation> {
        if !self.is_slo_guard_enabled(tenant) {
            return None;
        }
        Some(self.guard.record_latency(tenant, latency))
    }

    /// Run one unit of work for `tenant`, handing it the current governed flag,
    /// and record how long it took.
    pub async fn run_gated<F, Fut, T>(&self, tenant: &str, work: F) -> T
    where
        F: FnOnce(bool) -> Fut,
        Fut: Future<Output = T>,
    {
        let enabled = self.is_feature_enabled(tenant);
        let started = Instant::now();
        let output = work(enabled).await;
        self.record_latency(tenant, started.elapsed());
        output
    }
}
