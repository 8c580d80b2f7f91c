//! Latency-triggered circuit breaker.
//!
//! [`SloGuard::record_latency`] is the single entry point. Each call appends the
//! sample to the tenant's [`LatencyWindow`] and then, unless the tenant is
//! cooling down or has too few samples, compares the tail-latency estimate
//! against the threshold. A breach turns the governed flag off in the shared
//! [`FlagStore`] and starts a cooldown during which no further decision is made.
//!
//! Lock order is always guard → flag store. The flag store never calls back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::clock::{saturating_add, saturating_millis, Clock, SystemClock};
use super::window::LatencyWindow;
use crate::flags::{FlagName, FlagStore};

/// What happens to the governed flag once a cooldown expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Expiry only re-arms evaluation. The flag stays off until an operator
    /// turns it back on.
    #[default]
    Manual,
    /// The first sample after expiry turns the flag back on and clears the
    /// cooldown, then is evaluated normally.
    ///
    /// The flag is set unconditionally. An operator who turns it off during
    /// the cooldown is overridden on expiry; use `Manual` to keep such writes.
    Auto,
}

impl RecoveryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for a [`SloGuard`], fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardSettings {
    /// Maximum samples kept per tenant.
    pub capacity: usize,
    /// Tail estimates strictly above this trip the breaker.
    pub slo_threshold: Duration,
    /// How long evaluation stays suspended after a trip.
    pub cooldown: Duration,
    /// No decision is made below this many samples.
    pub min_samples: usize,
    /// Percentile used as the tail estimate, in `(0, 1]`.
    pub tail_percentile: f64,
    /// The flag turned off on a trip.
    pub governed_flag: FlagName,
    pub recovery: RecoveryPolicy,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            capacity: 500,
            slo_threshold: Duration::from_millis(250),
            cooldown: Duration::from_secs(10 * 60),
            min_samples: 100,
            tail_percentile: 0.95,
            governed_flag: FlagName::PropagationEnabled,
            recovery: RecoveryPolicy::Manual,
        }
    }
}

/// Outcome of evaluating one recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// A cooldown is active; the sample was stored but not acted on.
    CoolingDown { until: DateTime<Utc> },
    /// Not enough samples for a decision yet.
    InsufficientSamples { samples: usize, required: usize },
    /// The tail estimate is at or under the threshold; nothing changed.
    WithinSlo { estimate: Duration },
    /// The governed flag was turned off and a cooldown started.
    Tripped {
        estimate: Duration,
        until: DateTime<Utc>,
    },
}

impl Evaluation {
    pub fn tripped(&self) -> bool {
        matches!(self, Self::Tripped { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Monitoring,
    Cooldown,
}

/// Point-in-time view of one tenant's guard state.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardStatus {
    pub state: GuardState,
    pub samples: usize,
    pub capacity: usize,
    pub tail_estimate: Option<Duration>,
    /// Last cooldown end, which may lie in the past once expired.
    pub cooldown_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TenantState {
    window: LatencyWindow,
    cooldown_until: Option<DateTime<Utc>>,
}

impl TenantState {
    fn new(capacity: usize) -> Self {
        Self {
            window: LatencyWindow::new(capacity),
            cooldown_until: None,
        }
    }
}

pub struct SloGuard {
    settings: GuardSettings,
    flags: Arc<FlagStore>,
    clock: Arc<dyn Clock>,
    tenants: Mutex<HashMap<String, TenantState>>,
}

impl SloGuard {
    pub fn new(settings: GuardSettings, flags: Arc<FlagStore>) -> Self {
        Self::with_clock(settings, flags, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: GuardSettings, flags: Arc<FlagStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            flags,
            clock,
            tenants: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    /// Record one latency measurement for `tenant` and evaluate a trip.
    ///
    /// Never fails. The returned [`Evaluation`] is informational.
    pub fn record_latency(&self, tenant: &str, latency: Duration) -> Evaluation {
        let now = self.clock.now();
        let mut tenants = self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
        let state = tenants
            .entry(tenant.to_string())
            .or_insert_with(|| TenantState::new(self.settings.capacity));

        state.window.push(latency);
        self.evaluate(tenant, state, now)
    }

    fn evaluate(&self, tenant: &str, state: &mut TenantState, now: DateTime<Utc>) -> Evaluation {
        // 1. Cooldown gate
        if let Some(until) = state.cooldown_until {
            if now < until {
                return Evaluation::CoolingDown { until };
            }
            if self.settings.recovery == RecoveryPolicy::Auto {
                state.cooldown_until = None;
                self.flags.set(tenant, self.settings.governed_flag, true);
                tracing::info!(
                    tenant,
                    flag = %self.settings.governed_flag,
                    "cooldown expired, flag re-enabled"
                );
            }
        }

        // 2. Sample floor
        let samples = state.window.len();
        if samples < self.settings.min_samples {
            return Evaluation::InsufficientSamples {
                samples,
                required: self.settings.min_samples,
            };
        }

        // 3. Tail estimate
        let Some(estimate) = state.window.percentile(self.settings.tail_percentile) else {
            return Evaluation::InsufficientSamples {
                samples,
                required: self.settings.min_samples,
            };
        };
        if estimate <= self.settings.slo_threshold {
            return Evaluation::WithinSlo { estimate };
        }

        // 4. Trip
        let until = saturating_add(now, self.settings.cooldown);
        self.flags.set(tenant, self.settings.governed_flag, false);
        state.cooldown_until = Some(until);

        tracing::warn!(
            tenant,
            flag = %self.settings.governed_flag,
            estimate_ms = saturating_millis(estimate),
            threshold_ms = saturating_millis(self.settings.slo_threshold),
            cooldown_until = %until.to_rfc3339(),
            "tail latency over SLO, flag disabled"
        );

        Evaluation::Tripped { estimate, until }
    }

    /// Current guard state for `tenant`. Unknown tenants report an empty window.
    pub fn status(&self, tenant: &str) -> GuardStatus {
        let now = self.clock.now();
        let tenants = self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
        match tenants.get(tenant) {
            Some(state) => GuardStatus {
                state: match state.cooldown_until {
                    Some(until) if now < until => GuardState::Cooldown,
                    _ => GuardState::Monitoring,
                },
                samples: state.window.len(),
                capacity: state.window.capacity(),
                tail_estimate: state.window.percentile(self.settings.tail_percentile),
                cooldown_until: state.cooldown_until,
            },
            None => GuardStatus {
                state: GuardState::Monitoring,
                samples: 0,
                capacity: self.settings.capacity.max(1),
                tail_estimate: None,
                cooldown_until: None,
            },
        }
    }

    /// Snapshot of the tenant's samples, oldest first.
    pub fn window(&self, tenant: &str) -> Vec<Duration> {
        let tenants = self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
        tenants
            .get(tenant)
            .map(|state| state.window.to_vec())
            .unwrap_or_default()
    }

    pub fn cooldown_until(&self, tenant: &str) -> Option<DateTime<Utc>> {
        let tenants = self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
        tenants.get(tenant).and_then(|state| state.cooldown_until)
    }

    /// Drop the tenant's window and cooldown. Does not touch its flags.
    /// Returns `true` if there was anything to drop.
    pub fn reset(&self, tenant: &str) -> bool {
        let mut tenants = self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
        tenants.remove(tenant).is_some()
    }
}

impl std::fmt::Debug for SloGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SloGuard")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
