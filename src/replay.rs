//! Offline what-if runs of the guard over a recorded latency trace.
//!
//! A trace is plain text, one sample per line: `offset_ms,tenant,latency_ms`.
//! Offsets are milliseconds since the start of the trace and must not go
//! backwards. Blank lines and lines starting with `#` are skipped.
//!
//! [`replay`] feeds the samples through a fresh [`Governor`] driven by a
//! [`ManualClock`], so cooldowns play out exactly as they would have live.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::governor::Governor;
use crate::guard::{saturating_millis, Clock, Evaluation, GuardSettings, ManualClock};

#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub offset: Duration,
    pub tenant: String,
    pub latency: Duration,
}

/// One trip observed during a replay.
#[derive(Debug, Clone, Serialize)]
pub struct TripEvent {
    pub offset_ms: u64,
    pub tenant: String,
    pub estimate_ms: f64,
    pub cooldown_ends_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TenantSummary {
    pub samples: usize,
    pub trips: usize,
    pub feature_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub trips: Vec<TripEvent>,
    pub tenants: BTreeMap<String, TenantSummary>,
}

/// Parse a trace. Errors name the offending line.
pub fn parse_trace(input: &str) -> Result<Vec<TraceEntry>> {
    let mut entries = Vec::new();
    let mut last_offset = Duration::ZERO;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [offset, tenant, latency] = fields.as_slice() else {
            bail!("line {line_no}: expected `offset_ms,tenant,latency_ms`, got {line:?}");
        };
        if tenant.is_empty() {
            bail!("line {line_no}: tenant must not be empty");
        }
        let offset = parse_millis(offset).with_context(|| format!("line {line_no}: bad offset"))?;
        let latency =
            parse_millis(latency).with_context(|| format!("line {line_no}: bad latency"))?;
        if offset < last_offset {
            bail!("line {line_no}: offsets must not go backwards");
        }
        last_offset = offset;

        entries.push(TraceEntry {
            offset,
            tenant: tenant.to_string(),
            latency,
        });
    }

    Ok(entries)
}

fn parse_millis(field: &str) -> Result<Duration> {
    let ms: f64 = field
        .parse()
        .with_context(|| format!("{field:?} is not a number"))?;
    Duration::try_from_secs_f64(ms / 1000.0)
        .with_context(|| format!("{field:?} is not a non-negative duration"))
}

/// Run `entries` through a guard built from `settings`.
pub fn replay(settings: GuardSettings, entries: &[TraceEntry]) -> ReplayReport {
    let start = Utc::now();
    let clock = Arc::new(ManualClock::new(start));
    let governor = Governor::with_clock(settings, clock.clone());
    let mut report = ReplayReport::default();

    for entry in entries {
        clock.set(crate::guard::clock::saturating_add(start, entry.offset));
        let evaluation = governor.record_latency(&entry.tenant, entry.latency);

        let summary = report.tenants.entry(entry.tenant.clone()).or_default();
        if evaluation.is_some() {
            summary.samples += 1;
        }
        if let Some(Evaluation::Tripped { estimate, until }) = evaluation {
            summary.trips += 1;
            report.trips.push(TripEvent {
                offset_ms: saturating_millis(entry.offset),
                tenant: entry.tenant.clone(),
                estimate_ms: estimate.as_secs_f64() * 1000.0,
                cooldown_ends_ms: offset_ms(start, until),
            });
        }
    }

    for (tenant, summary) in report.tenants.iter_mut() {
        summary.feature_enabled = governor.is_feature_enabled(tenant);
    }
    tracing::debug!(
        samples = entries.len(),
        trips = report.trips.len(),
        now = %clock.now().to_rfc3339(),
        "replay finished"
    );

    report
}

fn offset_ms(start: DateTime<Utc>, at: DateTime<Utc>) -> u64 {
    (at - start).num_milliseconds().max(0) as u64
}
