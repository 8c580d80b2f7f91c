//! CLI `replay` command — run a latency trace through the guard and print trips.

use anyhow::{Context, Result};
use std::path::Path;

use sloguard::config::SloguardConfig;

pub fn replay(config: &SloguardConfig, file: &Path, json: bool) -> Result<()> {
    let settings = config
        .guard
        .settings()
        .context("guard configuration is invalid")?;
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read trace {}", file.display()))?;
    let entries = sloguard::replay::parse_trace(&contents)?;

    let report = sloguard::replay::replay(settings, &entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Replayed {} samples from {}", entries.len(), file.display());
    println!();

    if report.trips.is_empty() {
        println!("No trips.");
    } else {
        println!("Trips:");
        for trip in &report.trips {
            println!(
                "  t+{:>8} ms  {:<20} tail {:>8.1} ms  cooldown until t+{} ms",
                trip.offset_ms, trip.tenant, trip.estimate_ms, trip.cooldown_ends_ms
            );
        }
    }
    println!();

    println!("By tenant:");
    for (tenant, summary) in &report.tenants {
        println!(
            "  {:<20} samples {:>6}  trips {:>3}  feature {}",
            tenant,
            summary.samples,
            summary.trips,
            if summary.feature_enabled { "on" } else { "off" }
        );
    }

    Ok(())
}
