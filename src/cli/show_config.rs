//! CLI `config` command — print the resolved configuration and validate it.

use anyhow::{Context, Result};

use sloguard::config::SloguardConfig;

pub fn show_config(config: &SloguardConfig) -> Result<()> {
    println!("sloguard configuration");
    println!("======================");
    println!();
    println!("Server:");
    println!("  Listen:          {}", config.bind_addr());
    println!("  Log level:       {}", config.server.log_level);
    println!();
    println!("Guard:");
    println!("  Governed flag:   {}", config.guard.governed_flag);
    println!("  SLO threshold:   {} ms", config.guard.slo_threshold_ms);
    println!(
        "  Tail percentile: p{}",
        format_percentile(config.guard.tail_percentile)
    );
    println!("  Window capacity: {}", config.guard.capacity);
    println!("  Min samples:     {}", config.guard.min_samples);
    println!("  Cooldown:        {} s", config.guard.cooldown_secs);
    println!("  Recovery:        {}", config.guard.recovery);
    println!();

    config
        .guard
        .settings()
        .context("guard configuration is invalid")?;
    println!("Validation:        PASSED");

    Ok(())
}

fn format_percentile(p: f64) -> String {
    let pct = p * 100.0;
    if pct.fract() == 0.0 {
        format!("{pct:.0}")
    } else {
        format!("{pct}")
    }
}
