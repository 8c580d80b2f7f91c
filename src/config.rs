use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::flags::FlagName;
use crate::guard::{GuardSettings, RecoveryPolicy};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SloguardConfig {
    pub server: ServerConfig,
    pub guard: GuardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GuardConfig {
    pub capacity: usize,
    pub slo_threshold_ms: u64,
    pub cooldown_secs: u64,
    pub min_samples: usize,
    pub tail_percentile: f64,
    pub governed_flag: String,
    pub recovery: RecoveryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8088,
            log_level: "info".into(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            slo_threshold_ms: 250,
            cooldown_secs: 600,
            min_samples: 100,
            tail_percentile: 0.95,
            governed_flag: FlagName::PropagationEnabled.as_str().into(),
            recovery: RecoveryPolicy::Manual,
        }
    }
}

impl GuardConfig {
    /// Validate and convert into the settings a guard is built from.
    pub fn settings(&self) -> Result<GuardSettings> {
        if self.capacity == 0 {
            bail!("guard.capacity must be at least 1");
        }
        if self.min_samples == 0 || self.min_samples > self.capacity {
            bail!(
                "guard.min_samples must be between 1 and guard.capacity ({}), got {}",
                self.capacity,
                self.min_samples
            );
        }
        if !(self.tail_percentile > 0.0 && self.tail_percentile <= 1.0) {
            bail!(
                "guard.tail_percentile must be in (0, 1], got {}",
                self.tail_percentile
            );
        }
        let governed_flag: FlagName = self
            .governed_flag
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("invalid guard.governed_flag")?;

        Ok(GuardSettings {
            capacity: self.capacity,
            slo_threshold: Duration::from_millis(self.slo_threshold_ms),
            cooldown: Duration::from_secs(self.cooldown_secs),
            min_samples: self.min_samples,
            tail_percentile: self.tail_percentile,
            governed_flag,
            recovery: self.recovery,
        })
    }
}

/// Returns `~/.sloguard/`
pub fn default_sloguard_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sloguard")
}

/// Returns the default config file path: `~/.sloguard/config.toml`
pub fn default_config_path() -> PathBuf {
    default_sloguard_dir().join("config.toml")
}

impl SloguardConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SloguardConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (SLOGUARD_LOG_LEVEL, SLOGUARD_HOST,
    /// SLOGUARD_PORT, SLOGUARD_SLO_MS, SLOGUARD_COOLDOWN_SECS).
    ///
    /// Returns the keys whose values did not parse and were ignored.
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        if let Ok(val) = std::env::var("SLOGUARD_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SLOGUARD_HOST") {
            self.server.host = val;
        }
        let mut rejected = Vec::new();
        if !override_parsed("SLOGUARD_PORT", &mut self.server.port) {
            rejected.push("SLOGUARD_PORT");
        }
        if !override_parsed("SLOGUARD_SLO_MS", &mut self.guard.slo_threshold_ms) {
            rejected.push("SLOGUARD_SLO_MS");
        }
        if !override_parsed("SLOGUARD_COOLDOWN_SECS", &mut self.guard.cooldown_secs) {
            rejected.push("SLOGUARD_COOLDOWN_SECS");
        }
        rejected
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Overwrite `target` from env var `key` if it parses; keep the current value otherwise.
/// Returns `false` only when the variable is set but unparsable.
fn override_parsed<T>(key: &str, target: &mut T) -> bool
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return true;
    };
    match raw.trim().parse() {
        Ok(value) => {
            *target = value;
            true
        }
        Err(_) => {
            warn!(key, value = %raw, keeping = %target, "invalid value in environment");
            false
        }
    }
}
