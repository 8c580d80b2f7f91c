//! Feature toggle definitions.
//!
//! Defines [`FlagName`] (the closed set of toggle names) and [`FlagSet`] (one
//! tenant's full record of toggles).

use serde::{Deserialize, Serialize};

/// The named toggles every tenant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagName {
    /// Graph propagation during context injection. This is the expensive path the guard governs.
    PropagationEnabled,
    /// Whether latency samples are collected for the tenant at all.
    SloGuardEnabled,
    /// Background edge learning between tags.
    EdgeLearningEnabled,
}

impl FlagName {
    pub const ALL: [FlagName; 3] = [
        Self::PropagationEnabled,
        Self::SloGuardEnabled,
        Self::EdgeLearningEnabled,
    ];

    /// Wire name used in JSON bodies and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PropagationEnabled => "propagation_enabled",
            Self::SloGuardEnabled => "slo_guard_enabled",
            Self::EdgeLearningEnabled => "edge_learning_enabled",
        }
    }
}

impl std::fmt::Display for FlagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlagName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "propagation_enabled" | "PROPAGATION_ON" => Ok(Self::PropagationEnabled),
            "slo_guard_enabled" | "SLO_GUARD_ON" => Ok(Self::SloGuardEnabled),
            "edge_learning_enabled" | "EDGE_LEARNING_ON" => Ok(Self::EdgeLearningEnabled),
            _ => Err(format!("unknown flag: {s}")),
        }
    }
}

/// A tenant's toggles. Every toggle defaults to `true`, including toggles
/// missing from a deserialized body.
///
/// Legacy uppercase keys are accepted as aliases. A body carrying both the
/// legacy and the current key for one toggle is rejected as a duplicate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSet {
    #[serde(alias = "PROPAGATION_ON")]
    pub propagation_enabled: bool,
    #[serde(alias = "SLO_GUARD_ON")]
    pub slo_guard_enabled: bool,
    #[serde(alias = "EDGE_LEARNING_ON")]
    pub edge_learning_enabled: bool,
}

impl Default for FlagSet {
    fn default() -> Self {
        Self {
            propagation_enabled: true,
            slo_guard_enabled: true,
            edge_learning_enabled: true,
        }
    }
}

impl FlagSet {
    pub fn get(&self, name: FlagName) -> bool {
        match name {
            FlagName::PropagationEnabled => self.propagation_enabled,
            FlagName::SloGuardEnabled => self.slo_guard_enabled,
            FlagName::EdgeLearningEnabled => self.edge_learning_enabled,
        }
    }

    pub fn set(&mut self, name: FlagName, value: bool) {
        match name {
            FlagName::PropagationEnabled => self.propagation_enabled = value,
            FlagName::SloGuardEnabled => self.slo_guard_enabled = value,
            FlagName::EdgeLearningEnabled => self.edge_learning_enabled = value,
        }
    }
}
