//! Coordination configuration
//!
//! Defaults are usable as-is. Deployments override them through environment
//! variables or a TOML document; either way the result is validated before
//! any component is built from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::DEFAULT_CHANNEL_CAPACITY;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be within [0.0, 1.0], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scheduler behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether a FAILED task releases the tasks that depend on it
    pub failed_dependencies_satisfy: bool,
}

/// Proposal voting thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// Minimum participation fraction (votes cast / total voters)
    pub quorum: f64,
    /// Minimum YES fraction over total voters
    pub threshold: f64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            quorum: 0.5,
            threshold: 0.5,
        }
    }
}

/// Value-consensus threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Minimum fraction of agents that must hold the same value
    pub convergence_threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            convergence_threshold: 0.66,
        }
    }
}

/// Event bus sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Undelivered events buffered per subscriber before it lags
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Top-level configuration for all coordination components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    pub scheduler: SchedulerConfig,
    pub voting: VotingConfig,
    pub consensus: ConsensusConfig,
    pub events: EventsConfig,
}

impl CoordinationConfig {
    /// Create config from environment variables
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COORDINATION_QUORUM") {
            if let Ok(n) = val.parse() {
                config.voting.quorum = n;
            }
        }
        if let Ok(val) = std::env::var("COORDINATION_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.voting.threshold = n;
            }
        }
        if let Ok(val) = std::env::var("COORDINATION_CONVERGENCE_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.consensus.convergence_threshold = n;
            }
        }
        if let Ok(val) = std::env::var("COORDINATION_FAILED_DEPS_SATISFY") {
            config.scheduler.failed_dependencies_satisfy =
                val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("COORDINATION_EVENT_CAPACITY") {
            if let Ok(n) = val.parse() {
                config.events.channel_capacity = n;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document; missing sections use defaults
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every fraction is in range and capacities are non-zero
    pub fn validate(&self) -> ConfigResult<()> {
        check_fraction("voting.quorum", self.voting.quorum)?;
        check_fraction("voting.threshold", self.voting.threshold)?;
        check_fraction(
            "consensus.convergence_threshold",
            self.consensus.convergence_threshold,
        )?;
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "events.channel_capacity",
            });
        }
        Ok(())
    }
}

pub(crate) fn check_fraction(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}
