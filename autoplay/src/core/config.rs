//! Automation configuration and its validation rules.
//!
//! Persistence lives in `io::config`; this module holds the value type and the
//! pure checks that run before any configuration becomes active.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Upper bound for the reaction delay, in seconds.
pub const MAX_DELAY_SECONDS: f64 = 10.0;

/// First invariant violated by a candidate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid config field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Policy used to choose a discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    Aggressive,
    #[default]
    Balanced,
    Defensive,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Aggressive, Strategy::Balanced, Strategy::Defensive];

    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Aggressive => "aggressive",
            Strategy::Balanced => "balanced",
            Strategy::Defensive => "defensive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == raw)
            .ok_or_else(|| {
                ValidationError::new(
                    "strategy",
                    format!("{raw:?} is not one of aggressive, balanced, defensive"),
                )
            })
    }
}

/// Active automation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoPlayConfig {
    /// Master switch; when off every decision is `pass`.
    pub enabled: bool,
    pub auto_discard: bool,
    pub auto_meld: bool,
    pub auto_riichi: bool,
    pub auto_agari: bool,
    /// Persisted confidence floor; the gate does not consult it.
    pub min_confidence: f64,
    /// Hand danger above this switches balanced/defensive play to the safest tile.
    pub defense_threshold: f64,
    /// Pause before dispatch, simulating human reaction time.
    pub delay_seconds: f64,
    /// Ask for an explicit accept before dispatch.
    pub confirm_actions: bool,
    pub strategy: Strategy,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_discard: true,
            auto_meld: false,
            auto_riichi: false,
            auto_agari: true,
            min_confidence: 0.7,
            defense_threshold: 0.15,
            delay_seconds: 1.0,
            confirm_actions: true,
            strategy: Strategy::Balanced,
        }
    }
}

impl AutoPlayConfig {
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds.clamp(0.0, MAX_DELAY_SECONDS))
            .unwrap_or(Duration::ZERO)
    }
}

/// Check every invariant, returning the first violation.
pub fn validate(config: &AutoPlayConfig) -> Result<(), ValidationError> {
    check_range("minConfidence", config.min_confidence, 1.0)?;
    check_range("defenseThreshold", config.defense_threshold, 1.0)?;
    check_range("delaySeconds", config.delay_seconds, MAX_DELAY_SECONDS)?;
    Ok(())
}

fn check_range(field: &'static str, value: f64, max: f64) -> Result<(), ValidationError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("{value} is outside [0, {max}]"),
        ))
    }
}
