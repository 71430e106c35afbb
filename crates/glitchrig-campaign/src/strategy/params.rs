use serde::Deserialize;
use serde_json::Value;

use super::StrategyKind;
use crate::error::StrategyError;

/// Delay sweep in nanoseconds.
///
/// Grid search walks the half-open range `[start, stop)` by `step`; random
/// search samples the inclusive range `[start, stop]` and ignores `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    #[serde(default)]
    pub start: u32,
    #[serde(default = "default_delay_stop")]
    pub stop: u32,
    #[serde(default = "default_delay_step")]
    pub step: u32,
}

fn default_delay_stop() -> u32 {
    1000
}

fn default_delay_step() -> u32 {
    100
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            start: 0,
            stop: default_delay_stop(),
            step: default_delay_step(),
        }
    }
}

/// Parameters shared by the grid and random strategies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    /// Candidate glitch widths in nanoseconds.
    #[serde(default = "default_widths")]
    pub tg_ns: Vec<u32>,
    #[serde(default)]
    pub delay_ns: DelayRange,
    #[serde(default = "default_repeats")]
    pub repeats_per_point: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_widths() -> Vec<u32> {
    vec![100]
}

fn default_repeats() -> u32 {
    1
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            tg_ns: default_widths(),
            delay_ns: DelayRange::default(),
            repeats_per_point: default_repeats(),
            seed: None,
        }
    }
}

impl SearchParams {
    /// Parse a strategy's `params` value. `null` means all defaults.
    pub fn parse(strategy: StrategyKind, params: &Value) -> Result<Self, StrategyError> {
        if params.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(params.clone()).map_err(|err| StrategyError::InvalidParams {
            strategy,
            reason: err.to_string(),
        })
    }
}
