//! Parameter-space search strategies.
//!
//! A strategy hands out [`AttackSpec`]s on request. Returning fewer than the
//! requested count (possibly none) means the space is exhausted and the
//! campaign must stop asking.

mod grid;
mod params;
mod random;

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::StrategyError;
use crate::model::{AttackSpec, Trial};

pub use grid::GridSearch;
pub use params::{DelayRange, SearchParams};
pub use random::RandomSearch;

/// Produces attack configurations from trial history.
pub trait Strategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Propose up to `n` attacks. Fewer than `n` signals exhaustion.
    fn propose(&mut self, history: &[Trial], n: usize) -> Vec<AttackSpec>;

    /// Learn from newly completed trials. Non-adaptive strategies ignore this.
    fn observe(&mut self, _trials: &[Trial]) {}
}

/// Every strategy the configuration can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Grid,
    Random,
    /// Bayesian optimization. Not implemented.
    Bayes,
    /// Multi-armed bandit. Not implemented.
    Bandit,
    /// White-box glitch window hunting. Not implemented.
    WindowHunter,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Grid,
        StrategyKind::Random,
        StrategyKind::Bayes,
        StrategyKind::Bandit,
        StrategyKind::WindowHunter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Random => "random",
            Self::Bayes => "bayes",
            Self::Bandit => "bandit",
            Self::WindowHunter => "window_hunter",
        }
    }

    pub const fn is_implemented(self) -> bool {
        matches!(self, Self::Grid | Self::Random)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))
    }
}

/// Strategy selection plus its strategy-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: StrategyKind::Grid.name().to_string(),
            params: Value::Null,
        }
    }
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind, params: Value) -> Self {
        Self {
            name: kind.name().to_string(),
            params,
        }
    }

    /// Resolve the configured name.
    pub fn kind(&self) -> Result<StrategyKind, StrategyError> {
        self.name.parse()
    }
}

/// Build the configured strategy.
///
/// `campaign_seed` seeds randomized strategies whose own params carry no
/// seed; with neither, they draw from OS entropy.
pub fn create_strategy(
    config: &StrategyConfig,
    campaign_seed: Option<u64>,
) -> Result<Box<dyn Strategy>, StrategyError> {
    let kind = config.kind()?;
    match kind {
        StrategyKind::Grid => {
            let params = SearchParams::parse(kind, &config.params)?;
            Ok(Box::new(GridSearch::new(&params)?))
        }
        StrategyKind::Random => {
            let params = SearchParams::parse(kind, &config.params)?;
            let rng = match params.seed.or(campaign_seed) {
                Some(seed) => {
                    debug!(seed, "seeding random strategy");
                    ChaCha8Rng::seed_from_u64(seed)
                }
                None => ChaCha8Rng::from_entropy(),
            };
            Ok(Box::new(RandomSearch::new(&params, rng)?))
        }
        StrategyKind::Bayes | StrategyKind::Bandit | StrategyKind::WindowHunter => {
            Err(StrategyError::Unsupported(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_names_roundtrip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_config_error() {
        let cfg = StrategyConfig {
            name: "simulated_annealing".to_string(),
            params: Value::Null,
        };
        let err = create_strategy(&cfg, None).err().unwrap();
        assert!(matches!(err, StrategyError::UnknownStrategy(ref n) if n == "simulated_annealing"));
    }

    #[test]
    fn declared_stubs_are_unsupported() {
        for kind in [StrategyKind::Bayes, StrategyKind::Bandit, StrategyKind::WindowHunter] {
            assert!(!kind.is_implemented());
            let err = create_strategy(&StrategyConfig::new(kind, Value::Null), Some(1))
                .err()
                .unwrap();
            assert!(matches!(err, StrategyError::Unsupported(k) if k == kind));
        }
    }

    #[test]
    fn implemented_strategies_build() {
        let grid = create_strategy(&StrategyConfig::default(), None).unwrap();
        assert_eq!(grid.name(), "grid");

        let random = create_strategy(
            &StrategyConfig::new(StrategyKind::Random, json!({"seed": 3})),
            None,
        )
        .unwrap();
        assert_eq!(random.name(), "random");
    }

    #[test]
    fn campaign_seed_is_fallback() {
        let params = json!({"tg_ns": [10, 20, 30], "delay_ns": {"start": 0, "stop": 10000}});
        let cfg = StrategyConfig::new(StrategyKind::Random, params.clone());

        let mut a = create_strategy(&cfg, Some(42)).unwrap();
        let mut b = create_strategy(&cfg, Some(42)).unwrap();
        assert_eq!(a.propose(&[], 16), b.propose(&[], 16));

        // An explicit params seed wins over the campaign seed.
        let mut seeded = params;
        seeded["seed"] = json!(42);
        let cfg_seeded = StrategyConfig::new(StrategyKind::Random, seeded);
        let mut c = create_strategy(&cfg_seeded, Some(7)).unwrap();
        let mut d = create_strategy(&cfg, Some(42)).unwrap();
        assert_eq!(c.propose(&[], 16), d.propose(&[], 16));
    }

    #[test]
    fn config_parses_from_json() {
        let cfg: StrategyConfig =
            serde_json::from_value(json!({"name": "random", "params": {"seed": 1}})).unwrap();
        assert_eq!(cfg.kind().unwrap(), StrategyKind::Random);
    }
}
