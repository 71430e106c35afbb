use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{SearchParams, Strategy, StrategyKind};
use crate::error::StrategyError;
use crate::model::{AttackSpec, Trial};

/// Uniform random sampling. Never exhausts.
///
/// Width is drawn from the configured set, delay from `[start, stop]`
/// inclusive. The generator is owned per strategy, so equal seeds give
/// equal proposal sequences.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    widths: Vec<u32>,
    delay_min: u32,
    delay_max: u32,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(params: &SearchParams, rng: ChaCha8Rng) -> Result<Self, StrategyError> {
        if params.tg_ns.is_empty() {
            return Err(StrategyError::InvalidParams {
                strategy: StrategyKind::Random,
                reason: "tg_ns must list at least one width".to_string(),
            });
        }
        let range = params.delay_ns;
        if range.start > range.stop {
            return Err(StrategyError::InvalidParams {
                strategy: StrategyKind::Random,
                reason: format!(
                    "delay_ns.start ({}) is greater than delay_ns.stop ({})",
                    range.start, range.stop
                ),
            });
        }
        Ok(Self {
            widths: params.tg_ns.clone(),
            delay_min: range.start,
            delay_max: range.stop,
            rng,
        })
    }

    fn sample(&mut self) -> AttackSpec {
        let width = self.widths[self.rng.gen_range(0..self.widths.len())];
        let delay = self.rng.gen_range(self.delay_min..=self.delay_max);
        AttackSpec::clock(width, delay)
    }
}

impl Strategy for RandomSearch {
    fn name(&self) -> &'static str {
        "random"
    }

    fn propose(&mut self, _history: &[Trial], n: usize) -> Vec<AttackSpec> {
        (0..n).map(|_| self.sample()).collect()
    }
}
