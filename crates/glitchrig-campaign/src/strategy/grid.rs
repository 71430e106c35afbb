use super::{SearchParams, Strategy, StrategyKind};
use crate::error::StrategyError;
use crate::model::{AttackSpec, Trial};

/// Largest grid a single campaign may materialize.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Exhaustive sweep over widths × delays.
///
/// The full point list is built once, in order width → delay → repeat, and
/// handed out front to back. Points are never revisited.
#[derive(Debug, Clone)]
pub struct GridSearch {
    points: Vec<AttackSpec>,
    cursor: usize,
}

impl GridSearch {
    pub fn new(params: &SearchParams) -> Result<Self, StrategyError> {
        let range = params.delay_ns;
        if range.step == 0 {
            return Err(StrategyError::InvalidParams {
                strategy: StrategyKind::Grid,
                reason: "delay_ns.step must be greater than zero".to_string(),
            });
        }

        let delay_count = match range.stop.checked_sub(range.start) {
            Some(span) if span > 0 => (span - 1) as usize / range.step as usize + 1,
            _ => 0,
        };
        let total = params
            .tg_ns
            .len()
            .checked_mul(delay_count)
            .and_then(|n| n.checked_mul(params.repeats_per_point as usize))
            .filter(|&n| n <= MAX_GRID_POINTS)
            .ok_or_else(|| StrategyError::InvalidParams {
                strategy: StrategyKind::Grid,
                reason: format!("grid exceeds {MAX_GRID_POINTS} points"),
            })?;

        let delays: Vec<u32> = (range.start..range.stop)
            .step_by(range.step as usize)
            .collect();
        let mut points = Vec::with_capacity(total);
        for &width in &params.tg_ns {
            for &delay in &delays {
                for _ in 0..params.repeats_per_point {
                    points.push(AttackSpec::clock(width, delay));
                }
            }
        }

        Ok(Self { points, cursor: 0 })
    }

    /// Total number of points in the grid.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points not yet handed out.
    pub fn remaining(&self) -> usize {
        self.points.len() - self.cursor
    }
}

impl Strategy for GridSearch {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn propose(&mut self, _history: &[Trial], n: usize) -> Vec<AttackSpec> {
        let end = self.cursor.saturating_add(n).min(self.points.len());
        let batch = self.points[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }
}
