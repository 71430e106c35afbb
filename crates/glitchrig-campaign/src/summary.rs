//! Outcome statistics over a trial history or a journal.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::journal::TrialRecord;
use crate::model::{Outcome, Trial};

/// Count of trials per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub success: u64,
    pub no_effect: u64,
    pub hang: u64,
    pub error: u64,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::NoEffect => self.no_effect += 1,
            Outcome::Hang => self.hang += 1,
            Outcome::Error => self.error += 1,
        }
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Success => self.success,
            Outcome::NoEffect => self.no_effect,
            Outcome::Hang => self.hang,
            Outcome::Error => self.error,
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.no_effect + self.hang + self.error
    }

    /// Fraction of trials that succeeded, 0.0 when there are none.
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.success as f64 / total as f64,
        }
    }
}

/// Outcomes at one (width, delay) point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellSummary {
    pub tg_ns: u32,
    pub delay_ns: u32,
    pub counts: OutcomeCounts,
}

/// Totals plus a per-point breakdown, ordered by width then delay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutcomeSummary {
    pub counts: OutcomeCounts,
    pub success_rate: f64,
    pub cells: Vec<CellSummary>,
}

impl OutcomeSummary {
    /// Summarize completed trials. Incomplete trials are ignored.
    pub fn from_trials(trials: &[Trial]) -> Self {
        Self::collect(trials.iter().filter_map(|t| {
            t.outcome()
                .map(|outcome| (t.attack().width_ns, t.attack().delay_ns, outcome))
        }))
    }

    pub fn from_records(records: &[TrialRecord]) -> Self {
        Self::collect(records.iter().map(|r| (r.tg_ns, r.delay_ns, r.outcome)))
    }

    fn collect(items: impl Iterator<Item = (u32, u32, Outcome)>) -> Self {
        let mut counts = OutcomeCounts::default();
        let mut cells: BTreeMap<(u32, u32), OutcomeCounts> = BTreeMap::new();
        for (tg_ns, delay_ns, outcome) in items {
            counts.record(outcome);
            cells.entry((tg_ns, delay_ns)).or_default().record(outcome);
        }

        Self {
            counts,
            success_rate: counts.success_rate(),
            cells: cells
                .into_iter()
                .map(|((tg_ns, delay_ns), counts)| CellSummary {
                    tg_ns,
                    delay_ns,
                    counts,
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}
