//! The campaign loop.
//!
//! Asks the strategy for batches, runs each attack through the trial
//! controller, records every trial, and stops on budget, exhaustion or
//! cancellation. The transport and the sink belong to the campaign for its
//! whole run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glitchrig_frame::FrameLink;
use glitchrig_transport::Transport;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::controller::{ControllerConfig, TrialController};
use crate::error::{CampaignError, Result};
use crate::journal::{EventSink, TrialRecord};
use crate::model::{CampaignConfig, Trial};
use crate::observe::build_classifier;
use crate::strategy::{create_strategy, Strategy};
use crate::summary::OutcomeSummary;

/// Why a campaign stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    BudgetReached,
    StrategyExhausted,
    Interrupted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BudgetReached => "budget_reached",
            Self::StrategyExhausted => "strategy_exhausted",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a finished campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    pub run_name: String,
    pub trials_run: u64,
    pub stop_reason: StopReason,
    pub summary: OutcomeSummary,
}

/// One campaign over one transport.
pub struct Campaign<T, S> {
    config: CampaignConfig,
    link: FrameLink<T>,
    sink: S,
    strategy: Box<dyn Strategy>,
    controller: TrialController,
    history: Vec<Trial>,
    running: Option<Arc<AtomicBool>>,
}

impl<T: Transport, S: EventSink> Campaign<T, S> {
    /// Validate the config and build its strategy and classifier.
    ///
    /// Every configuration fault surfaces here, before the transport is
    /// touched.
    pub fn new(
        config: CampaignConfig,
        controller_config: ControllerConfig,
        transport: T,
        sink: S,
    ) -> Result<Self> {
        config.validate()?;
        let strategy = create_strategy(&config.strategy, config.seed)?;
        let classifier = build_classifier(config.classifier)?;
        let controller = TrialController::new(controller_config, config.reset_policy, classifier);
        Ok(Self::with_parts(config, transport, sink, strategy, controller))
    }

    /// Assemble a campaign from prebuilt parts.
    pub fn with_parts(
        config: CampaignConfig,
        transport: T,
        sink: S,
        strategy: Box<dyn Strategy>,
        controller: TrialController,
    ) -> Self {
        Self {
            config,
            link: FrameLink::new(transport),
            sink,
            strategy,
            controller,
            history: Vec::new(),
            running: None,
        }
    }

    /// Stop between trials once `running` turns false.
    pub fn with_cancel_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Completed trials, in dispatch order.
    pub fn history(&self) -> &[Trial] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Trial> {
        self.history
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run until the budget is spent, the strategy runs dry, or the cancel
    /// flag drops.
    ///
    /// Only campaign-scoped failures are returned: opening the transport
    /// and writing the journal. The transport is closed and the sink
    /// flushed on every exit path after a successful open.
    pub fn run(&mut self) -> Result<CampaignReport> {
        info!(
            run_name = %self.config.run_name,
            max_trials = self.config.max_trials,
            strategy = self.strategy.name(),
            transport = self.link.get_ref().transport_name(),
            "campaign starting"
        );
        self.link.get_mut().open()?;

        let result = self.run_trials();

        if let Err(err) = self.link.get_mut().close() {
            warn!(error = %err, "closing transport failed");
        }
        let flushed = self.sink.flush();

        let stop_reason = result?;
        flushed.map_err(CampaignError::Journal)?;

        let report = CampaignReport {
            run_name: self.config.run_name.clone(),
            trials_run: self.history.len() as u64,
            stop_reason,
            summary: OutcomeSummary::from_trials(&self.history),
        };
        info!(
            run_name = %report.run_name,
            trials = report.trials_run,
            stop_reason = %report.stop_reason,
            success_rate = report.summary.success_rate,
            "campaign finished"
        );
        Ok(report)
    }

    fn run_trials(&mut self) -> Result<StopReason> {
        let max_trials = self.config.max_trials;
        let batch_size = self.config.batch_size;
        let pause = Duration::from_millis(self.config.safety_pause_ms);

        loop {
            let done = self.history.len() as u64;
            if done >= max_trials {
                return Ok(StopReason::BudgetReached);
            }
            if self.cancelled() {
                return Ok(StopReason::Interrupted);
            }

            let proposals = self.strategy.propose(&self.history, batch_size);
            if proposals.is_empty() {
                debug!("strategy returned no proposals");
                return Ok(StopReason::StrategyExhausted);
            }
            let exhausted = proposals.len() < batch_size;
            let remaining = usize::try_from(max_trials - done).unwrap_or(usize::MAX);

            let batch_start = self.history.len();
            let mut interrupted = false;
            for attack in proposals.into_iter().take(remaining) {
                if self.history.len() > batch_start && self.cancelled() {
                    interrupted = true;
                    break;
                }

                let id = self.history.len() as u64 + 1;
                let trial = self
                    .controller
                    .run_trial(&mut self.link, id, attack, self.config.trigger);
                let record = TrialRecord::from(&trial);
                self.history.push(trial);
                self.sink.append(&record).map_err(CampaignError::Journal)?;

                if !pause.is_zero() {
                    thread::sleep(pause);
                }
            }
            self.strategy.observe(&self.history[batch_start..]);

            if interrupted {
                return Ok(StopReason::Interrupted);
            }
            if self.history.len() as u64 >= max_trials {
                return Ok(StopReason::BudgetReached);
            }
            if exhausted {
                debug!("strategy returned a short batch");
                return Ok(StopReason::StrategyExhausted);
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::SeqCst))
    }
}

impl<T, S> fmt::Debug for Campaign<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Campaign")
            .field("run_name", &self.config.run_name)
            .field("trials", &self.history.len())
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}
