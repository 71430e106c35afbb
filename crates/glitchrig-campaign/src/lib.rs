//! Campaign orchestration for the glitch rig.
//!
//! This is the layer that turns a framed serial link into experiments:
//! - [`strategy`] decides which attack configuration to try next
//! - [`controller`] drives one trial through reset, configure, arm, fire
//!   and observe, absorbing every per-trial failure
//! - [`observe`] classifies what the rig reported
//! - [`campaign`] repeats trials until the budget or the search space runs out

pub mod campaign;
pub mod controller;
pub mod error;
pub mod journal;
pub mod model;
pub mod observe;
pub mod poll;
pub mod probe;
pub mod strategy;
pub mod summary;

pub use campaign::{Campaign, CampaignReport, StopReason};
pub use controller::{ControllerConfig, TrialController, TrialState};
pub use error::{CampaignError, Result, StrategyError};
pub use journal::{read_journal, EventSink, JsonlJournal, TrialRecord, TRIAL_COMPLETE};
pub use model::{
    AttackMode, AttackSpec, CampaignConfig, ClockImpl, Edge, LedState, Observation, Outcome,
    PowerGlitch, PowerGlitchKind, ResetPolicy, Trial, TriggerKind, TriggerSpec,
};
pub use observe::{build_classifier, Classifier, ClassifierKind, RuleEvaluator};
pub use strategy::{create_strategy, Strategy, StrategyConfig, StrategyKind};
pub use summary::{CellSummary, OutcomeCounts, OutcomeSummary};
