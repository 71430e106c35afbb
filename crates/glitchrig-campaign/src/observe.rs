//! Outcome classification.
//!
//! A [`Classifier`] must be total: every [`Observation`] maps to exactly one
//! [`Outcome`]. The campaign holds it as a boxed capability so alternative
//! classifiers can be swapped in without touching the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CampaignError, Result};
use crate::model::{LedState, Observation, Outcome};

/// Maps a raw observation to an outcome.
pub trait Classifier {
    fn classify(&self, observation: &Observation) -> Outcome;
}

impl<F> Classifier for F
where
    F: Fn(&Observation) -> Outcome,
{
    fn classify(&self, observation: &Observation) -> Outcome {
        self(observation)
    }
}

/// The rule-based evaluator.
///
/// Rules, first match wins:
/// 1. trigger never seen → `Error`
/// 2. trigger cleared or LED on → `Success`
/// 3. status reports a hang → `Hang`
/// 4. otherwise → `NoEffect`
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl Classifier for RuleEvaluator {
    fn classify(&self, observation: &Observation) -> Outcome {
        if !observation.trigger_seen {
            return Outcome::Error;
        }
        if observation.trigger_cleared || observation.led_state == Some(LedState::On) {
            return Outcome::Success;
        }
        if observation.hang() {
            return Outcome::Hang;
        }
        Outcome::NoEffect
    }
}

/// Declared classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Rules,
    /// Probabilistic classifier over richer signal features. Not implemented.
    Ml,
}

impl ClassifierKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Ml => "ml",
        }
    }

    pub const fn is_implemented(self) -> bool {
        matches!(self, Self::Rules)
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the configured classifier.
pub fn build_classifier(kind: ClassifierKind) -> Result<Box<dyn Classifier>> {
    match kind {
        ClassifierKind::Rules => Ok(Box::new(RuleEvaluator)),
        ClassifierKind::Ml => Err(CampaignError::UnsupportedClassifier(kind)),
    }
}
