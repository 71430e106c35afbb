use crate::observe::ClassifierKind;
use crate::strategy::StrategyKind;

/// Errors raised while building a search strategy.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// The configured strategy name is not known at all.
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    /// The strategy is declared but has no implementation yet.
    #[error("strategy '{0}' is not implemented")]
    Unsupported(StrategyKind),

    /// The strategy parameters are malformed or out of range.
    #[error("invalid parameters for strategy '{strategy}': {reason}")]
    InvalidParams {
        strategy: StrategyKind,
        reason: String,
    },
}

/// Errors that can occur while setting up or running a campaign.
///
/// Per-trial failures never show up here; the trial controller maps them to
/// [`Outcome::Error`](crate::model::Outcome::Error).
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    /// Transport-level error outside a trial (open, probe).
    #[error("transport error: {0}")]
    Transport(#[from] glitchrig_transport::TransportError),

    /// Frame-level error outside a trial.
    #[error("frame error: {0}")]
    Frame(#[from] glitchrig_frame::FrameError),

    /// Strategy construction failed.
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// The classifier is declared but has no implementation yet.
    #[error("classifier '{0}' is not implemented")]
    UnsupportedClassifier(ClassifierKind),

    /// Campaign configuration is invalid.
    #[error("invalid campaign config: {0}")]
    InvalidConfig(String),

    /// The event journal could not be written or read.
    #[error("journal error: {0}")]
    Journal(std::io::Error),

    /// A journal line is not a valid trial record.
    #[error("invalid journal record on line {line}: {source}")]
    InvalidRecord {
        line: usize,
        source: serde_json::Error,
    },

    /// The rig did not answer in time.
    #[error("no response after {0:?}")]
    Timeout(std::time::Duration),
}

impl CampaignError {
    /// Returns true when the error names a declared-but-unimplemented capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            CampaignError::UnsupportedClassifier(_)
                | CampaignError::Strategy(StrategyError::Unsupported(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, CampaignError>;
