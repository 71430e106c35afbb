//! Data model shared by strategies, the trial controller and the campaign loop.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::observe::ClassifierKind;
use crate::strategy::StrategyConfig;

/// Kind of glitch to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackMode {
    #[default]
    ClockGlitch,
    PowerGlitch,
}

/// How the rig produces a clock glitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockImpl {
    /// Compress one clock period.
    #[default]
    Compress,
    ExtraEdge,
    HfMux,
    PhaseSwap,
}

/// Direction of a concurrent power glitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerGlitchKind {
    Up,
    Down,
}

/// Parameters of a power glitch fired alongside the clock glitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerGlitch {
    #[serde(rename = "power_type")]
    pub kind: PowerGlitchKind,
    /// Supply deviation in millivolts.
    #[serde(rename = "power_dv_mv")]
    pub magnitude_mv: i32,
    #[serde(rename = "power_width_ns")]
    pub width_ns: u32,
    #[serde(rename = "power_delay_ns")]
    pub delay_ns: u32,
}

/// One attack configuration, as proposed by a search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackSpec {
    #[serde(default)]
    pub mode: AttackMode,
    #[serde(default)]
    pub clock_impl: ClockImpl,
    /// Glitch width in nanoseconds.
    #[serde(rename = "tg_ns")]
    pub width_ns: u32,
    /// Delay from trigger to glitch in nanoseconds.
    pub delay_ns: u32,
    /// Concurrent power glitch, absent for clock-only attacks.
    #[serde(flatten)]
    pub power: Option<PowerGlitch>,
}

impl AttackSpec {
    /// A plain compressed-clock glitch.
    pub fn clock(width_ns: u32, delay_ns: u32) -> Self {
        Self {
            mode: AttackMode::ClockGlitch,
            clock_impl: ClockImpl::Compress,
            width_ns,
            delay_ns,
            power: None,
        }
    }
}

/// Trigger source on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    #[default]
    GpioLevel,
    UartEvent,
}

/// Trigger edge polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    Rising,
    Falling,
}

/// Trigger configuration, fixed for a whole campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(default)]
    pub kind: TriggerKind,
    #[serde(default)]
    pub edge: Edge,
    #[serde(default = "default_trigger_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_trigger_timeout_ms() -> u64 {
    200
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            kind: TriggerKind::default(),
            edge: Edge::default(),
            timeout_ms: default_trigger_timeout_ms(),
        }
    }
}

/// LED state reported by the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedState {
    On,
    Off,
    Blink,
}

impl LedState {
    /// Parse the rig's tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            "BLINK" => Some(Self::Blink),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Blink => "BLINK",
        }
    }
}

/// What the rig reported at the end of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Status object exactly as the rig returned it.
    pub raw_status: Map<String, Value>,
    pub trigger_seen: bool,
    pub trigger_cleared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_state: Option<LedState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Observation {
    /// Build an observation from a status object.
    ///
    /// Missing or mistyped fields default to false/absent. `trigger_seen`
    /// holds only when the trigger was seen while waiting for it and the
    /// final status still reports it.
    pub fn from_status(raw_status: Map<String, Value>, seen_while_waiting: bool) -> Self {
        let trigger_seen = seen_while_waiting && flag(&raw_status, "trigger_seen");
        let trigger_cleared = flag(&raw_status, "trigger_cleared");
        let led_state = raw_status
            .get("led_state")
            .and_then(Value::as_str)
            .and_then(LedState::parse);
        let notes = raw_status
            .get("notes")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            raw_status,
            trigger_seen,
            trigger_cleared,
            led_state,
            notes,
        }
    }

    /// Observation for a trial that failed before the rig could report.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut raw_status = Map::new();
        raw_status.insert("error".to_string(), Value::String(reason.clone()));
        Self {
            raw_status,
            trigger_seen: false,
            trigger_cleared: false,
            led_state: None,
            notes: Some(reason),
        }
    }

    /// Whether the raw status carries a hang indicator.
    pub fn hang(&self) -> bool {
        flag(&self.raw_status, "hang")
    }
}

/// Read a boolean status field; anything but `true` counts as false.
pub(crate) fn flag(status: &Map<String, Value>, key: &str) -> bool {
    status.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Classified result of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The glitch had the intended visible effect.
    Success,
    NoEffect,
    /// The target stopped responding.
    Hang,
    /// The rig or protocol failed; says nothing about the glitch.
    Error,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Success,
        Outcome::NoEffect,
        Outcome::Hang,
        Outcome::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoEffect => "no_effect",
            Self::Hang => "hang",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dispatched trial.
///
/// Created with only its id, attack and trigger; observation and outcome are
/// filled in together when the trial completes and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    id: u64,
    attack: AttackSpec,
    trigger: TriggerSpec,
    observation: Option<Observation>,
    outcome: Option<Outcome>,
}

impl Trial {
    /// A trial that has been dispatched but not run.
    pub fn new(id: u64, attack: AttackSpec, trigger: TriggerSpec) -> Self {
        Self {
            id,
            attack,
            trigger,
            observation: None,
            outcome: None,
        }
    }

    pub(crate) fn complete(self, observation: Observation, outcome: Outcome) -> Self {
        Self {
            observation: Some(observation),
            outcome: Some(outcome),
            ..self
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn attack(&self) -> &AttackSpec {
        &self.attack
    }

    pub fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }
}

/// What to reset before every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    #[default]
    Soft,
    Hard,
    None,
}

/// Configuration for a full campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub run_name: String,
    pub max_trials: u64,
    #[serde(default)]
    pub trigger: TriggerSpec,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub reset_policy: ResetPolicy,
    /// Pause between trials, in milliseconds.
    #[serde(default = "default_safety_pause_ms")]
    pub safety_pause_ms: u64,
    /// How many attacks to request from the strategy at once.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fallback seed for randomized strategies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub classifier: ClassifierKind,
}

fn default_safety_pause_ms() -> u64 {
    10
}

fn default_batch_size() -> usize {
    1
}

impl CampaignConfig {
    /// A config with defaults for everything but the name and budget.
    pub fn new(run_name: impl Into<String>, max_trials: u64) -> Self {
        Self {
            run_name: run_name.into(),
            max_trials,
            trigger: TriggerSpec::default(),
            strategy: StrategyConfig::default(),
            reset_policy: ResetPolicy::default(),
            safety_pause_ms: default_safety_pause_ms(),
            batch_size: default_batch_size(),
            seed: None,
            classifier: ClassifierKind::default(),
        }
    }

    /// Reject values no campaign can run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::CampaignError;

        if self.run_name.trim().is_empty() {
            return Err(CampaignError::InvalidConfig(
                "run_name must not be empty".to_string(),
            ));
        }
        if self.max_trials == 0 {
            return Err(CampaignError::InvalidConfig(
                "max_trials must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(CampaignError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("status must be an object"),
        }
    }

    #[test]
    fn observation_defaults_missing_fields() {
        let obs = Observation::from_status(Map::new(), false);
        assert!(!obs.trigger_seen);
        assert!(!obs.trigger_cleared);
        assert_eq!(obs.led_state, None);
        assert_eq!(obs.notes, None);
        assert!(!obs.hang());
    }

    #[test]
    fn observation_reads_status_fields() {
        let obs = Observation::from_status(
            status(json!({
                "trigger_seen": true,
                "trigger_cleared": false,
                "led_state": "BLINK",
                "hang": true,
                "notes": "wdt reset"
            })),
            true,
        );
        assert!(obs.trigger_seen);
        assert!(!obs.trigger_cleared);
        assert_eq!(obs.led_state, Some(LedState::Blink));
        assert!(obs.hang());
        assert_eq!(obs.notes.as_deref(), Some("wdt reset"));
    }

    #[test]
    fn observation_ignores_mistyped_fields() {
        let obs = Observation::from_status(
            status(json!({"trigger_seen": "yes", "led_state": "PURPLE", "hang": 1})),
            false,
        );
        assert!(!obs.trigger_seen);
        assert_eq!(obs.led_state, None);
        assert!(!obs.hang());
    }

    #[test]
    fn trigger_seen_needs_wait_and_final_status() {
        let seen = status(json!({"trigger_seen": true}));
        assert!(Observation::from_status(seen.clone(), true).trigger_seen);
        assert!(!Observation::from_status(seen, false).trigger_seen);
        assert!(!Observation::from_status(status(json!({"trigger_seen": false})), true).trigger_seen);
        assert!(!Observation::from_status(Map::new(), true).trigger_seen);
    }

    #[test]
    fn attack_spec_wire_names() {
        let spec = AttackSpec::clock(64, 250);
        let value = serde_json::to_value(spec).unwrap();
        assert_eq!(
            value,
            json!({"mode": "CLOCK_GLITCH", "clock_impl": "COMPRESS", "tg_ns": 64, "delay_ns": 250})
        );
    }

    #[test]
    fn attack_spec_with_power_glitch_flattens() {
        let spec = AttackSpec {
            power: Some(PowerGlitch {
                kind: PowerGlitchKind::Down,
                magnitude_mv: -300,
                width_ns: 40,
                delay_ns: 10,
            }),
            ..AttackSpec::clock(64, 250)
        };
        let value = serde_json::to_value(spec).unwrap();
        assert_eq!(value["power_type"], json!("DOWN"));
        assert_eq!(value["power_dv_mv"], json!(-300));

        let back: AttackSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn trial_lifecycle() {
        let trial = Trial::new(7, AttackSpec::clock(1, 2), TriggerSpec::default());
        assert!(!trial.is_complete());
        assert!(trial.observation().is_none());

        let done = trial.complete(Observation::failed("boom"), Outcome::Error);
        assert_eq!(done.id(), 7);
        assert_eq!(done.outcome(), Some(Outcome::Error));
        assert_eq!(
            done.observation().and_then(|o| o.notes.as_deref()),
            Some("boom")
        );
    }

    #[test]
    fn campaign_config_defaults_from_json() {
        let cfg: CampaignConfig =
            serde_json::from_value(json!({"run_name": "r1", "max_trials": 5})).unwrap();
        assert_eq!(cfg, CampaignConfig::new("r1", 5));
        assert_eq!(cfg.trigger.timeout_ms, 200);
        assert_eq!(cfg.reset_policy, ResetPolicy::Soft);
        assert_eq!(cfg.safety_pause_ms, 10);
        assert_eq!(cfg.batch_size, 1);
    }

    #[test]
    fn campaign_config_validation() {
        assert!(CampaignConfig::new("ok", 1).validate().is_ok());
        assert!(CampaignConfig::new(" ", 1).validate().is_err());
        assert!(CampaignConfig::new("ok", 0).validate().is_err());

        let mut cfg = CampaignConfig::new("ok", 3);
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
    }
}
