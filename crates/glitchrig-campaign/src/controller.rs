//! Per-trial state machine.
//!
//! `Idle → Reset → Configure → Arm → AwaitTrigger → Fire → Observe →
//! Classified`, or `Errored` from any non-terminal state. A trial never
//! returns an error: every failure inside it becomes [`Outcome::Error`].

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use glitchrig_frame::{decode_json_object, FrameError, FrameLink, MessageType};
use glitchrig_transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use crate::model::{flag, AttackSpec, Observation, Outcome, ResetPolicy, Trial, TriggerSpec};
use crate::observe::Classifier;
use crate::poll::wait_for;

/// Timing knobs for the trial controller. All values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How long to wait for ACK/NACK after a command.
    pub ack_timeout_ms: u64,
    /// How long to wait for a status reply.
    pub status_timeout_ms: u64,
    /// Sleep between transport reads inside a wait.
    pub poll_interval_ms: u64,
    /// Sleep between status requests while waiting for the trigger.
    pub trigger_poll_interval_ms: u64,
    /// Pause after FIRE before the final status read.
    pub observation_window_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 1000,
            status_timeout_ms: 500,
            poll_interval_ms: 10,
            trigger_poll_interval_ms: 20,
            observation_window_ms: 50,
        }
    }
}

impl ControllerConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn trigger_poll_interval(&self) -> Duration {
        Duration::from_millis(self.trigger_poll_interval_ms)
    }

    pub fn observation_window(&self) -> Duration {
        Duration::from_millis(self.observation_window_ms)
    }
}

/// States a trial passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialState {
    Idle,
    Reset,
    Configure,
    Arm,
    AwaitTrigger,
    Fire,
    Observe,
    Classified,
    Errored,
}

impl TrialState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reset => "reset",
            Self::Configure => "configure",
            Self::Arm => "arm",
            Self::AwaitTrigger => "await_trigger",
            Self::Fire => "fire",
            Self::Observe => "observe",
            Self::Classified => "classified",
            Self::Errored => "errored",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Classified | Self::Errored)
    }
}

impl fmt::Display for TrialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures that abort a single trial.
#[derive(Debug, thiserror::Error)]
enum TrialError {
    #[error("rig rejected {command} with NACK")]
    Nack { command: MessageType },

    #[error("cannot encode {command}: {source}")]
    Encode {
        command: MessageType,
        source: FrameError,
    },
}

/// Drives one trial at a time over a framed link.
pub struct TrialController {
    config: ControllerConfig,
    reset_policy: ResetPolicy,
    classifier: Box<dyn Classifier>,
}

impl TrialController {
    pub fn new(
        config: ControllerConfig,
        reset_policy: ResetPolicy,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            config,
            reset_policy,
            classifier,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    /// Run one trial to completion. The returned trial is always complete.
    pub fn run_trial<T: Transport>(
        &self,
        link: &mut FrameLink<T>,
        id: u64,
        attack: AttackSpec,
        trigger: TriggerSpec,
    ) -> Trial {
        let trial = Trial::new(id, attack, trigger);
        link.discard_pending();

        let mut state = TrialState::Idle;
        let (observation, outcome) = match self.drive(link, &trial, &mut state) {
            Ok(observation) => {
                let outcome = self.classifier.classify(&observation);
                enter(id, &mut state, TrialState::Classified);
                (observation, outcome)
            }
            Err(err) => {
                warn!(trial_id = id, state = %state, error = %err, "trial aborted");
                let notes = format!("{state}: {err}");
                enter(id, &mut state, TrialState::Errored);
                (Observation::failed(notes), Outcome::Error)
            }
        };

        info!(
            trial_id = id,
            tg_ns = attack.width_ns,
            delay_ns = attack.delay_ns,
            outcome = %outcome,
            trigger_seen = observation.trigger_seen,
            "trial complete"
        );
        trial.complete(observation, outcome)
    }

    fn drive<T: Transport>(
        &self,
        link: &mut FrameLink<T>,
        trial: &Trial,
        state: &mut TrialState,
    ) -> Result<Observation, TrialError> {
        let id = trial.id();

        let reset = match self.reset_policy {
            ResetPolicy::Soft => Some(MessageType::SoftReset),
            ResetPolicy::Hard => Some(MessageType::HardReset),
            ResetPolicy::None => None,
        };
        if let Some(command) = reset {
            enter(id, state, TrialState::Reset);
            self.command(link, command, &[])?;
        }

        enter(id, state, TrialState::Configure);
        self.command_json(link, MessageType::AttackConfig, trial.attack())?;

        enter(id, state, TrialState::Arm);
        self.command_json(link, MessageType::ArmTrigger, trial.trigger())?;

        enter(id, state, TrialState::AwaitTrigger);
        let seen = self.await_trigger(link, trial.trigger());
        if !seen {
            debug!(trial_id = id, "trigger not seen before timeout");
        }

        enter(id, state, TrialState::Fire);
        self.command(link, MessageType::Fire, &[])?;
        thread::sleep(self.config.observation_window());

        enter(id, state, TrialState::Observe);
        let status = self
            .read_status(link, self.config.status_timeout())
            .unwrap_or_default();
        Ok(Observation::from_status(status, seen))
    }

    fn command_json<T: Transport, B: Serialize>(
        &self,
        link: &mut FrameLink<T>,
        command: MessageType,
        body: &B,
    ) -> Result<(), TrialError> {
        let sent = link.send_json(command, body);
        self.await_ack(link, command, sent)
    }

    fn command<T: Transport>(
        &self,
        link: &mut FrameLink<T>,
        command: MessageType,
        payload: &[u8],
    ) -> Result<(), TrialError> {
        let sent = link.send(command, payload);
        self.await_ack(link, command, sent)
    }

    /// Wait for the ACK of a command that was just sent.
    ///
    /// NACK aborts the trial. No answer, or a failed write, lets the trial
    /// proceed.
    fn await_ack<T: Transport>(
        &self,
        link: &mut FrameLink<T>,
        command: MessageType,
        sent: Result<(), FrameError>,
    ) -> Result<(), TrialError> {
        match sent {
            Ok(()) => {}
            Err(FrameError::Transport(err)) => {
                warn!(%command, error = %err, "write failed; proceeding as if unacknowledged");
                return Ok(());
            }
            Err(source) => return Err(TrialError::Encode { command, source }),
        }

        let reply = wait_for(
            link,
            self.config.ack_timeout(),
            self.config.poll_interval(),
            |frame| match frame.msg_type {
                MessageType::Ack => Some(true),
                MessageType::Nack => Some(false),
                _ => None,
            },
        );
        match reply {
            Some(true) => {
                trace!(%command, "ack");
                Ok(())
            }
            Some(false) => {
                warn!(%command, "nack");
                Err(TrialError::Nack { command })
            }
            None => {
                warn!(
                    %command,
                    timeout_ms = self.config.ack_timeout_ms,
                    "no ack before timeout; proceeding"
                );
                Ok(())
            }
        }
    }

    /// Poll status until the rig reports the trigger or its timeout runs out.
    fn await_trigger<T: Transport>(&self, link: &mut FrameLink<T>, trigger: &TriggerSpec) -> bool {
        let deadline = Instant::now() + Duration::from_millis(trigger.timeout_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let wait = self.config.status_timeout().min(remaining);
            if let Some(status) = self.read_status(link, wait) {
                if flag(&status, "trigger_seen") {
                    return true;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(self.config.trigger_poll_interval().min(deadline - now));
        }
    }

    /// Request status and return the first non-empty JSON object reply.
    fn read_status<T: Transport>(
        &self,
        link: &mut FrameLink<T>,
        timeout: Duration,
    ) -> Option<Map<String, Value>> {
        if let Err(err) = link.send(MessageType::ReadStatus, &[]) {
            debug!(error = %err, "status request failed");
            return None;
        }
        wait_for(link, timeout, self.config.poll_interval(), |frame| {
            decode_json_object(&frame.payload).filter(|status| !status.is_empty())
        })
    }
}

impl fmt::Debug for TrialController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrialController")
            .field("config", &self.config)
            .field("reset_policy", &self.reset_policy)
            .finish_non_exhaustive()
    }
}

fn enter(trial_id: u64, state: &mut TrialState, next: TrialState) {
    debug!(trial_id, from = %state, to = %next, "trial state");
    *state = next;
}
