#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};

use bytes::{Bytes, BytesMut};
use glitchrig_campaign::ControllerConfig;
use glitchrig_frame::{decode_stream, encode_frame, MessageType};
use glitchrig_transport::{Result, Transport, TransportError};
use serde_json::{json, Value};

/// Scripted rig: answers every frame it is sent, synchronously.
///
/// Commands are ACKed unless scripted otherwise, READ_STATUS returns the
/// configured status object, PING gets PONG.
#[derive(Debug)]
pub struct SimRig {
    open: bool,
    pub opened: usize,
    pub closed: usize,
    rx: BytesMut,
    inbound: BytesMut,
    status: Value,
    status_script: VecDeque<Option<Value>>,
    status_after_fire: Option<Value>,
    nacks: HashSet<(u64, MessageType)>,
    silent: HashSet<MessageType>,
    configs_seen: u64,
    pub received: Vec<MessageType>,
    pub attack_payloads: Vec<Value>,
    pub arm_payloads: Vec<Value>,
}

impl SimRig {
    /// A rig whose status always reports a cleared trigger.
    pub fn new() -> Self {
        Self {
            open: false,
            opened: 0,
            closed: 0,
            rx: BytesMut::new(),
            inbound: BytesMut::new(),
            status: json!({"trigger_seen": true, "trigger_cleared": true}),
            status_script: VecDeque::new(),
            status_after_fire: None,
            nacks: HashSet::new(),
            silent: HashSet::new(),
            configs_seen: 0,
            received: Vec::new(),
            attack_payloads: Vec::new(),
            arm_payloads: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Value) -> Self {
        self.status = status;
        self
    }

    /// Answer the next READ_STATUS requests from `script`, in order; `None`
    /// drops that request. Afterwards the rig falls back to its usual reply.
    pub fn with_status_script(mut self, script: impl IntoIterator<Item = Option<Value>>) -> Self {
        self.status_script = script.into_iter().collect();
        self
    }

    /// Switch the status reply once FIRE arrives.
    pub fn with_status_after_fire(mut self, status: Value) -> Self {
        self.status_after_fire = Some(status);
        self
    }

    /// NACK `command` during the `trial`-th trial (1-based, counted by
    /// ATTACK_CONFIG frames).
    pub fn nack(mut self, trial: u64, command: MessageType) -> Self {
        self.nacks.insert((trial, command));
        self
    }

    /// Never answer `command`.
    pub fn silent_on(mut self, command: MessageType) -> Self {
        self.silent.insert(command);
        self
    }

    pub fn count(&self, command: MessageType) -> usize {
        self.received.iter().filter(|&&m| m == command).count()
    }

    fn reply(&mut self, msg_type: MessageType, payload: &[u8]) {
        // Status and payloads in these tests always fit a frame.
        let _ = encode_frame(msg_type, payload, &mut self.inbound);
    }

    fn handle(&mut self, msg_type: MessageType, payload: &[u8]) {
        self.received.push(msg_type);

        let trial = match msg_type {
            MessageType::AttackConfig => {
                self.configs_seen += 1;
                if let Ok(value) = serde_json::from_slice(payload) {
                    self.attack_payloads.push(value);
                }
                self.configs_seen
            }
            MessageType::SoftReset | MessageType::HardReset => self.configs_seen + 1,
            _ => self.configs_seen,
        };
        if msg_type == MessageType::ArmTrigger {
            if let Ok(value) = serde_json::from_slice(payload) {
                self.arm_payloads.push(value);
            }
        }

        if msg_type == MessageType::Fire {
            if let Some(status) = self.status_after_fire.take() {
                self.status = status;
            }
        }
        if msg_type == MessageType::ReadStatus {
            if let Some(next) = self.status_script.pop_front() {
                if let Some(status) = next {
                    let body = status.to_string();
                    self.reply(MessageType::ReadStatus, body.as_bytes());
                }
                return;
            }
        }

        if self.silent.contains(&msg_type) {
            return;
        }
        match msg_type {
            MessageType::ReadStatus => {
                let body = self.status.to_string();
                self.reply(MessageType::ReadStatus, body.as_bytes());
            }
            MessageType::Ping => self.reply(MessageType::Pong, b""),
            MessageType::CapabilityQuery => {
                self.reply(MessageType::CapabilityQuery, br#"{"modes":["CLOCK_GLITCH"]}"#)
            }
            command @ (MessageType::AttackConfig
            | MessageType::ArmTrigger
            | MessageType::Fire
            | MessageType::SoftReset
            | MessageType::HardReset) => {
                if self.nacks.contains(&(trial, command)) {
                    self.reply(MessageType::Nack, b"");
                } else {
                    self.reply(MessageType::Ack, b"");
                }
            }
            _ => {}
        }
    }
}

impl Transport for SimRig {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        self.opened += 1;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.rx.extend_from_slice(bytes);
        for frame in decode_stream(&mut self.rx) {
            self.handle(frame.msg_type, &frame.payload);
        }
        Ok(())
    }

    fn read_available(&mut self) -> Result<Bytes> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        Ok(self.inbound.split().freeze())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.closed += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn transport_name(&self) -> &'static str {
        "sim"
    }
}

/// Controller timings short enough for tests.
pub fn fast_controller() -> ControllerConfig {
    ControllerConfig {
        ack_timeout_ms: 20,
        status_timeout_ms: 20,
        poll_interval_ms: 1,
        trigger_poll_interval_ms: 1,
        observation_window_ms: 0,
    }
}
