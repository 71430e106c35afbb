//! Message type codes.
//!
//! Codes `0x01..=0x06` are commands sent to the rig, `0x10`/`0x11` are its
//! acknowledgements, `0x2x` is liveness and `0x3x` is diagnostics.

use std::fmt;

/// Closed set of message types understood on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Configure the glitch (JSON attack parameters).
    AttackConfig = 0x01,
    /// Arm the trigger (JSON trigger parameters).
    ArmTrigger = 0x02,
    /// Fire the configured glitch.
    Fire = 0x03,
    /// Request a status report; the rig answers with the same type and a JSON body.
    ReadStatus = 0x04,
    /// Soft-reset the target.
    SoftReset = 0x05,
    /// Power-cycle the target.
    HardReset = 0x06,

    Ack = 0x10,
    Nack = 0x11,

    Ping = 0x20,
    Pong = 0x21,

    /// Ask the rig which attack modes and triggers it supports.
    CapabilityQuery = 0x30,
    TraceDump = 0x31,
}

impl MessageType {
    /// Every known message type, in code order.
    pub const ALL: [MessageType; 12] = [
        MessageType::AttackConfig,
        MessageType::ArmTrigger,
        MessageType::Fire,
        MessageType::ReadStatus,
        MessageType::SoftReset,
        MessageType::HardReset,
        MessageType::Ack,
        MessageType::Nack,
        MessageType::Ping,
        MessageType::Pong,
        MessageType::CapabilityQuery,
        MessageType::TraceDump,
    ];

    /// Look up a wire code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::AttackConfig),
            0x02 => Some(Self::ArmTrigger),
            0x03 => Some(Self::Fire),
            0x04 => Some(Self::ReadStatus),
            0x05 => Some(Self::SoftReset),
            0x06 => Some(Self::HardReset),
            0x10 => Some(Self::Ack),
            0x11 => Some(Self::Nack),
            0x20 => Some(Self::Ping),
            0x21 => Some(Self::Pong),
            0x30 => Some(Self::CapabilityQuery),
            0x31 => Some(Self::TraceDump),
            _ => None,
        }
    }

    /// The wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::AttackConfig => "ATTACK_CONFIG",
            Self::ArmTrigger => "ARM_TRIGGER",
            Self::Fire => "FIRE",
            Self::ReadStatus => "READ_STATUS",
            Self::SoftReset => "SOFT_RESET",
            Self::HardReset => "HARD_RESET",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::CapabilityQuery => "CAPABILITY_QUERY",
            Self::TraceDump => "TRACE_DUMP",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}
