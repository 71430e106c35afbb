//! Controller for a hardware glitch fault-injection rig.
//!
//! glitchrig configures a clock or power glitch on a target, arms a trigger,
//! fires, reads back what happened and repeats over a parameter search.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream link to the rig (serial behind `serial`)
//! - [`frame`]: SOF/CRC-32 framing and message types
//! - [`campaign`]: strategies, the per-trial state machine and the campaign loop

/// Re-export transport types.
pub mod transport {
    pub use glitchrig_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use glitchrig_frame::*;
}

/// Re-export campaign types.
pub mod campaign {
    pub use glitchrig_campaign::*;
}
