//! Byte-stream transport abstraction for the glitch rig.
//!
//! The rig controller talks to its microcontroller over a plain byte
//! stream. This crate provides the narrow interface the upper layers need:
//! - [`Transport`]: open/close plus non-blocking `read_available`
//! - [`SerialTransport`]: a UART link (behind the `serial` feature)
//! - [`MemoryTransport`]: in-memory queues for tests and dry runs
//!
//! This is the lowest layer of glitchrig. Framing lives one level up.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::Transport;

#[cfg(feature = "serial")]
pub use serial::{available_ports, SerialConfig, SerialTransport};
