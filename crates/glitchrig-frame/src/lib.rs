//! Framing for the glitch rig serial protocol.
//!
//! Every message on the wire is framed with:
//! - A start-of-frame marker (`0x7E`) for stream resynchronization
//! - A 1-byte message type and a 1-byte payload length
//! - A CRC-32 over type + length + payload, little-endian
//!
//! Decoding never fails: garbage is skipped, corrupted frames are dropped,
//! and partial frames stay buffered until the rest arrives.

pub mod codec;
pub mod error;
pub mod link;
pub mod message;
pub mod payload;

pub use codec::{
    decode_stream, encode, encode_frame, encode_raw, Frame, CRC_SIZE, HEADER_SIZE, MAX_PAYLOAD,
    SOF,
};
pub use error::{FrameError, Result};
pub use link::FrameLink;
pub use message::MessageType;
pub use payload::{decode_json, decode_json_object, encode_json};
