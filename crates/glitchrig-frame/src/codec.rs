use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::message::MessageType;

/// Start-of-frame marker.
pub const SOF: u8 = 0x7E;

/// Frame header: SOF (1) + type (1) + length (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Trailing CRC-32: 4 bytes, little-endian.
pub const CRC_SIZE: usize = 4;

/// Largest payload the 1-byte length field can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message type.
    pub msg_type: MessageType,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(msg_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload + CRC).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CRC_SIZE
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬──────┬──────┬──────────────┬──────────────┐
/// │ SOF  │ Type │ Len  │ Payload      │ CRC-32 (4B)  │
/// │ 0x7E │ (1B) │ (1B) │ (Len bytes)  │ LE, over     │
/// │      │      │      │              │ Type|Len|Pay │
/// └──────┴──────┴──────┴──────────────┴──────────────┘
/// ```
pub fn encode_frame(msg_type: MessageType, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_raw(msg_type.code(), payload, dst)
}

/// Encode a frame with an arbitrary type code.
///
/// The rig may emit codes this side does not know; this lets tests and
/// diagnostics produce them too.
pub fn encode_raw(code: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let start = dst.len();
    dst.reserve(HEADER_SIZE + payload.len() + CRC_SIZE);
    dst.put_u8(SOF);
    dst.put_u8(code);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    let crc = crc32fast::hash(&dst[start + 1..]);
    dst.put_u32_le(crc);
    Ok(())
}

/// Encode a single frame into a fresh buffer.
pub fn encode(msg_type: MessageType, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    encode_frame(msg_type, payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode every complete frame from a standing input buffer.
///
/// `src` accumulates raw bytes across calls. Bytes before the first SOF are
/// discarded, CRC failures and unknown type codes are dropped silently, and
/// an incomplete trailing frame is left in `src` for the next call.
pub fn decode_stream(src: &mut BytesMut) -> Vec<Frame> {
    let mut frames = Vec::new();

    loop {
        let Some(start) = src.iter().position(|&b| b == SOF) else {
            if !src.is_empty() {
                trace!(discarded = src.len(), "no start-of-frame in buffer");
            }
            src.clear();
            break;
        };

        if start > 0 {
            trace!(discarded = start, "resynchronizing on start-of-frame");
            src.advance(start);
        }

        if src.len() < HEADER_SIZE {
            break; // Need more data
        }

        let code = src[1];
        let len = src[2] as usize;
        let frame_size = HEADER_SIZE + len + CRC_SIZE;
        if src.len() < frame_size {
            break; // Need more data
        }

        let raw = src.split_to(frame_size).freeze();
        let expected = (&raw[HEADER_SIZE + len..]).get_u32_le();
        let actual = crc32fast::hash(&raw[1..HEADER_SIZE + len]);
        if expected != actual {
            trace!(code, len, expected, actual, "dropping frame with bad crc");
            continue;
        }

        match MessageType::from_code(code) {
            Some(msg_type) => frames.push(Frame {
                msg_type,
                payload: raw.slice(HEADER_SIZE..HEADER_SIZE + len),
            }),
            None => trace!(code, "dropping frame with unknown type"),
        }
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(msg_type: MessageType, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(msg_type, payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn crc_is_standard_crc32() {
        assert_eq!(crc32fast::hash(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn encode_layout() {
        let buf = wire(MessageType::Fire, b"ab");
        assert_eq!(&buf[..5], &[SOF, 0x03, 0x02, b'a', b'b']);
        let crc = crc32fast::hash(&[0x03, 0x02, b'a', b'b']);
        assert_eq!(&buf[5..], &crc.to_le_bytes());
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let mut buf = BytesMut::new();
        let err = encode_frame(MessageType::AttackConfig, &[0u8; 256], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge {
                size: 256,
                max: 255
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn roundtrip_every_type_and_boundary_length() {
        for msg_type in MessageType::ALL {
            for len in [0usize, 1, 254, 255] {
                let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
                let mut buf = wire(msg_type, &payload);
                let frames = decode_stream(&mut buf);
                assert_eq!(frames, vec![Frame::new(msg_type, payload.clone())]);
                assert!(buf.is_empty());
            }
        }
    }

    #[test]
    fn payload_containing_sof_roundtrips() {
        let mut buf = wire(MessageType::ReadStatus, &[SOF, SOF, 0x00, SOF]);
        let frames = decode_stream(&mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), &[SOF, SOF, 0x00, SOF]);
    }

    #[test]
    fn garbage_before_frame_is_discarded() {
        let mut buf = BytesMut::from(&b"boot v1.2\r\n\x00\xff"[..]);
        buf.extend_from_slice(&wire(MessageType::Ack, b""));

        let frames = decode_stream(&mut buf);
        assert_eq!(frames, vec![Frame::new(MessageType::Ack, Bytes::new())]);
        assert!(buf.is_empty());
    }

    #[test]
    fn buffer_without_sof_is_cleared() {
        let mut buf = BytesMut::from(&b"no marker here"[..]);
        assert!(decode_stream(&mut buf).is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_is_kept_for_next_call() {
        let full = wire(MessageType::ReadStatus, br#"{"trigger_seen":true}"#);
        for k in 1..full.len() {
            let mut buf = BytesMut::from(&full[..k]);
            assert!(decode_stream(&mut buf).is_empty(), "prefix {k}");
            assert_eq!(buf.as_ref(), &full[..k], "prefix {k} must stay intact");

            buf.extend_from_slice(&full[k..]);
            let frames = decode_stream(&mut buf);
            assert_eq!(frames.len(), 1, "prefix {k}");
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn single_bit_flip_drops_only_that_frame() {
        let before = wire(MessageType::Ack, b"");
        let target = wire(MessageType::AttackConfig, b"{\"tg_ns\":64}");
        let after = wire(MessageType::Pong, b"");

        // Flip each bit of the payload and CRC of the middle frame.
        for byte in HEADER_SIZE..target.len() {
            for bit in 0..8 {
                let mut corrupted = target.clone();
                corrupted[byte] ^= 1 << bit;

                let mut buf = BytesMut::new();
                buf.extend_from_slice(&before);
                buf.extend_from_slice(&corrupted);
                buf.extend_from_slice(&after);

                let frames = decode_stream(&mut buf);
                let types: Vec<_> = frames.iter().map(|f| f.msg_type).collect();
                assert_eq!(
                    types,
                    vec![MessageType::Ack, MessageType::Pong],
                    "byte {byte} bit {bit}"
                );
                assert!(buf.is_empty());
            }
        }
    }

    #[test]
    fn unknown_type_is_dropped_silently() {
        let mut buf = BytesMut::new();
        encode_raw(0x7F, b"??", &mut buf).unwrap();
        buf.extend_from_slice(&wire(MessageType::Nack, b""));

        let frames = decode_stream(&mut buf);
        assert_eq!(frames, vec![Frame::new(MessageType::Nack, Bytes::new())]);
    }

    #[test]
    fn multiple_frames_in_one_call() {
        let mut buf = wire(MessageType::Ack, b"");
        buf.extend_from_slice(&wire(MessageType::ReadStatus, b"{}"));
        buf.extend_from_slice(&wire(MessageType::Pong, b""));

        let frames = decode_stream(&mut buf);
        let types: Vec<_> = frames.iter().map(|f| f.msg_type).collect();
        assert_eq!(
            types,
            vec![MessageType::Ack, MessageType::ReadStatus, MessageType::Pong]
        );
    }

    #[test]
    fn frame_wire_size() {
        let frame = Frame::new(MessageType::Fire, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4 + CRC_SIZE);
        assert_eq!(encode(MessageType::Fire, b"test").unwrap().len(), frame.wire_size());
    }
}
