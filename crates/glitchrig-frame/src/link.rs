use bytes::BytesMut;
use glitchrig_transport::Transport;
use serde::Serialize;
use tracing::trace;

use crate::codec::{decode_stream, encode_frame, Frame};
use crate::error::Result;
use crate::message::MessageType;
use crate::payload::encode_json;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Framed, non-blocking message I/O over a [`Transport`].
///
/// Owns the transport and the decoder's standing input buffer. `poll` never
/// blocks; callers bound their own waits.
pub struct FrameLink<T> {
    inner: T,
    rx: BytesMut,
    tx: BytesMut,
}

impl<T: Transport> FrameLink<T> {
    /// Wrap a transport.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rx: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            tx: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and write one frame.
    pub fn send(&mut self, msg_type: MessageType, payload: &[u8]) -> Result<()> {
        self.tx.clear();
        encode_frame(msg_type, payload, &mut self.tx)?;
        trace!(%msg_type, len = payload.len(), "sending frame");
        self.inner.write(&self.tx)?;
        Ok(())
    }

    /// Serialize `body` as JSON and send it as one frame.
    pub fn send_json<B: Serialize + ?Sized>(&mut self, msg_type: MessageType, body: &B) -> Result<()> {
        let payload = encode_json(body)?;
        self.send(msg_type, &payload)
    }

    /// Read whatever the transport has and return every frame completed by it.
    pub fn poll(&mut self) -> Result<Vec<Frame>> {
        let chunk = self.inner.read_available()?;
        if !chunk.is_empty() {
            self.rx.extend_from_slice(&chunk);
        }
        if self.rx.is_empty() {
            return Ok(Vec::new());
        }
        Ok(decode_stream(&mut self.rx))
    }

    /// Drop any partially received bytes.
    pub fn discard_pending(&mut self) {
        if !self.rx.is_empty() {
            trace!(discarded = self.rx.len(), "discarding pending input");
        }
        self.rx.clear();
    }

    /// Bytes received but not yet forming a complete frame.
    pub fn pending_len(&self) -> usize {
        self.rx.len()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the link and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> std::fmt::Debug for FrameLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLink")
            .field("pending", &self.rx.len())
            .finish()
    }
}
