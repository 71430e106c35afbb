use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-memory transport.
///
/// Bytes queued with [`push_inbound`](Self::push_inbound) are handed out by
/// `read_available`; everything written is collected for
/// [`take_outbound`](Self::take_outbound). Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: BytesMut,
    outbound: BytesMut,
    open: bool,
    /// Cap on bytes returned per `read_available` call (0 = unlimited).
    read_chunk: usize,
}

impl MemoryTransport {
    /// Create a closed, empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how many bytes each `read_available` call returns.
    ///
    /// Lets tests exercise partial-frame handling in the layers above.
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    /// Queue bytes to be returned by subsequent reads.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend_from_slice(bytes);
    }

    /// Drain everything written so far.
    pub fn take_outbound(&mut self) -> Bytes {
        self.outbound.split().freeze()
    }

    /// Number of inbound bytes not yet read.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        trace!(len = bytes.len(), "memory transport write");
        self.outbound.extend_from_slice(bytes);
        Ok(())
    }

    fn read_available(&mut self) -> Result<Bytes> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let n = if self.read_chunk == 0 {
            self.inbound.len()
        } else {
            self.read_chunk.min(self.inbound.len())
        };
        Ok(self.inbound.split_to(n).freeze())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}
