use bytes::Bytes;

use crate::error::Result;

/// A byte-stream link to the rig.
///
/// Reads never block: `read_available` returns whatever has arrived so far,
/// or an empty buffer. Callers build their own bounded polling on top.
pub trait Transport {
    /// Open the underlying stream. Opening an already open transport is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Write all of `bytes` to the stream.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Return every byte currently buffered by the stream (possibly none).
    fn read_available(&mut self) -> Result<Bytes>;

    /// Close the stream. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether `open()` has succeeded and `close()` has not been called since.
    fn is_open(&self) -> bool;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "transport"
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_available(&mut self) -> Result<Bytes> {
        (**self).read_available()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_available(&mut self) -> Result<Bytes> {
        (**self).read_available()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
