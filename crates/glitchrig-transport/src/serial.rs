use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM5`.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read/write timeout applied to the driver.
    pub timeout: Duration,
}

impl SerialConfig {
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Settings for `port` with the default baud rate and timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// UART transport backed by the `serialport` crate.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a closed serial transport.
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// The configured settings.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                port: self.config.port.clone(),
                reason: e.to_string(),
            })?;
        // Drop boot banners and stale replies from a previous session.
        port.clear(ClearBuffer::All)?;
        info!(
            port = %self.config.port,
            baud = self.config.baud_rate,
            "serial port opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        let mut offset = 0usize;
        while offset < bytes.len() {
            match port.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        port.flush()?;
        Ok(())
    }

    fn read_available(&mut self) -> Result<Bytes> {
        let port = self.port_mut()?;
        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0u8; available];
        let read = match port.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::TimedOut => 0,
            Err(err) => return Err(TransportError::Io(err)),
        };
        buf.truncate(read);
        Ok(Bytes::from(buf))
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!(port = %self.config.port, "serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("config", &self.config)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// Names of the serial ports visible on this host.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.timeout, Duration::from_millis(500));
    }

    #[test]
    fn closed_port_rejects_io() {
        let mut t = SerialTransport::new(SerialConfig::new("/dev/null-glitchrig"));
        assert!(!t.is_open());
        assert!(matches!(t.write(b"x"), Err(TransportError::NotOpen)));
        assert!(matches!(t.read_available(), Err(TransportError::NotOpen)));
        t.close().unwrap();
    }

    #[test]
    fn open_missing_port_reports_name() {
        let mut t = SerialTransport::new(SerialConfig::new("/dev/does-not-exist-glitchrig"));
        let err = t.open().unwrap_err();
        assert!(
            matches!(err, TransportError::Open { ref port, .. } if port == "/dev/does-not-exist-glitchrig")
        );
    }
}
