//! Run file for `glitchrig run`.
//!
//! ```json
//! {
//!   "campaign": { "run_name": "stm32-rdp", "max_trials": 500,
//!                 "strategy": { "name": "grid", "params": { "tg_ns": [40, 64] } } },
//!   "controller": { "ack_timeout_ms": 800 },
//!   "serial": { "port": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "journal_path": "runs/stm32-rdp.jsonl"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use glitchrig_campaign::{CampaignConfig, ControllerConfig};
use glitchrig_transport::SerialConfig;
use serde::Deserialize;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, USAGE};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: SerialConfig::DEFAULT_BAUD_RATE,
            timeout_ms: SerialConfig::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SerialSettings {
    /// Resolve into a driver config. A port is required.
    pub fn to_serial_config(&self) -> CliResult<SerialConfig> {
        let port = self.port.clone().ok_or_else(|| {
            CliError::new(USAGE, "no serial port: set serial.port or pass --port")
        })?;
        Ok(SerialConfig {
            port,
            baud_rate: self.baud_rate,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Command-line values that take precedence over the run file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub journal: Option<PathBuf>,
    pub max_trials: Option<u64>,
}

impl RunFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> CliResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid run file: {err}")))
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.serial.port = Some(port);
        }
        if let Some(baud) = overrides.baud {
            self.serial.baud_rate = baud;
        }
        if let Some(journal) = overrides.journal {
            self.journal_path = Some(journal);
        }
        if let Some(max_trials) = overrides.max_trials {
            self.campaign.max_trials = max_trials;
        }
    }
}

#[cfg(test)]
mod tests {
    use glitchrig_campaign::{ResetPolicy, StrategyKind};

    use super::*;

    const MINIMAL: &str = r#"{"campaign": {"run_name": "r", "max_trials": 3}}"#;

    #[test]
    fn minimal_file_uses_defaults() {
        let file = RunFile::parse(MINIMAL).unwrap();
        assert_eq!(file.campaign.max_trials, 3);
        assert_eq!(file.campaign.reset_policy, ResetPolicy::Soft);
        assert_eq!(file.campaign.strategy.kind().unwrap(), StrategyKind::Grid);
        assert_eq!(file.controller, ControllerConfig::default());
        assert_eq!(file.serial, SerialSettings::default());
        assert!(file.journal_path.is_none());
    }

    #[test]
    fn full_file_parses() {
        let file = RunFile::parse(
            r#"{
                "campaign": {
                    "run_name": "stm32",
                    "max_trials": 100,
                    "reset_policy": "hard",
                    "trigger": {"kind": "UART_EVENT", "edge": "falling", "timeout_ms": 50},
                    "strategy": {"name": "random", "params": {"tg_ns": [40], "seed": 7}}
                },
                "controller": {"ack_timeout_ms": 300},
                "serial": {"port": "/dev/ttyACM0", "baud_rate": 921600},
                "journal_path": "out/stm32.jsonl"
            }"#,
        )
        .unwrap();
        assert_eq!(file.campaign.reset_policy, ResetPolicy::Hard);
        assert_eq!(file.campaign.trigger.timeout_ms, 50);
        assert_eq!(file.controller.ack_timeout_ms, 300);
        assert_eq!(file.controller.poll_interval_ms, 10);

        let serial = file.serial.to_serial_config().unwrap();
        assert_eq!(serial.port, "/dev/ttyACM0");
        assert_eq!(serial.baud_rate, 921_600);
        assert_eq!(serial.timeout, Duration::from_millis(500));
    }

    #[test]
    fn flags_override_file() {
        let mut file = RunFile::parse(MINIMAL).unwrap();
        file.apply(Overrides {
            port: Some("COM3".into()),
            baud: Some(57_600),
            journal: Some(PathBuf::from("j.jsonl")),
            max_trials: Some(9),
        });
        assert_eq!(file.serial.port.as_deref(), Some("COM3"));
        assert_eq!(file.serial.baud_rate, 57_600);
        assert_eq!(file.journal_path, Some(PathBuf::from("j.jsonl")));
        assert_eq!(file.campaign.max_trials, 9);
    }

    #[test]
    fn missing_port_is_usage_error() {
        let file = RunFile::parse(MINIMAL).unwrap();
        assert_eq!(file.serial.to_serial_config().unwrap_err().code, USAGE);
    }

    #[test]
    fn malformed_file_is_data_invalid() {
        assert_eq!(RunFile::parse("{").unwrap_err().code, DATA_INVALID);
        assert_eq!(
            RunFile::parse(r#"{"campaign": {"run_name": "r", "max_trials": 1}, "yaml": true}"#)
                .unwrap_err()
                .code,
            DATA_INVALID
        );
    }
}
