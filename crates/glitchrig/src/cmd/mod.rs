use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use glitchrig_frame::FrameLink;
use glitchrig_transport::{SerialConfig, SerialTransport, Transport};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod caps;
pub mod ping;
pub mod ports;
pub mod report;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a campaign from a JSON run file.
    Run(RunArgs),
    /// Check that the rig answers PING.
    Ping(ProbeArgs),
    /// Ask the rig for its capabilities.
    Caps(ProbeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Summarize outcomes recorded in a journal.
    Report(ReportArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Ping(args) => ping::run(args, format),
        Command::Caps(args) => caps::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Report(args) => report::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON run file.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: PathBuf,
    /// Serial port (overrides serial.port).
    #[arg(long, env = "GLITCHRIG_PORT")]
    pub port: Option<String>,
    /// Baud rate (overrides serial.baud_rate).
    #[arg(long)]
    pub baud: Option<u32>,
    /// Journal file (overrides journal_path).
    #[arg(long, value_name = "FILE")]
    pub journal: Option<PathBuf>,
    /// Trial budget (overrides campaign.max_trials).
    #[arg(long)]
    pub max_trials: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Serial port the rig is attached to.
    #[arg(long, env = "GLITCHRIG_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = SerialConfig::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Reply timeout (e.g. 2s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON-lines journal written by `run`.
    #[arg(long, short = 'j', value_name = "FILE")]
    pub journal: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Open the probe port and wrap it in a frame link.
fn open_probe_link(args: &ProbeArgs) -> CliResult<FrameLink<SerialTransport>> {
    let mut transport = SerialTransport::new(SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::new(args.port.clone())
    });
    transport
        .open()
        .map_err(|err| transport_error("open failed", err))?;
    Ok(FrameLink::new(transport))
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
