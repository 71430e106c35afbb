mod cmd;
mod config;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "glitchrig", version, about = "Glitch rig campaign controller")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "glitchrig",
            "run",
            "--config",
            "campaign.json",
            "--port",
            "/dev/ttyUSB0",
            "--max-trials",
            "25",
        ])
        .expect("run args should parse");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.port.as_deref(), Some("/dev/ttyUSB0"));
                assert_eq!(args.max_trials, Some(25));
                assert!(args.baud.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_config() {
        let err = Cli::try_parse_from(["glitchrig", "run"]).expect_err("missing --config");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_ping_with_timeout() {
        let cli = Cli::try_parse_from(["glitchrig", "ping", "--port", "COM5", "--timeout", "250ms"])
            .expect("ping args should parse");
        assert!(matches!(cli.command, Command::Ping(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "glitchrig",
            "report",
            "--journal",
            "run.jsonl",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse anywhere");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Cli::try_parse_from(["glitchrig", "--format", "yaml", "ports"])
            .expect_err("yaml is not an output format");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
