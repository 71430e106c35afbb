use serde::Serialize;

use glitchrig_campaign::probe;

use crate::cmd::{open_probe_link, parse_timeout, ProbeArgs, PROBE_POLL_INTERVAL};
use crate::exit::{campaign_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct PingOutput<'a> {
    port: &'a str,
    rtt_ms: f64,
}

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let mut link = open_probe_link(&args)?;

    let rtt = probe::ping(&mut link, timeout, PROBE_POLL_INTERVAL)
        .map_err(|err| campaign_error("ping failed", err))?;

    let out = PingOutput {
        port: &args.port,
        rtt_ms: (rtt.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pong from {} in {:.2}ms", out.port, out.rtt_ms);
        }
    }
    Ok(SUCCESS)
}
