use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use glitchrig_campaign::probe;
use serde_json::Value;

use crate::cmd::{open_probe_link, parse_timeout, ProbeArgs, PROBE_POLL_INTERVAL};
use crate::exit::{campaign_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let mut link = open_probe_link(&args)?;

    let caps = probe::capabilities(&mut link, timeout, PROBE_POLL_INTERVAL)
        .map_err(|err| campaign_error("capability query failed", err))?;

    match format {
        OutputFormat::Json => print_json(&caps),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CAPABILITY", "VALUE"]);
            for (key, value) in &caps {
                table.add_row(vec![key.clone(), render(value)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (key, value) in &caps {
                println!("{key}={}", render(value));
            }
        }
    }
    Ok(SUCCESS)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
