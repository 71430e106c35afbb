use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use glitchrig_campaign::{CampaignReport, Outcome, OutcomeSummary};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_report(report: &CampaignReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            println!(
                "{}: {} trials ({})",
                report.run_name, report.trials_run, report.stop_reason
            );
            println!("{}", summary_table(&report.summary));
        }
        OutputFormat::Pretty => {
            println!(
                "run={} trials={} stop={}",
                report.run_name, report.trials_run, report.stop_reason
            );
            print_summary_lines(&report.summary);
        }
    }
}

pub fn print_summary(summary: &OutcomeSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => println!("{}", summary_table(summary)),
        OutputFormat::Pretty => print_summary_lines(summary),
    }
}

fn summary_table(summary: &OutcomeSummary) -> Table {
    let mut header = vec!["TG_NS".to_string(), "DELAY_NS".to_string()];
    header.extend(Outcome::ALL.iter().map(|o| o.as_str().to_uppercase()));
    header.push("TOTAL".to_string());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for cell in &summary.cells {
        let mut row = vec![cell.tg_ns.to_string(), cell.delay_ns.to_string()];
        row.extend(Outcome::ALL.iter().map(|&o| cell.counts.get(o).to_string()));
        row.push(cell.counts.total().to_string());
        table.add_row(row);
    }

    let mut total = vec!["all".to_string(), String::new()];
    total.extend(Outcome::ALL.iter().map(|&o| summary.counts.get(o).to_string()));
    total.push(summary.total().to_string());
    table.add_row(total);
    table
}

fn print_summary_lines(summary: &OutcomeSummary) {
    let counts = Outcome::ALL
        .iter()
        .map(|&o| format!("{}={}", o, summary.counts.get(o)))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "total={} {} success_rate={:.3}",
        summary.total(),
        counts,
        summary.success_rate
    );
}

pub fn print_list(header: &str, items: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&items),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![header]);
            for item in items {
                table.add_row(vec![item.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for item in items {
                println!("{item}");
            }
        }
    }
}
