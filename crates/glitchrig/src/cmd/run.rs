use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glitchrig_campaign::{
    build_classifier, create_strategy, Campaign, EventSink, JsonlJournal, StopReason,
    TrialController, TrialRecord,
};
use glitchrig_transport::SerialTransport;
use tracing::info;

use crate::cmd::RunArgs;
use crate::config::{Overrides, RunFile};
use crate::exit::{campaign_error, io_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let mut file = RunFile::load(&args.config)?;
    file.apply(Overrides {
        port: args.port,
        baud: args.baud,
        journal: args.journal,
        max_trials: args.max_trials,
    });

    // Everything that can reject the run file happens before the journal
    // is created on disk.
    let campaign = file.campaign;
    campaign
        .validate()
        .map_err(|err| campaign_error("invalid campaign", err))?;
    let strategy = create_strategy(&campaign.strategy, campaign.seed)
        .map_err(|err| campaign_error("invalid campaign", err.into()))?;
    let classifier =
        build_classifier(campaign.classifier).map_err(|err| campaign_error("invalid campaign", err))?;
    let controller = TrialController::new(file.controller, campaign.reset_policy, classifier);
    let transport = SerialTransport::new(file.serial.to_serial_config()?);

    match file.journal_path {
        Some(path) => {
            let journal = JsonlJournal::open(&path)
                .map_err(|err| io_error(&format!("cannot open journal {}", path.display()), err))?;
            execute(
                Campaign::with_parts(campaign, transport, journal, strategy, controller),
                format,
            )
        }
        None => {
            info!("no journal configured; records are kept in memory only");
            let sink = Vec::<TrialRecord>::new();
            execute(
                Campaign::with_parts(campaign, transport, sink, strategy, controller),
                format,
            )
        }
    }
}

fn execute<S: EventSink>(
    campaign: Campaign<SerialTransport, S>,
    format: OutputFormat,
) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;
    let mut campaign = campaign.with_cancel_flag(running);

    let report = campaign
        .run()
        .map_err(|err| campaign_error("campaign failed", err))?;
    print_report(&report, format);

    Ok(match report.stop_reason {
        StopReason::Interrupted => INTERRUPTED,
        StopReason::BudgetReached | StopReason::StrategyExhausted => SUCCESS,
    })
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
