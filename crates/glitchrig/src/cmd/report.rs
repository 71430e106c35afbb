use glitchrig_campaign::{read_journal, OutcomeSummary};

use crate::cmd::ReportArgs;
use crate::exit::{campaign_error, CliResult, SUCCESS};
use crate::output::{print_summary, OutputFormat};

pub fn run(args: ReportArgs, format: OutputFormat) -> CliResult<i32> {
    let records = read_journal(&args.journal).map_err(|err| {
        campaign_error(&format!("cannot read {}", args.journal.display()), err)
    })?;
    print_summary(&OutcomeSummary::from_records(&records), format);
    Ok(SUCCESS)
}
