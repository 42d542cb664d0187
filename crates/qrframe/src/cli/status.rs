//! The `qrframe status` command: print the progress table.

use clap::Args;
use qrframe_core::{Config, PhotoStatus, ProgressRecord, ProgressTable};

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print records as JSON
    #[arg(long)]
    pub json: bool,

    /// Only show photos that have not completed
    #[arg(long)]
    pub pending: bool,
}

pub async fn execute(config: Config, args: StatusArgs) -> anyhow::Result<()> {
    let table = ProgressTable::load(&config.state_file())?;
    let records: Vec<&ProgressRecord> = table
        .records()
        .filter(|r| !args.pending || r.status != PhotoStatus::Complete)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No photos recorded in {}", table.path().display());
        return Ok(());
    }
    for record in records {
        println!("{}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &ProgressRecord) -> String {
    let mut line = format!("{:<40} {:<10}", record.name, record.status.to_string());
    if let Some(link) = &record.download_link {
        line.push_str(&format!(" {link}"));
    }
    if let Some(err) = &record.last_error {
        line.push_str(&format!(" [{} attempt(s), last error: {err}]", record.attempts));
    }
    line.trim_end().to_string()
}
