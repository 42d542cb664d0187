//! The `qrframe once` command: a single poll cycle.

use clap::Args;
use qrframe_core::{Config, CycleReport};

/// Arguments for the `once` command.
#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Print the cycle report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(config: Config, args: OnceArgs) -> anyhow::Result<()> {
    let mut poller = super::build_poller(&config)?;
    let report = poller.run_cycle().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary(&report));
    }

    if let Some(e) = &report.listing_error {
        anyhow::bail!("Listing the watched folder failed: {e}");
    }
    if report.failed > 0 {
        anyhow::bail!("{} photo(s) failed; see the log for details", report.failed);
    }
    Ok(())
}

fn summary(report: &CycleReport) -> String {
    format!(
        "{} listed, {} published, {} skipped, {} failed",
        report.listed, report.completed, report.skipped, report.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let report = CycleReport {
            listed: 4,
            completed: 2,
            skipped: 1,
            failed: 1,
            transient_failures: 0,
            listing_error: None,
        };
        assert_eq!(summary(&report), "4 listed, 2 published, 1 skipped, 1 failed");
    }
}
