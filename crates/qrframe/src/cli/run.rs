//! The `qrframe run` command: poll until Ctrl-C.

use qrframe_core::Config;

pub async fn execute(config: Config) -> anyhow::Result<()> {
    let mut poller = super::build_poller(&config)?;

    tracing::info!(
        "Watching folder {} every {}s (Ctrl-C to stop)",
        config.store.watch_folder_id,
        config.poll.success_interval_secs
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let cycles = poller.run(shutdown).await;
    tracing::info!("Stopped after {cycles} cycle(s)");
    Ok(())
}
