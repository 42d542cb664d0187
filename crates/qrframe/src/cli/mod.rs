//! Command handlers.

pub mod config;
pub mod once;
pub mod run;
pub mod status;

use anyhow::Context;
use qrframe_core::{Config, Poller, StoreFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolve the config file: `--config` when given, otherwise the default path.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => Config::default_path(),
    }
}

/// Load configuration.
///
/// An explicit path must exist; the default path falls back to built-in
/// defaults when absent.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(_) => {
            let path = config_path(explicit);
            Config::load_from(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(Config::load()?),
    }
}

/// Create the configured store and a poller around it.
pub fn build_poller(config: &Config) -> anyhow::Result<Poller> {
    let store = StoreFactory::create(config).with_context(|| {
        format!(
            "Failed to create '{}' store.\n\n  Hint: For Drive, check that {} holds an access_token.",
            config.store.backend,
            config.credentials_path().display()
        )
    })?;
    tracing::debug!("Using '{}' store", store.name());

    let poller = Poller::new(config, Arc::from(store))?;
    Ok(poller)
}
