//! Configuration management for qrframe.
//!
//! Configuration is loaded from a TOML file with defaults equal to the
//! original deployment's constants. Relative paths are resolved against the
//! process working directory; `~` is expanded.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for qrframe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote store settings
    pub store: StoreConfig,

    /// Frame composite settings
    pub frame: FrameConfig,

    /// QR code settings
    pub qr: QrConfig,

    /// Poll loop settings
    pub poll: PollConfig,

    /// Output directory layout
    pub output: OutputConfig,

    /// Pipeline behavior
    pub pipeline: PipelineConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.qrframe.qrframe/config.toml
    /// - Linux: ~/.config/qrframe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\qrframe\config\config.toml
    ///
    /// Falls back to ~/.qrframe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "qrframe", "qrframe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".qrframe").join("config.toml")
            })
    }

    /// Resolved frame template path (with ~ expansion).
    pub fn frame_path(&self) -> PathBuf {
        expand(&self.frame.frame_path)
    }

    /// Resolved credentials file path (with ~ expansion).
    pub fn credentials_path(&self) -> PathBuf {
        expand(&self.store.credentials_path)
    }

    /// Resolved local store root (with ~ expansion).
    pub fn local_root(&self) -> PathBuf {
        expand(&self.store.local_root)
    }

    /// Resolved progress table path (with ~ expansion).
    pub fn state_file(&self) -> PathBuf {
        expand(&self.output.state_file)
    }

    /// Per-request timeout for remote store calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.request_timeout_secs)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Expand a leading `~` in a configured path.
pub(crate) fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.frame.photo_width, 700);
        assert_eq!(config.frame.photo_height, 700);
        assert_eq!(config.qr.overlay_size, 100);
        assert_eq!(config.qr.module_size, 10);
        assert_eq!(config.qr.border, 4);
        assert_eq!(config.poll.success_interval_secs, 30);
        assert_eq!(config.poll.error_interval_secs, 10);
        assert_eq!(config.poll.max_backoff_secs, None);
        assert_eq!(config.output.framed_dir, PathBuf::from("addFrame"));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[store]"));
        assert!(toml.contains("[poll]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\nbackend = \"local\"\nwatch_folder_id = \"inbox\"\n\n[poll]\nmax_cycles = 2\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.backend, "local");
        assert_eq!(config.store.watch_folder_id, "inbox");
        assert_eq!(config.poll.max_cycles, Some(2));
        assert_eq!(config.poll.success_interval_secs, 30);
        assert_eq!(config.qr.error_correction, "low");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[qr]\nmodule_size = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("qr.module_size"));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.frame.frame_path = PathBuf::from("~/frames/frame.png");
        let resolved = config.frame_path();
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with("frames/frame.png"));
    }
}
