//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const BACKENDS: &[&str] = &["drive", "local"];
const EC_LEVELS: &[&str] = &["low", "medium", "quartile", "high"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be one of {BACKENDS:?}, got {:?}",
                self.store.backend
            )));
        }
        if self.store.watch_folder_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.watch_folder_id must not be empty".into(),
            ));
        }
        if self.store.upload_folder_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.upload_folder_id must not be empty".into(),
            ));
        }
        if self.store.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "store.request_timeout_secs must be > 0".into(),
            ));
        }
        if self.frame.photo_width == 0 || self.frame.photo_height == 0 {
            return Err(ConfigError::ValidationError(
                "frame.photo_width and frame.photo_height must be > 0".into(),
            ));
        }
        if !EC_LEVELS.contains(&self.qr.error_correction.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "qr.error_correction must be one of {EC_LEVELS:?}, got {:?}",
                self.qr.error_correction
            )));
        }
        if self.qr.module_size == 0 {
            return Err(ConfigError::ValidationError(
                "qr.module_size must be > 0".into(),
            ));
        }
        if self.qr.overlay_size == 0 {
            return Err(ConfigError::ValidationError(
                "qr.overlay_size must be > 0".into(),
            ));
        }
        if self
            .poll
            .max_backoff_secs
            .is_some_and(|max| max < self.poll.error_interval_secs)
        {
            return Err(ConfigError::ValidationError(
                "poll.error_interval_secs must be <= poll.max_backoff_secs".into(),
            ));
        }
        if self.poll.max_cycles == Some(0) {
            return Err(ConfigError::ValidationError(
                "poll.max_cycles must be > 0 when set".into(),
            ));
        }
        // QR codes and final composites share file names, so they need their own directories.
        let out = &self.output;
        let dirs = [&out.raw_dir, &out.framed_dir, &out.qr_dir, &out.final_dir];
        for (i, a) in dirs.iter().enumerate() {
            if dirs[i + 1..].contains(a) {
                return Err(ConfigError::ValidationError(format!(
                    "output directories must be distinct, {} is used twice",
                    a.display()
                )));
            }
        }
        Ok(())
    }
}
