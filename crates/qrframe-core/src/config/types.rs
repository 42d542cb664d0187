//! Sub-configuration structs with defaults matching the original deployment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend: "drive" (Google Drive v3) or "local" (directory tree)
    pub backend: String,

    /// Folder watched for new photos
    pub watch_folder_id: String,

    /// Folder that receives the framed uploads
    pub upload_folder_id: String,

    /// JSON file holding `{"access_token": "..."}` for the drive backend
    pub credentials_path: PathBuf,

    /// Root directory for the local backend (folder ids are subdirectories)
    pub local_root: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "drive".to_string(),
            watch_folder_id: "1yMt9hQ5Q7L2ldjjQ59jxgGXZwS_EAUCc".to_string(),
            upload_folder_id: "1bQyEb3IC5r8nI7V4iJDCIQsZIAjC4bym".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            local_root: PathBuf::from("store"),
            request_timeout_secs: 60,
        }
    }
}

/// Frame composite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame template image (PNG with transparent photo window)
    pub frame_path: PathBuf,

    /// Width the raw photo is resized to before framing
    pub photo_width: u32,

    /// Height the raw photo is resized to before framing
    pub photo_height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_path: PathBuf::from("frame.png"),
            photo_width: 700,
            photo_height: 700,
        }
    }
}

/// QR code settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Error correction level: "low", "medium", "quartile", or "high"
    pub error_correction: String,

    /// Side length of one QR module in pixels
    pub module_size: u32,

    /// Quiet zone width in modules
    pub border: u32,

    /// Side length of the QR stamp on the final composite
    pub overlay_size: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            error_correction: "low".to_string(),
            module_size: 10,
            border: 4,
            overlay_size: 100,
        }
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Sleep after a clean cycle, in seconds
    pub success_interval_secs: u64,

    /// Base sleep after a cycle with failures, in seconds
    pub error_interval_secs: u64,

    /// Cap on the error sleep when repeated transient failures double it,
    /// in seconds (unset = the error sleep stays at `error_interval_secs`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff_secs: Option<u64>,

    /// Upper bound of random jitter added to error sleeps, in milliseconds
    pub jitter_ms: u64,

    /// Stop after this many cycles (unset = run until shutdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            success_interval_secs: 30,
            error_interval_secs: 10,
            max_backoff_secs: None,
            jitter_ms: 0,
            max_cycles: None,
        }
    }
}

/// Output directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raw downloads
    pub raw_dir: PathBuf,

    /// Framed composites
    pub framed_dir: PathBuf,

    /// Generated QR codes
    pub qr_dir: PathBuf,

    /// Framed composites stamped with their QR code
    pub final_dir: PathBuf,

    /// Progress table location
    pub state_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("images"),
            framed_dir: PathBuf::from("addFrame"),
            qr_dir: PathBuf::from("QRCode"),
            final_dir: PathBuf::from("FramedQRCode"),
            state_file: PathBuf::from("state/progress.json"),
        }
    }
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Resume partially processed photos from their last completed step.
    ///
    /// When false, any photo whose raw file exists is skipped outright.
    pub resume: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { resume: true }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format (pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
