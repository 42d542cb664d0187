//! Error types for the qrframe pipeline.
//!
//! Errors are organized by concern: configuration, the remote store, and the
//! per-photo pipeline. Pipeline errors carry one variant per step so a failed
//! photo can be reported with the stage that broke it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for qrframe operations.
#[derive(Error, Debug)]
pub enum QrFrameError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Remote store errors outside of a photo's pipeline (e.g. listing)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by a [`RemoteStore`](crate::store::RemoteStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure or non-success HTTP status
    #[error("Request failed: {message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// Credentials missing, unreadable, or rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The requested file or folder does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// `store.backend` names no known backend
    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),

    /// The backend answered with something we could not interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local filesystem failure (local backend, credentials file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying later has a reasonable chance of succeeding.
    ///
    /// Rate limits (429), server errors (5xx), and transport failures without
    /// a status (timeouts, refused connections) are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Request { status_code, .. } => match status_code {
                Some(code) => *code == 429 || (500..=599).contains(code),
                None => true,
            },
            StoreError::Io(_) => true,
            _ => false,
        }
    }
}

/// Per-photo pipeline errors, one variant per step.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fetching the raw bytes failed
    #[error("Download failed for {name}: {source}")]
    Download {
        name: String,
        #[source]
        source: StoreError,
    },

    /// Raw photo or frame template could not be decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Frame composite could not be produced
    #[error("Frame composite failed for {name}: {message}")]
    Frame { name: String, message: String },

    /// Re-upload of the framed image failed
    #[error("Upload failed for {name}: {source}")]
    Upload {
        name: String,
        #[source]
        source: StoreError,
    },

    /// QR encoding failed
    #[error("QR encoding failed: {message}")]
    Qr { message: String },

    /// Final QR composite could not be produced
    #[error("QR composite failed for {name}: {message}")]
    Composite { name: String, message: String },

    /// An artifact could not be written to disk
    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// The progress table could not be loaded or saved
    #[error("Progress table error at {path}: {message}")]
    Progress { path: PathBuf, message: String },
}

impl PipelineError {
    /// Short name of the step that failed, for logs and progress records.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Download { .. } => "download",
            PipelineError::Decode { .. } => "decode",
            PipelineError::Frame { .. } => "frame",
            PipelineError::Upload { .. } => "upload",
            PipelineError::Qr { .. } => "qr",
            PipelineError::Composite { .. } => "composite",
            PipelineError::Write { .. } => "write",
            PipelineError::Progress { .. } => "progress",
        }
    }

    /// Whether the failure is likely to clear up on its own.
    ///
    /// Only store failures can be transient; decode and composite errors will
    /// fail the same way on every cycle until the input changes.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::Download { source, .. } | PipelineError::Upload { source, .. } => {
                source.is_transient()
            }
            PipelineError::Write { .. } | PipelineError::Progress { .. } => true,
            _ => false,
        }
    }
}

/// Convenience type alias for qrframe results.
pub type Result<T> = std::result::Result<T, QrFrameError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
