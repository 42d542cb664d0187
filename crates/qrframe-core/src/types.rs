//! Core data types shared by the pipeline, the poll loop, and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a photo has progressed through the pipeline.
///
/// Variants are ordered: a later variant implies every earlier step finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoStatus {
    /// Seen in a listing, nothing on disk yet
    Pending,
    /// Raw bytes written to the raw directory
    Downloaded,
    /// Framed composite written
    Framed,
    /// Framed composite uploaded, download link known
    Uploaded,
    /// QR code and final composite written
    Complete,
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhotoStatus::Pending => "pending",
            PhotoStatus::Downloaded => "downloaded",
            PhotoStatus::Framed => "framed",
            PhotoStatus::Uploaded => "uploaded",
            PhotoStatus::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Durable per-photo progress entry, keyed by file name in the progress table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Remote file id the photo was downloaded from
    pub file_id: String,

    /// Remote file name (also the key)
    pub name: String,

    /// Last step that completed
    pub status: PhotoStatus,

    /// Public link of the framed upload, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,

    /// Seconds since the Unix epoch of the last change
    pub updated_at_unix: u64,

    /// Failed attempts since the last completed step
    #[serde(default)]
    pub attempts: u32,

    /// Most recent failure, cleared when a step completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProgressRecord {
    pub fn new(file_id: &str, name: &str) -> Self {
        Self {
            file_id: file_id.to_string(),
            name: name.to_string(),
            status: PhotoStatus::Pending,
            download_link: None,
            updated_at_unix: now_unix(),
            attempts: 0,
            last_error: None,
        }
    }
}

/// Result of handing one photo to the pipeline driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoOutcome {
    /// Nothing to do: already complete, or legacy raw file present
    Skipped,
    /// All remaining steps ran
    Completed {
        /// Status the photo was at when this run started
        resumed_from: PhotoStatus,
    },
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Files in the listing
    pub listed: usize,
    /// Photos that reached `Complete` this cycle
    pub completed: usize,
    /// Photos that needed no work
    pub skipped: usize,
    /// Photos whose pipeline failed this cycle
    pub failed: usize,
    /// Of `failed`, how many failed in a way worth backing off for
    #[serde(default)]
    pub transient_failures: usize,
    /// Set when the listing itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
}

impl CycleReport {
    /// Whether the cycle saw any failure (listing or per-photo).
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.listing_error.is_some()
    }

    /// Whether the failures point at the backend rather than at a bad file.
    ///
    /// Only these grow the error sleep.
    pub fn backend_unhealthy(&self) -> bool {
        self.transient_failures > 0 || self.listing_error.is_some()
    }
}

pub(crate) fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
