//! QRFrame Core - photo framing and QR publishing pipeline.
//!
//! New photos appearing in a watched remote folder are downloaded, composited
//! into a frame template, uploaded, and stamped with a QR code pointing at the
//! uploaded copy.
//!
//! # Architecture
//!
//! ```text
//! List → Download → Frame → Upload → QR encode → Stamp → Write final
//! ```
//!
//! Each photo advances through [`PhotoStatus`] and its progress is persisted,
//! so an interrupted photo resumes from its last completed step.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use qrframe_core::{Config, Poller, StoreFactory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::from(StoreFactory::create(&config)?);
//!     let mut poller = Poller::new(&config, store)?;
//!
//!     let report = poller.run_cycle().await;
//!     println!("Published {} photo(s)", report.completed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod compose;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod poll;
pub mod qr;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, PipelineError, PipelineResult, QrFrameError, Result, StoreError, StoreResult,
};
pub use pipeline::{OutputLayout, PipelineDriver, ProgressTable};
pub use poll::Poller;
pub use qr::QrEncoder;
pub use store::{FileDescriptor, RemoteStore, StoreFactory, UploadedFile};
pub use types::{CycleReport, PhotoOutcome, PhotoStatus, ProgressRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
