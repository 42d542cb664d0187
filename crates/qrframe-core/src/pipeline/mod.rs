//! Photo processing pipeline.
//!
//! - **codec**: Decode downloaded images, encode PNG artifacts
//! - **layout**: Deterministic artifact paths per photo name
//! - **progress**: Durable per-photo status table
//! - **driver**: The per-photo state machine

pub mod codec;
pub mod driver;
pub mod layout;
pub mod progress;

// Re-exports for convenient access
pub use driver::PipelineDriver;
pub use layout::OutputLayout;
pub use progress::ProgressTable;
