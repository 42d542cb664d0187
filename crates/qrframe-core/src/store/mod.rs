//! Remote store abstraction.
//!
//! The pipeline only needs three capabilities from wherever photos live:
//! list a folder, fetch a file's bytes, and upload bytes to a folder getting a
//! public link back. [`RemoteStore`] captures that contract; [`StoreFactory`]
//! builds the backend named in the configuration.

pub(crate) mod drive;
pub(crate) mod local;

pub use drive::DriveStore;
pub use local::LocalStore;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A file observed in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Backend-specific opaque identifier
    pub id: String,
    /// File name as shown in the folder
    pub name: String,
}

impl FileDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Identifier of the new file
    pub id: String,
    /// Link anyone can use to download the file
    pub public_link: String,
}

/// Trait that all remote store backends implement.
///
/// Uses `async_trait` because the pipeline holds the store as
/// `Arc<dyn RemoteStore>`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Backend name for logging (e.g., "drive", "local").
    fn name(&self) -> &str;

    /// List the files directly under a folder.
    async fn list(&self, folder_id: &str) -> StoreResult<Vec<FileDescriptor>>;

    /// Fetch a file's full contents.
    async fn download(&self, file_id: &str) -> StoreResult<Vec<u8>>;

    /// Upload bytes under `name` into `folder_id`.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        folder_id: &str,
        mime_type: &str,
    ) -> StoreResult<UploadedFile>;
}

/// Factory that creates the configured store backend.
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store from `store.backend` ("drive" or "local").
    pub fn create(config: &Config) -> StoreResult<Box<dyn RemoteStore>> {
        match config.store.backend.as_str() {
            "drive" => {
                let token = drive::read_access_token(&config.credentials_path())?;
                Ok(Box::new(DriveStore::new(&token, config.request_timeout())?))
            }
            "local" => Ok(Box::new(LocalStore::new(config.local_root()))),
            other => Err(StoreError::UnknownBackend(other.to_string())),
        }
    }
}
