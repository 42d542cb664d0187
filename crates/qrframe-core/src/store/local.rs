//! Directory-backed store for offline runs.
//!
//! Folder ids are subdirectories of the root; file ids are `<folder>/<name>`
//! paths relative to the root. Public links are `file://` URLs.

use super::{FileDescriptor, RemoteStore, UploadedFile};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Store rooted at a local directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an id relative to the root, refusing anything that escapes it.
    fn resolve(&self, relative: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(StoreError::NotFound(format!(
                "Invalid local store path: {relative:?}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn list(&self, folder_id: &str) -> StoreResult<Vec<FileDescriptor>> {
        let dir = self.resolve(folder_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("folder {folder_id}")));
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(FileDescriptor::new(format!("{folder_id}/{name}"), name));
        }

        // read_dir order is platform-dependent
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn download(&self, file_id: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(file_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("file {file_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        folder_id: &str,
        _mime_type: &str,
    ) -> StoreResult<UploadedFile> {
        let id = format!("{folder_id}/{name}");
        let path = self.resolve(&id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        let absolute = std::path::absolute(&path)?;
        let public_link = format!("file://{}", absolute.to_string_lossy());
        tracing::info!("Uploaded '{name}' to local folder {folder_id}: {public_link}");
        Ok(UploadedFile { id, public_link })
    }
}
