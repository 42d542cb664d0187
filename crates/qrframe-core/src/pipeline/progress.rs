//! Durable per-photo progress table.
//!
//! A JSON object mapping file name to [`ProgressRecord`], rewritten through a
//! temporary file and a rename so a crash never leaves a truncated table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{now_unix, PhotoStatus, ProgressRecord};

/// Progress records backed by a JSON file.
#[derive(Debug)]
pub struct ProgressTable {
    path: PathBuf,
    records: BTreeMap<String, ProgressRecord>,
}

impl ProgressTable {
    /// Load the table, starting empty when the file does not exist yet.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let records = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| table_error(path, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(table_error(path, e)),
        };
        tracing::debug!("Loaded {} progress record(s) from {:?}", records.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&ProgressRecord> {
        self.records.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record that work on `name` is starting from scratch.
    ///
    /// Must be saved before the raw file is written: a raw file with no
    /// record is treated as already processed. Failure counters are kept.
    pub fn begin(&mut self, file_id: &str, name: &str) -> PipelineResult<()> {
        let record = self
            .records
            .entry(name.to_string())
            .or_insert_with(|| ProgressRecord::new(file_id, name));
        record.file_id = file_id.to_string();
        record.status = PhotoStatus::Pending;
        record.download_link = None;
        record.updated_at_unix = now_unix();
        self.save()
    }

    /// Record that `name` completed the step leading to `status`.
    ///
    /// Clears the failure counters. `download_link` is kept unless a new one
    /// is given.
    pub fn advance(
        &mut self,
        file_id: &str,
        name: &str,
        status: PhotoStatus,
        download_link: Option<String>,
    ) -> PipelineResult<()> {
        let record = self
            .records
            .entry(name.to_string())
            .or_insert_with(|| ProgressRecord::new(file_id, name));
        record.file_id = file_id.to_string();
        record.status = status;
        if download_link.is_some() {
            record.download_link = download_link;
        }
        record.attempts = 0;
        record.last_error = None;
        record.updated_at_unix = now_unix();
        self.save()
    }

    /// Record a failed attempt without changing the status.
    pub fn record_failure(&mut self, file_id: &str, name: &str, message: &str) -> PipelineResult<()> {
        let record = self
            .records
            .entry(name.to_string())
            .or_insert_with(|| ProgressRecord::new(file_id, name));
        record.attempts += 1;
        record.last_error = Some(message.to_string());
        record.updated_at_unix = now_unix();
        self.save()
    }

    /// Write the table to disk atomically.
    pub fn save(&self) -> PipelineResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| table_error(&self.path, e))?;
        }
        let json =
            serde_json::to_string_pretty(&self.records).map_err(|e| table_error(&self.path, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| table_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| table_error(&self.path, e))?;
        Ok(())
    }
}

fn table_error(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Progress {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
