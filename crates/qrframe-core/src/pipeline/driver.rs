//! Per-photo state machine: download → frame → upload → QR → composite.
//!
//! Each completed step is written to the progress table, so a photo that
//! failed or was interrupted resumes from its last completed step on the next
//! cycle instead of being skipped or restarted.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::compose;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::qr::QrEncoder;
use crate::store::{FileDescriptor, RemoteStore};
use crate::types::{PhotoOutcome, PhotoStatus, ProgressRecord};

use super::codec::{decode_bytes, decode_file, encode_png};
use super::layout::OutputLayout;
use super::progress::ProgressTable;

const PNG_MIME: &str = "image/png";

/// Drives one photo at a time through the pipeline.
pub struct PipelineDriver {
    store: Arc<dyn RemoteStore>,
    layout: OutputLayout,
    progress: ProgressTable,
    qr: QrEncoder,
    frame_path: PathBuf,
    photo_size: (u32, u32),
    qr_size: u32,
    upload_folder_id: String,
    resume: bool,
}

impl PipelineDriver {
    /// Build a driver, creating output directories and loading the progress table.
    pub fn new(config: &Config, store: Arc<dyn RemoteStore>) -> PipelineResult<Self> {
        let layout = OutputLayout::new(&config.output);
        layout.ensure_dirs().map_err(|e| PipelineError::Write {
            path: PathBuf::from(&config.output.raw_dir),
            message: format!("Cannot create output directories: {e}"),
        })?;
        let progress = ProgressTable::load(&config.state_file())?;

        Ok(Self {
            store,
            layout,
            progress,
            qr: QrEncoder::new(&config.qr),
            frame_path: config.frame_path(),
            photo_size: (config.frame.photo_width, config.frame.photo_height),
            qr_size: config.qr.overlay_size,
            upload_folder_id: config.store.upload_folder_id.clone(),
            resume: config.pipeline.resume,
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn progress(&self) -> &ProgressTable {
        &self.progress
    }

    /// Run every remaining step for `file`.
    ///
    /// A failure aborts the remaining steps for this photo only, and is
    /// recorded against the photo before being returned.
    pub async fn process(&mut self, file: &FileDescriptor) -> PipelineResult<PhotoOutcome> {
        let Some(start) = self.resume_point(file) else {
            tracing::trace!("Skipping {}: nothing to do", file.name);
            return Ok(PhotoOutcome::Skipped);
        };

        let started = Instant::now();
        if start > PhotoStatus::Pending {
            tracing::info!("Resuming {} from {start}", file.name);
        }

        match self.run_from(file, start).await {
            Ok(()) => {
                tracing::info!("Published {} in {:?}", file.name, started.elapsed());
                Ok(PhotoOutcome::Completed {
                    resumed_from: start,
                })
            }
            Err(e) => {
                if let Err(save_err) =
                    self.progress
                        .record_failure(&file.id, &file.name, &e.to_string())
                {
                    tracing::warn!("Could not record failure for {}: {save_err}", file.name);
                }
                Err(e)
            }
        }
    }

    /// Where processing of `file` should start, or `None` to skip it.
    ///
    /// The recorded status is capped by what is actually on disk: a missing
    /// raw file restarts from scratch, a missing framed file re-frames.
    fn resume_point(&self, file: &FileDescriptor) -> Option<PhotoStatus> {
        let raw_exists = self.layout.raw_path(&file.name).exists();
        let record = self.progress.get(&file.name);

        match record {
            Some(r) if r.status == PhotoStatus::Complete => None,
            _ if raw_exists && !self.resume => None,
            None if raw_exists => None,
            None => Some(PhotoStatus::Pending),
            Some(r) => Some(self.effective_status(r, raw_exists)),
        }
    }

    fn effective_status(&self, record: &ProgressRecord, raw_exists: bool) -> PhotoStatus {
        if !raw_exists {
            return PhotoStatus::Pending;
        }
        let framed_exists = self.layout.framed_path(&record.name).exists();
        match record.status {
            s if s >= PhotoStatus::Framed && !framed_exists => PhotoStatus::Downloaded,
            PhotoStatus::Uploaded if record.download_link.is_none() => PhotoStatus::Framed,
            s => s,
        }
    }

    async fn run_from(&mut self, file: &FileDescriptor, start: PhotoStatus) -> PipelineResult<()> {
        let name = file.name.as_str();
        let raw_path = self.layout.raw_path(name);
        let framed_path = self.layout.framed_path(name);

        let mut raw_bytes = None;
        if start <= PhotoStatus::Pending {
            self.progress.begin(&file.id, name)?;
            let bytes = self.download(file, &raw_path).await?;
            raw_bytes = Some(bytes);
            self.progress
                .advance(&file.id, name, PhotoStatus::Downloaded, None)?;
        }

        let mut framed_png = None;
        if start <= PhotoStatus::Downloaded {
            let raw = match raw_bytes.take() {
                Some(bytes) => bytes,
                None => read_artifact(&raw_path).await?,
            };
            let png = self.frame(name, raw, &raw_path).await?;
            write_artifact(&framed_path, &png).await?;
            tracing::debug!("Framed {name} -> {:?}", framed_path);
            framed_png = Some(png);
            self.progress
                .advance(&file.id, name, PhotoStatus::Framed, None)?;
        }

        let link = if start <= PhotoStatus::Framed {
            let png = match framed_png.take() {
                Some(png) => png,
                None => read_artifact(&framed_path).await?,
            };
            let link = self.upload(name, png).await?;
            self.progress.advance(
                &file.id,
                name,
                PhotoStatus::Uploaded,
                Some(link.clone()),
            )?;
            link
        } else {
            self.progress
                .get(name)
                .and_then(|r| r.download_link.clone())
                .ok_or_else(|| PipelineError::Progress {
                    path: self.progress.path().to_path_buf(),
                    message: format!("No download link recorded for {name}"),
                })?
        };

        self.publish_qr(name, &link, &framed_path).await?;
        self.progress
            .advance(&file.id, name, PhotoStatus::Complete, None)?;
        Ok(())
    }

    async fn download(&self, file: &FileDescriptor, raw_path: &Path) -> PipelineResult<Vec<u8>> {
        let bytes = self
            .store
            .download(&file.id)
            .await
            .map_err(|source| PipelineError::Download {
                name: file.name.clone(),
                source,
            })?;
        write_artifact(raw_path, &bytes).await?;
        tracing::info!(
            "Downloaded {} ({} bytes, id {})",
            file.name,
            bytes.len(),
            file.id
        );
        Ok(bytes)
    }

    /// Decode the raw photo and the frame template and composite them to PNG.
    async fn frame(&self, name: &str, raw: Vec<u8>, raw_path: &Path) -> PipelineResult<Vec<u8>> {
        let frame_path = self.frame_path.clone();
        let raw_path = raw_path.to_path_buf();
        let framed_path = self.layout.framed_path(name);
        let photo_size = self.photo_size;

        let task = tokio::task::spawn_blocking(move || {
            let photo = compose::to_rgba(decode_bytes(&raw, &raw_path)?);
            let frame = compose::to_rgba(decode_file(&frame_path)?);
            let framed = compose::frame_photo(&photo, &frame, photo_size);
            encode_png(&framed, &framed_path)
        });

        task.await.map_err(|e| PipelineError::Frame {
            name: name.to_string(),
            message: format!("Task join error: {e}"),
        })?
    }

    async fn upload(&self, name: &str, png: Vec<u8>) -> PipelineResult<String> {
        let upload_name = OutputLayout::framed_name(name);
        let uploaded = self
            .store
            .upload(png, &upload_name, &self.upload_folder_id, PNG_MIME)
            .await
            .map_err(|source| PipelineError::Upload {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!("Uploaded {upload_name} as {}", uploaded.id);
        Ok(uploaded.public_link)
    }

    /// Encode the link, save the QR code, and stamp it onto the framed image.
    async fn publish_qr(&self, name: &str, link: &str, framed_path: &Path) -> PipelineResult<()> {
        let qr_path = self.layout.qr_path(name);
        let final_path = self.layout.final_path(name);

        let encoder = self.qr.clone();
        let link = link.to_string();
        let framed_path = framed_path.to_path_buf();
        let qr_size = self.qr_size;
        let (qr_out, final_out) = (qr_path.clone(), final_path.clone());

        let task = tokio::task::spawn_blocking(move || {
            let qr = encoder.encode(&link)?;
            let qr_png = encode_png(&qr, &qr_out)?;

            let framed: RgbaImage = compose::to_rgba(decode_file(&framed_path)?);
            let stamped = compose::stamp_qr(&framed, &qr, qr_size);
            let final_png = encode_png(&stamped, &final_out)?;
            Ok::<_, PipelineError>((qr_png, final_png))
        });

        let (qr_png, final_png) = task.await.map_err(|e| PipelineError::Composite {
            name: name.to_string(),
            message: format!("Task join error: {e}"),
        })??;

        write_artifact(&qr_path, &qr_png).await?;
        tracing::debug!("QR code saved to {:?}", qr_path);
        write_artifact(&final_path, &final_png).await?;
        tracing::debug!("Stamped image saved to {:?}", final_path);
        Ok(())
    }
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| PipelineError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

async fn read_artifact(path: &Path) -> PipelineResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: format!("Cannot read file: {e}"),
    })
}
