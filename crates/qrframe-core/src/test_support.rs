//! Shared fixtures for unit tests: an in-memory store and config builders.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::pipeline::codec::encode_png;
use crate::store::{FileDescriptor, RemoteStore, UploadedFile};

/// Encode a single-color RGBA image as PNG.
pub(crate) fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    encode_png(&img, Path::new("fixture.png")).unwrap()
}

/// Config with every output under `root` and an 800x800 frame at `root/frame.png`.
pub(crate) fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.store.upload_folder_id = "upload-folder".into();
    config.store.watch_folder_id = "watch-folder".into();
    config.frame.frame_path = root.join("frame.png");
    config.output.raw_dir = root.join("images");
    config.output.framed_dir = root.join("addFrame");
    config.output.qr_dir = root.join("QRCode");
    config.output.final_dir = root.join("FramedQRCode");
    config.output.state_file = root.join("state/progress.json");

    // Opaque band around a clear 700x700 window.
    let frame = RgbaImage::from_fn(800, 800, |x, y| {
        if (50..750).contains(&x) && (50..750).contains(&y) {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 160, 40, 255])
        }
    });
    std::fs::write(
        root.join("frame.png"),
        encode_png(&frame, Path::new("frame.png")).unwrap(),
    )
    .unwrap();
    config
}

/// In-memory store that counts calls and can be told to fail.
pub(crate) struct MockStore {
    files: Mutex<Vec<FileDescriptor>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    downloads: AtomicU32,
    failing_uploads: AtomicU32,
    failing_downloads: Mutex<Vec<String>>,
    fail_list: AtomicBool,
    link: Option<String>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
            uploads: Mutex::new(Vec::new()),
            downloads: AtomicU32::new(0),
            failing_uploads: AtomicU32::new(0),
            failing_downloads: Mutex::new(Vec::new()),
            fail_list: AtomicBool::new(false),
            link: None,
        }
    }

    pub(crate) fn with_bytes(self, id: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.files
            .lock()
            .unwrap()
            .push(FileDescriptor::new(id, name));
        self.contents.lock().unwrap().insert(id.to_string(), bytes);
        self
    }

    pub(crate) fn with_photo(self, id: &str, name: &str, width: u32, height: u32) -> Self {
        self.with_bytes(id, name, solid_png(width, height, [220, 30, 30, 255]))
    }

    /// Every upload returns this link instead of one derived from the name.
    pub(crate) fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub(crate) fn descriptor(&self, name: &str) -> FileDescriptor {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .unwrap()
    }

    pub(crate) fn fail_next_uploads(&self, count: u32) {
        self.failing_uploads.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_download_of(&self, id: &str) {
        self.failing_downloads.lock().unwrap().push(id.to_string());
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn download_count(&self) -> u32 {
        self.downloads.load(Ordering::SeqCst)
    }

    /// (name, folder, bytes) for each successful upload.
    pub(crate) fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(&self, _folder_id: &str) -> StoreResult<Vec<FileDescriptor>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Request {
                message: "HTTP 503: backend unavailable".into(),
                status_code: Some(503),
            });
        }
        Ok(self.files.lock().unwrap().clone())
    }

    async fn download(&self, file_id: &str) -> StoreResult<Vec<u8>> {
        if self.failing_downloads.lock().unwrap().iter().any(|f| f == file_id) {
            return Err(StoreError::Request {
                message: "connection reset".into(),
                status_code: None,
            });
        }
        let bytes = self
            .contents
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(bytes)
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        folder_id: &str,
        _mime_type: &str,
    ) -> StoreResult<UploadedFile> {
        let pending = self.failing_uploads.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_uploads.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::Request {
                message: "HTTP 500: upload rejected".into(),
                status_code: Some(500),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((name.to_string(), folder_id.to_string(), bytes));
        let id = format!("up{}", uploads.len());
        let public_link = self
            .link
            .clone()
            .unwrap_or_else(|| format!("https://x/{id}"));
        Ok(UploadedFile { id, public_link })
    }
}
