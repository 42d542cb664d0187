//! Deterministic artifact paths for a photo name.
//!
//! ```text
//! raw_dir/<name>
//! framed_dir/<name>_with_frame.png
//! qr_dir/<name>_qr_code.png
//! final_dir/<name>_qr_code.png
//! ```

use std::path::{Path, PathBuf};

use crate::config::{expand, OutputConfig};

/// Output directory tree for pipeline artifacts.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    raw_dir: PathBuf,
    framed_dir: PathBuf,
    qr_dir: PathBuf,
    final_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            raw_dir: expand(&config.raw_dir),
            framed_dir: expand(&config.framed_dir),
            qr_dir: expand(&config.qr_dir),
            final_dir: expand(&config.final_dir),
        }
    }

    /// Layout with all four directories under `root`, using the default names.
    pub fn under(root: &Path) -> Self {
        let defaults = OutputConfig::default();
        Self {
            raw_dir: root.join(defaults.raw_dir),
            framed_dir: root.join(defaults.framed_dir),
            qr_dir: root.join(defaults.qr_dir),
            final_dir: root.join(defaults.final_dir),
        }
    }

    /// Create every output directory.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.raw_dir, &self.framed_dir, &self.qr_dir, &self.final_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.raw_dir.join(local_name(name))
    }

    /// Name used both on disk and for the re-upload.
    pub fn framed_name(name: &str) -> String {
        format!("{}_with_frame.png", local_name(name))
    }

    pub fn framed_path(&self, name: &str) -> PathBuf {
        self.framed_dir.join(Self::framed_name(name))
    }

    /// Shared by the QR code and the final composite.
    pub fn qr_name(name: &str) -> String {
        format!("{}_qr_code.png", local_name(name))
    }

    pub fn qr_path(&self, name: &str) -> PathBuf {
        self.qr_dir.join(Self::qr_name(name))
    }

    pub fn final_path(&self, name: &str) -> PathBuf {
        self.final_dir.join(Self::qr_name(name))
    }
}

/// Make a remote name safe to use as a single path component.
///
/// Separators, NUL and `%` itself are percent-encoded, so distinct names
/// always map to distinct files.
fn local_name(name: &str) -> String {
    match name {
        "" => return "%".to_string(),
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            '\0' => out.push_str("%00"),
            c => out.push(c),
        }
    }
    out
}
