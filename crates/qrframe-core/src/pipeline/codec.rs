//! Image decoding and PNG encoding for pipeline artifacts.

use image::{DynamicImage, EncodableLayout, ImageBuffer, ImageFormat, Pixel, PixelWithColorType};
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;

/// Decode image bytes, detecting the format from content first and the
/// file extension second.
pub fn decode_bytes(bytes: &[u8], path: &Path) -> Result<DynamicImage, PipelineError> {
    let mut reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {e}"),
        })?;

    if reader.format().is_none() {
        let format = ImageFormat::from_path(path).map_err(|_| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!(
                "Unsupported format: {}",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
            ),
        })?;
        reader.set_format(format);
    }

    reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DynamicImage, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: format!("Cannot read file: {e}"),
    })?;
    decode_bytes(&bytes, path)
}

/// Encode an image buffer as PNG bytes. `path` is only used in errors.
pub fn encode_png<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    path: &Path,
) -> Result<Vec<u8>, PipelineError>
where
    P: Pixel + PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
{
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PipelineError::Write {
            path: path.to_path_buf(),
            message: format!("PNG encoding failed: {e}"),
        })?;
    Ok(buffer.into_inner())
}
