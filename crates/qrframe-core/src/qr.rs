//! QR code generation for download links.
//!
//! Links are always encoded in byte mode at the smallest version that fits,
//! then rendered black-on-white with a configurable module size and quiet zone.

use image::{GrayImage, Luma};
use qrcode::bits::Bits;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};

use crate::config::QrConfig;
use crate::error::{PipelineError, PipelineResult};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encodes text into QR code images.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    ec_level: EcLevel,
    module_size: u32,
    border: u32,
}

impl QrEncoder {
    /// Create an encoder from configuration.
    ///
    /// Unknown error-correction names fall back to low; the config
    /// validator rejects them before this point.
    pub fn new(config: &QrConfig) -> Self {
        Self {
            ec_level: parse_ec_level(&config.error_correction).unwrap_or(EcLevel::L),
            module_size: config.module_size.max(1),
            border: config.border,
        }
    }

    /// Encode `text` as a QR code image.
    pub fn encode(&self, text: &str) -> PipelineResult<GrayImage> {
        let code = byte_mode_code(text.as_bytes(), self.ec_level).map_err(|e| {
            PipelineError::Qr {
                message: format!("{e} ({} bytes)", text.len()),
            }
        })?;

        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = (modules + 2 * self.border) * self.module_size;

        let image = GrayImage::from_fn(side, side, |px, py| {
            let mx = (px / self.module_size) as i64 - self.border as i64;
            let my = (py / self.module_size) as i64 - self.border as i64;
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
                DARK
            } else {
                LIGHT
            }
        });

        tracing::trace!("QR version {:?}, {modules} modules, {side}px", code.version());
        Ok(image)
    }
}

/// Map a config name to a QR error-correction level.
pub fn parse_ec_level(name: &str) -> Option<EcLevel> {
    match name.to_lowercase().as_str() {
        "low" | "l" => Some(EcLevel::L),
        "medium" | "m" => Some(EcLevel::M),
        "quartile" | "q" => Some(EcLevel::Q),
        "high" | "h" => Some(EcLevel::H),
        _ => None,
    }
}

/// Smallest normal-version code holding `data` as a single byte-mode segment.
fn byte_mode_code(data: &[u8], ec_level: EcLevel) -> Result<QrCode, QrError> {
    for v in 1..=40 {
        let mut bits = Bits::new(Version::Normal(v));
        if bits.push_byte_data(data).is_err() || bits.push_terminator(ec_level).is_err() {
            continue;
        }
        return QrCode::with_bits(bits, ec_level);
    }
    Err(QrError::DataTooLong)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(image: &GrayImage) -> String {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code");
        let (_, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_round_trip() {
        let encoder = QrEncoder::new(&QrConfig::default());
        let link = "https://drive.google.com/uc?id=1bQyEb3IC5r8nI7V4iJDCIQsZIAjC4bym";
        let image = encoder.encode(link).unwrap();
        assert_eq!(decode(&image), link);
    }

    #[test]
    fn test_dimensions_follow_module_size_and_border() {
        let encoder = QrEncoder::new(&QrConfig::default());
        // "https://x/id" fits version 1 (21 modules) at level L.
        let image = encoder.encode("https://x/id").unwrap();
        assert_eq!(image.dimensions(), ((21 + 8) * 10, (21 + 8) * 10));

        // Quiet zone is white, top-left finder pattern corner is dark.
        assert_eq!(*image.get_pixel(0, 0), LIGHT);
        assert_eq!(*image.get_pixel(39, 39), LIGHT);
        assert_eq!(*image.get_pixel(40, 40), DARK);
    }

    #[test]
    fn test_deterministic() {
        let encoder = QrEncoder::new(&QrConfig::default());
        let a = encoder.encode("https://x/id").unwrap();
        let b = encoder.encode("https://x/id").unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_longer_text_grows_version() {
        let encoder = QrEncoder::new(&QrConfig::default());
        let short = encoder.encode("https://x/id").unwrap();
        let long = encoder.encode(&"https://x/".repeat(20)).unwrap();
        assert!(long.width() > short.width());
    }

    #[test]
    fn test_oversized_text_is_an_error() {
        let encoder = QrEncoder::new(&QrConfig::default());
        let err = encoder.encode(&"x".repeat(4000)).unwrap_err();
        assert_eq!(err.kind(), "qr");
    }

    #[test]
    fn test_parse_ec_level() {
        assert_eq!(parse_ec_level("low"), Some(EcLevel::L));
        assert_eq!(parse_ec_level("HIGH"), Some(EcLevel::H));
        assert_eq!(parse_ec_level("q"), Some(EcLevel::Q));
        assert_eq!(parse_ec_level("extreme"), None);
    }
}
