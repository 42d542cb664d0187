//! Pure image transformations used to build the framed and QR-stamped outputs.
//!
//! Everything here works on RGBA buffers so alpha is respected when layers
//! are stacked. No I/O happens in this module.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbaImage};

/// Where a top layer lands on a base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Centered on both axes (integer division, rounding toward the top-left).
    Centered,
    /// Flush against the bottom-right corner with no margin.
    BottomRightFlush,
}

impl Placement {
    /// Top-left corner of `top` on `base`, given both sizes as (width, height).
    ///
    /// `Centered` goes negative when `top` is larger than `base`;
    /// `BottomRightFlush` saturates at zero.
    pub fn origin(self, base: (u32, u32), top: (u32, u32)) -> (i64, i64) {
        match self {
            Placement::Centered => (
                (base.0 as i64 - top.0 as i64).div_euclid(2),
                (base.1 as i64 - top.1 as i64).div_euclid(2),
            ),
            Placement::BottomRightFlush => (
                base.0.saturating_sub(top.0) as i64,
                base.1.saturating_sub(top.1) as i64,
            ),
        }
    }
}

/// Resize to exactly `width` x `height` with a Lanczos filter.
pub fn resize(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Convert any decoded image to RGBA.
pub fn to_rgba(image: DynamicImage) -> RgbaImage {
    image.into_rgba8()
}

/// Alpha-composite `top` onto `base` with its top-left corner at `origin`.
///
/// Parts of `top` that fall outside `base` are clipped.
pub fn overlay(base: &mut RgbaImage, top: &RgbaImage, origin: (i64, i64)) {
    imageops::overlay(base, top, origin.0, origin.1);
}

/// Place `top` on `base` according to `placement`.
pub fn place(base: &mut RgbaImage, top: &RgbaImage, placement: Placement) -> (i64, i64) {
    let origin = placement.origin(base.dimensions(), top.dimensions());
    overlay(base, top, origin);
    origin
}

/// Put a photo behind a frame template.
///
/// The photo is resized to `photo_size`, painted centered on a transparent
/// canvas the size of the frame, and the frame is painted over it so the
/// frame's opaque parts hide the photo's edges.
pub fn frame_photo(photo: &RgbaImage, frame: &RgbaImage, photo_size: (u32, u32)) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let resized = resize(photo, photo_size.0, photo_size.1);

    let mut canvas = RgbaImage::new(width, height);
    place(&mut canvas, &resized, Placement::Centered);
    overlay(&mut canvas, frame, (0, 0));
    canvas
}

/// Stamp a QR code into the bottom-right corner of a framed image.
pub fn stamp_qr(framed: &RgbaImage, qr: &GrayImage, qr_size: u32) -> RgbaImage {
    let qr_rgba = to_rgba(DynamicImage::ImageLuma8(qr.clone()));
    let qr_small = resize(&qr_rgba, qr_size, qr_size);

    let mut out = framed.clone();
    place(&mut out, &qr_small, Placement::BottomRightFlush);
    out
}
