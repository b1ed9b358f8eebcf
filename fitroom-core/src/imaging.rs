// File: fitroom-core/src/imaging.rs

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use fitroom_common::models::BoundingBox;

use crate::Error;

pub const JPEG_QUALITY: u8 = 90;

/// Pixel crop region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a normalized box, padded on every side, onto a `width` x `height` image.
/// The result is at least 1x1 and never leaves the image.
pub fn crop_rect(bbox: &BoundingBox, padding: f64, width: u32, height: u32) -> PixelRect {
    let (x1, y1, x2, y2) = bbox.padded(padding);
    let (w, h) = (width as f64, height as f64);

    let left = ((x1 * w).round() as u32).min(width.saturating_sub(1));
    let top = ((y1 * h).round() as u32).min(height.saturating_sub(1));
    let crop_w = ((x2 - x1) * w).round().max(1.0) as u32;
    let crop_h = ((y2 - y1) * h).round().max(1.0) as u32;

    PixelRect {
        left,
        top,
        width: crop_w.min(width - left).max(1),
        height: crop_h.min(height - top).max(1),
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, Error> {
    image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))
}

pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| Error::Image(e.to_string()))?;
    Ok(out)
}

/// Crops a garment out of its source photo and re-encodes it as JPEG.
pub fn crop_to_jpeg(bytes: &[u8], bbox: &BoundingBox, padding: f64) -> Result<Vec<u8>, Error> {
    let img = decode(bytes)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::Image("cannot read image dimensions for crop".into()));
    }
    let rect = crop_rect(bbox, padding, width, height);
    encode_jpeg(&img.crop_imm(rect.left, rect.top, rect.width, rect.height))
}

/// Re-encodes any supported image as JPEG.
pub fn normalize_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    encode_jpeg(&decode(bytes)?)
}

/// Best-effort MIME type from the magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/jpeg")
}
