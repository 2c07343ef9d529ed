use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::capture::domain::capture_encoder::{CaptureEncoder, CaptureError, ImageHandle};
use crate::shared::pixel_buffer::PixelBuffer;

/// Encodes captured frames to in-memory PNG using the `image` crate.
///
/// Stride padding is dropped and BGRA input is swizzled to RGBA first.
pub struct PngCaptureEncoder {
    next_id: AtomicU64,
}

impl PngCaptureEncoder {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }
}

impl Default for PngCaptureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureEncoder for PngCaptureEncoder {
    fn encode(&self, frame: &PixelBuffer) -> Result<ImageHandle, CaptureError> {
        let rgba = frame
            .to_packed_rgba()
            .map_err(|e| CaptureError::InvalidFrame(e.to_string()))?;

        let img = image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
            .ok_or_else(|| CaptureError::InvalidFrame("pixel data does not match dimensions".into()))?;

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(ImageHandle::new(id, frame.width(), frame.height(), png.into_inner()))
    }
}
