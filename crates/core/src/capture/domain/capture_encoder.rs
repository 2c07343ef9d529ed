use std::sync::Arc;

use thiserror::Error;

use crate::shared::pixel_buffer::PixelBuffer;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no camera frame available to capture")]
    NoFrame,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Opaque reference to one encoded capture, cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageHandle {
    id: u64,
    width: u32,
    height: u32,
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    pub fn new(id: u64, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            id,
            width,
            height,
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Turns a raw frame into a displayable/transferable image.
///
/// Called off the sequencer thread; implementations must be shareable.
pub trait CaptureEncoder: Send + Sync {
    fn encode(&self, frame: &PixelBuffer) -> Result<ImageHandle, CaptureError>;
}
