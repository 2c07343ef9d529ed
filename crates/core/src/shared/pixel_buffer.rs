use ndarray::{ArrayView3, ShapeBuilder};
use thiserror::Error;

pub const BYTES_PER_PIXEL: usize = 4;

/// Channel order of a packed 4-byte pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra8,
    Rgba8,
}

impl PixelFormat {
    /// Byte offsets of the (red, green, blue) channels within one pixel.
    pub fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Bgra8 => (2, 1, 0),
            PixelFormat::Rgba8 => (0, 1, 2),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelBufferError {
    #[error("pixel buffer has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("row stride {stride} is narrower than a row of {row_bytes} bytes")]
    StrideTooSmall { stride: usize, row_bytes: usize },
    #[error("buffer holds {actual} bytes but {required} are needed")]
    TooShort { required: usize, actual: usize },
    #[error("{height} rows of stride {stride} overflow the address space")]
    StrideOverflow { stride: usize, height: u32 },
}

/// One raw camera frame: packed 4-byte pixels, rows `row_stride` bytes apart.
///
/// Rows may carry padding past `width * 4`. The final row only needs to
/// hold its pixels, not the full stride. Construction does not validate;
/// consumers call [`PixelBuffer::validate`] and fail closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    row_stride: usize,
    format: PixelFormat,
}

impl PixelBuffer {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            row_stride,
            format,
        }
    }

    /// A buffer whose stride is exactly one row of pixels.
    pub fn packed(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * BYTES_PER_PIXEL;
        Self::new(data, width, height, stride, format)
    }

    /// Fills every pixel with one colour, leaving `padding` zero bytes after each row.
    pub fn uniform(
        width: u32,
        height: u32,
        padding: usize,
        format: PixelFormat,
        rgb: (u8, u8, u8),
    ) -> Self {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let stride = row_bytes + padding;
        let (ro, go, bo) = format.rgb_offsets();
        let mut data = vec![0u8; stride * height as usize];
        for row in data.chunks_mut(stride.max(1)) {
            for px in row[..row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
                px[ro] = rgb.0;
                px[go] = rgb.1;
                px[bo] = rgb.2;
                px[3] = 255;
            }
        }
        Self::new(data, width, height, stride, format)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), PixelBufferError> {
        if self.width == 0 || self.height == 0 {
            return Err(PixelBufferError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        if self.row_stride < row_bytes {
            return Err(PixelBufferError::StrideTooSmall {
                stride: self.row_stride,
                row_bytes,
            });
        }
        let required = (self.height as usize - 1)
            .checked_mul(self.row_stride)
            .and_then(|offset| offset.checked_add(row_bytes))
            .ok_or(PixelBufferError::StrideOverflow {
                stride: self.row_stride,
                height: self.height,
            })?;
        if self.data.len() < required {
            return Err(PixelBufferError::TooShort {
                required,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Stride-aware `(height, width, channel)` view over the pixel bytes.
    pub fn as_ndarray(&self) -> Result<ArrayView3<'_, u8>, PixelBufferError> {
        self.validate()?;
        let shape = (self.height as usize, self.width as usize, BYTES_PER_PIXEL)
            .strides((self.row_stride, BYTES_PER_PIXEL, 1));
        ArrayView3::from_shape(shape, &self.data).map_err(|_| PixelBufferError::TooShort {
            required: (self.height as usize).saturating_mul(self.row_stride),
            actual: self.data.len(),
        })
    }

    /// Copies the pixels into a tightly packed RGBA vector, dropping stride padding.
    pub fn to_packed_rgba(&self) -> Result<Vec<u8>, PixelBufferError> {
        let view = self.as_ndarray()?;
        let (ro, go, bo) = self.format.rgb_offsets();
        let mut out = Vec::with_capacity(self.pixel_count() * BYTES_PER_PIXEL);
        for px in view.lanes(ndarray::Axis(2)) {
            out.extend_from_slice(&[px[ro], px[go], px[bo], px[3]]);
        }
        Ok(out)
    }
}
