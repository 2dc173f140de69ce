use image::RgbaImage;

use crate::error::{InspectError, Result};

/// Read-only view over decoded RGBA pixels at natural resolution.
///
/// Row-major, 4 bytes per pixel. The bytes belong to whoever decoded the image;
/// extraction and sampling only borrow them.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> PixelBuffer<'a> {
    /// Wrap raw RGBA bytes. Zero-area buffers are accepted here and rejected by
    /// the operations that need pixels.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                InspectError::InvalidInput(format!("{width}x{height} RGBA buffer is too large"))
            })?;
        if data.len() != expected {
            return Err(InspectError::InvalidInput(format!(
                "expected {expected} bytes for a {width}x{height} RGBA buffer, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_image(img: &'a RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.as_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// RGBA of pixel `index` in scan order. Caller guarantees `index < pixel_count()`.
    #[inline(always)]
    pub(crate) fn rgba_at(&self, index: usize) -> [u8; 4] {
        let idx = index * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.rgba_at(y as usize * self.width as usize + x as usize))
    }
}
