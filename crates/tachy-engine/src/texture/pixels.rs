use std::borrow::Cow;

use crate::error::{Result, TachyError};

/// Channel layout of an 8-bit pixel buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// One channel, displayed as grey.
    Luminance8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            PixelFormat::Luminance8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub const fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::Luminance8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }
}

/// Dense `width × height × channels` image, row-major, top row first.
///
/// Construction validates the shape, so a `PixelBuffer` is always uploadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps `data` as a `width × height × channels` image.
    ///
    /// Fails with `InvalidImage` for zero dimensions, a channel count other
    /// than 1, 3 or 4, or a length that does not match the shape.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        let format = PixelFormat::from_channels(channels).ok_or_else(|| {
            TachyError::InvalidImage(format!(
                "unsupported channel count {channels} (expected 1, 3 or 4)"
            ))
        })?;
        Self::with_format(width, height, format, data)
    }

    pub fn with_format(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TachyError::InvalidImage(format!(
                "zero dimension ({width}x{height})"
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or_else(|| {
                TachyError::InvalidImage(format!("{width}x{height} image is too large"))
            })?;

        if data.len() != expected {
            return Err(TachyError::InvalidImage(format!(
                "{width}x{height}x{} needs {expected} bytes, got {}",
                format.channels(),
                data.len()
            )));
        }

        Ok(Self { width, height, format, data })
    }

    /// Image where every pixel equals `pixel` (one value per channel).
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Result<Self> {
        let count = (width as usize).saturating_mul(height as usize);
        let data = pixel.repeat(count);
        Self::new(width, height, pixel.len(), data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixel at `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        self.data.get(start..start + c)
    }

    /// Expands to tightly packed RGBA8, the layout GPU textures use.
    ///
    /// Luminance is replicated into RGB; missing alpha becomes 255.
    pub fn to_rgba8(&self) -> Cow<'_, [u8]> {
        match self.format {
            PixelFormat::Rgba8 => Cow::Borrowed(&self.data),
            PixelFormat::Rgb8 => Cow::Owned(
                self.data
                    .chunks_exact(3)
                    .flat_map(|p| [p[0], p[1], p[2], 255])
                    .collect(),
            ),
            PixelFormat::Luminance8 => {
                Cow::Owned(self.data.iter().flat_map(|&l| [l, l, l, 255]).collect())
            }
        }
    }
}
