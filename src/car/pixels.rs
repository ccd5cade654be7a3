// SPDX-License-Identifier: MIT
//! Addressable views over decoded pixel bytes

use serde::Serialize;

use super::error::CarError;

/// Channel layout of a decoded rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelLayout {
    /// 8-bit ARGB, stored B, G, R, A in memory
    Argb,
    /// 8-bit gray + alpha, interleaved
    Ga8,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Argb => 4,
            PixelLayout::Ga8 => 2,
        }
    }

    /// Convert one stored pixel to RGBA
    #[inline]
    fn to_rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            PixelLayout::Argb => [px[2], px[1], px[0], px[3]],
            PixelLayout::Ga8 => [px[0], px[0], px[0], px[1]],
        }
    }
}

/// Extra pixels per row implied by a buffer larger than `width * height`
///
/// Returns 0 for an exact fit. A buffer shorter than expected is a
/// [`CarError::CorruptImage`]; it is never truncated.
pub fn infer_row_padding(
    actual: usize,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Result<usize, CarError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(bytes_per_pixel))
        .ok_or_else(|| CarError::corrupt_image(format!("{}x{} overflows", width, height)))?;

    if actual < expected {
        return Err(CarError::corrupt_image(format!(
            "{}x{} image needs {} bytes, payload decoded to {}",
            width, height, expected, actual
        )));
    }
    if actual == expected || height == 0 {
        return Ok(0);
    }
    Ok((actual - expected) / (height as usize * bytes_per_pixel))
}

/// Decoded pixels with an explicit row stride
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    layout: PixelLayout,
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// View `data` as a `width` x `height` image, inferring row padding
    pub fn from_raw(
        layout: PixelLayout,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, CarError> {
        let bpp = layout.bytes_per_pixel();
        let padding = infer_row_padding(data.len(), width, height, bpp)?;
        Self::with_stride(layout, width, height, (width as usize + padding) * bpp, data)
    }

    /// View `data` with a known stride in bytes
    pub fn with_stride(
        layout: PixelLayout,
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, CarError> {
        let row = width as usize * layout.bytes_per_pixel();
        if stride < row {
            return Err(CarError::corrupt_image(format!(
                "stride {} shorter than a {}-byte row",
                stride, row
            )));
        }
        let needed = match height {
            0 => 0,
            h => (h as usize - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(row))
                .ok_or_else(|| {
                    CarError::corrupt_image(format!("{}x{} overflows", width, height))
                })?,
        };
        if data.len() < needed {
            return Err(CarError::corrupt_image(format!(
                "{}x{} image with stride {} needs {} bytes, got {}",
                width,
                height,
                stride,
                needed,
                data.len()
            )));
        }

        Ok(Self {
            layout,
            width,
            height,
            stride,
            data,
        })
    }

    /// Sub-image anchored at the origin
    pub fn crop(mut self, width: u32, height: u32) -> Result<Self, CarError> {
        if width > self.width || height > self.height {
            return Err(CarError::corrupt_image(format!(
                "cannot crop {}x{} to {}x{}",
                self.width, self.height, width, height
            )));
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Decoded bytes in stored channel order, including row padding
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value at (x, y), or `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let offset = y as usize * self.stride + x as usize * bpp;
        self.data
            .get(offset..offset + bpp)
            .map(|px| self.layout.to_rgba(px))
    }

    /// Tightly packed RGBA copy, row-major
    pub fn to_rgba8(&self) -> Vec<u8> {
        let bpp = self.layout.bytes_per_pixel();
        let row = self.width as usize * bpp;
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height as usize {
            let start = y * self.stride;
            for px in self.data[start..start + row].chunks_exact(bpp) {
                out.extend_from_slice(&self.layout.to_rgba(px));
            }
        }
        out
    }
}
