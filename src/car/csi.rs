// SPDX-License-Identifier: MIT
//! Per-rendition records (all little-endian)
//!
//! ```text
//! RENDITIONS value
//! ================
//!
//! CSI header (184 bytes):
//! - tag "CTSI", version, rendition flags, width, height, scale factor
//! - pixel format (4-char tag, stored reversed), color space
//! - metadata: modtime (4), layout (2), zero (2), name (128)
//! - bitmap list: TLV length (4), unknown (4), zero (4), rendition length (4)
//! TLV trailer (TLV length bytes, skipped)
//! Payload (shape chosen by pixel format, or by layout when it is zero)
//! ```

use serde::Serialize;

use crate::codec::{ByteCursor, FourCc, Truncated};

use super::types::{ColorSpace, CompressionType, Idiom, LayoutType, RenditionFlags};

/// CSI header size in bytes
pub const CSI_HEADER_SIZE: usize = 184;

/// Per-rendition image descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsiHeader {
    pub tag: FourCc,
    pub version: u32,
    pub flags: RenditionFlags,
    pub width: u32,
    pub height: u32,
    /// 100 for @1x, 200 for @2x, 300 for @3x
    pub scale_factor: u32,
    pub pixel_format: FourCc,
    pub color_space: ColorSpace,
    pub modtime: u32,
    pub layout: LayoutType,
    pub name: String,
    pub tlv_length: u32,
    pub rendition_length: u32,
}

impl CsiHeader {
    pub const TAG: FourCc = FourCc::new(b"CTSI");

    /// Decode the fixed header; the cursor is left at the TLV trailer
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, Truncated> {
        let tag = cursor.tag_le()?;
        let version = cursor.u32_le()?;
        let flags = RenditionFlags(cursor.u32_le()?);
        let width = cursor.u32_le()?;
        let height = cursor.u32_le()?;
        let scale_factor = cursor.u32_le()?;
        let pixel_format = cursor.tag_le()?;
        let color_space = ColorSpace(cursor.u32_le()?);

        let modtime = cursor.u32_le()?;
        let layout = LayoutType::from_code(cursor.u16_le()?);
        cursor.skip(2)?;
        let name = cursor.padded_str(128)?;

        let tlv_length = cursor.u32_le()?;
        cursor.skip(8)?;
        let rendition_length = cursor.u32_le()?;

        Ok(Self {
            tag,
            version,
            flags,
            width,
            height,
            scale_factor,
            pixel_format,
            color_space,
            modtime,
            layout,
            name,
            tlv_length,
            rendition_length,
        })
    }

    /// Scale as a multiplier (2.0 for @2x)
    pub fn scale(&self) -> f32 {
        self.scale_factor as f32 / 100.0
    }
}

/// Compressed pixel payload header ("CELM")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRenditionHeader {
    pub tag: FourCc,
    pub version: u32,
    pub compression: CompressionType,
}

impl PixelRenditionHeader {
    pub const TAG: FourCc = FourCc::new(b"CELM");

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, Truncated> {
        Ok(Self {
            tag: cursor.tag_le()?,
            version: cursor.u32_le()?,
            compression: CompressionType::from_code(cursor.u32_le()?),
        })
    }
}

/// Header in front of each row chunk of a version 1/3 payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowChunkHeader {
    pub arg1: u16,
    pub arg2: u16,
    pub arg3: u32,
    pub arg4: u32,
    /// Rows covered by the chunk
    pub height: u32,
    pub row_data_len: u16,
    pub arg6: u16,
}

impl RowChunkHeader {
    pub const SIZE: usize = 20;

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, Truncated> {
        Ok(Self {
            arg1: cursor.u16_le()?,
            arg2: cursor.u16_le()?,
            arg3: cursor.u32_le()?,
            arg4: cursor.u32_le()?,
            height: cursor.u32_le()?,
            row_data_len: cursor.u16_le()?,
            arg6: cursor.u16_le()?,
        })
    }
}

/// Entry of a multisize image set ("SISM")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MultisizeImageSet {
    pub tag: FourCc,
    pub idiom: Idiom,
    pub scale: u32,
    pub width: u32,
    pub height: u32,
    pub index: u32,
}

impl MultisizeImageSet {
    pub const TAG: FourCc = FourCc::new(b"SISM");

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, Truncated> {
        Ok(Self {
            tag: cursor.tag_le()?,
            idiom: Idiom::from_code(cursor.u32_le()?),
            scale: cursor.u32_le()?,
            width: cursor.u32_le()?,
            height: cursor.u32_le()?,
            index: cursor.u32_le()?,
        })
    }
}
