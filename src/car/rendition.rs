// SPDX-License-Identifier: MIT
//! Rendition decode pipeline
//!
//! Each RENDITIONS entry goes through: key decode against the key
//! format, CSI header decode, TLV skip, then dispatch on the pixel
//! format tag (or on the layout when the tag is zero).
//!
//! Outcomes are split in two levels. Errors that mean the walk itself
//! cannot be trusted (bad key, truncated header, unknown pixel format,
//! unreadable blocks) end the iteration. Errors confined to one payload
//! (unsupported codec, corrupt pixels) are reported on that entry and the
//! walk carries on.

use std::io::{Read, Seek};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bom::TreeWalker;
use crate::codec::{ByteCursor, FourCc, Truncated};

use super::compression::decompress;
use super::csi::{CsiHeader, MultisizeImageSet, PixelRenditionHeader, RowChunkHeader};
use super::error::CarError;
use super::header::KeyFormat;
use super::keys::RenditionKey;
use super::pixels::{PixelBuffer, PixelLayout};
use super::types::{CompressionType, LayoutType};

/// Extra pixels per row in single-stream LZFSE payloads
pub const SINGLE_STREAM_WIDTH_PAD: u32 = 4;

/// Start of every LZFSE block magic
const LZFSE_MAGIC_PREFIX: &[u8; 3] = b"bvx";

/// How the pixel bytes of an image were framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadFraming {
    /// Version 0/2: one length-prefixed blob
    Blob,
    /// Version 1/3: row chunks decompressed independently and concatenated
    RowChunks { chunks: usize },
    /// Version 1/3 LZFSE: one chunk header then a single stream decoded
    /// `SINGLE_STREAM_WIDTH_PAD` pixels wider than declared and cropped back
    SingleStream,
}

/// Decoded image rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub buffer: PixelBuffer,
    pub compression: CompressionType,
    pub framing: PayloadFraming,
}

/// Why a recognised rendition was not decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnsupportedKind {
    /// JPEG, HEIF or DATA payloads
    PixelFormat(FourCc),
    /// Zero pixel format with a layout that carries no image
    Layout(LayoutType),
}

/// Rendition payload handed back undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub kind: UnsupportedKind,
    /// Payload bytes following the TLV trailer
    pub raw: Bytes,
}

/// Decoded form of one rendition payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenditionPayload {
    Image(DecodedImage),
    MultisizeImageSet(MultisizeImageSet),
    /// Color layout; the color record itself is left undecoded
    Color { raw: Bytes },
    Unsupported(Unsupported),
}

/// One RENDITIONS entry
#[derive(Debug)]
pub struct Rendition {
    /// Position in tree order
    pub index: usize,
    pub key: RenditionKey,
    pub header: CsiHeader,
    /// Per-entry outcome; an error here does not stop the walk
    pub payload: Result<RenditionPayload, CarError>,
}

impl Rendition {
    pub fn image(&self) -> Option<&DecodedImage> {
        match &self.payload {
            Ok(RenditionPayload::Image(image)) => Some(image),
            _ => None,
        }
    }
}

/// Decode one tree entry. `Err` is structural and ends the walk.
pub fn decode_rendition(
    index: usize,
    format: &KeyFormat,
    key: &[u8],
    value: Bytes,
) -> Result<Rendition, CarError> {
    let key = RenditionKey::decode(format, key).map_err(|e| in_entry(index, e))?;

    let mut cursor = ByteCursor::new(&value, "CSI header");
    let header = CsiHeader::decode(&mut cursor).map_err(|e| in_entry(index, e.into()))?;
    if header.tag != CsiHeader::TAG {
        warn!(entry = index, tag = %header.tag, "Unexpected CSI header tag");
    }
    // TLV contents (slices, metrics, blend mode, UTI, frame) are not decoded
    cursor
        .skip(header.tlv_length as usize)
        .map_err(|e| in_entry(index, e.into()))?;
    let payload = value.slice(cursor.position()..);

    debug!(
        entry = index,
        name = %header.name,
        pixel_format = %header.pixel_format,
        layout = %header.layout,
        width = header.width,
        height = header.height,
        "Decoding rendition"
    );

    let tag = header.pixel_format;
    let outcome = match tag.as_text().as_str() {
        "ARGB" => decode_image(&header, PixelLayout::Argb, &payload).map(RenditionPayload::Image),
        "GA8" => decode_image(&header, PixelLayout::Ga8, &payload).map(RenditionPayload::Image),
        "RGB5" | "RGBW" | "GA16" => Err(CarError::UnimplementedPixelFormat(tag)),
        "JPEG" | "HEIF" | "DATA" => Ok(RenditionPayload::Unsupported(Unsupported {
            kind: UnsupportedKind::PixelFormat(tag),
            raw: payload,
        })),
        _ if tag.is_zero() => match header.layout {
            LayoutType::Color => Ok(RenditionPayload::Color { raw: payload }),
            LayoutType::MultisizeImage => {
                let mut cursor = ByteCursor::new(&payload, "multisize image set");
                let set = MultisizeImageSet::decode(&mut cursor)
                    .map_err(|e| in_entry(index, e.into()))?;
                Ok(RenditionPayload::MultisizeImageSet(set))
            }
            layout => Ok(RenditionPayload::Unsupported(Unsupported {
                kind: UnsupportedKind::Layout(layout),
                raw: payload,
            })),
        },
        _ => return Err(CarError::UnknownPixelFormat { entry: index, tag }),
    };

    if let Err(e) = &outcome {
        debug!(entry = index, error = %e, "Rendition payload not decoded");
    }

    Ok(Rendition {
        index,
        key,
        header,
        payload: outcome,
    })
}

/// Decode an ARGB or GA8 pixel payload
pub fn decode_image(
    header: &CsiHeader,
    layout: PixelLayout,
    payload: &[u8],
) -> Result<DecodedImage, CarError> {
    let mut cursor = ByteCursor::new(payload, "pixel payload");
    let pixel = PixelRenditionHeader::decode(&mut cursor).map_err(corrupt)?;
    if pixel.tag != PixelRenditionHeader::TAG {
        warn!(tag = %pixel.tag, "Unexpected pixel rendition tag");
    }

    match pixel.version {
        0 | 2 => {
            let length = cursor.u32_le().map_err(corrupt)? as usize;
            let blob = cursor.take(length).map_err(corrupt)?;
            let raw = decompress(pixel.compression, blob)?;
            Ok(DecodedImage {
                buffer: PixelBuffer::from_raw(layout, header.width, header.height, raw)?,
                compression: pixel.compression,
                framing: PayloadFraming::Blob,
            })
        }
        1 | 3 if is_single_stream(pixel.compression, cursor.rest()) => {
            decode_single_stream(header, layout, pixel.compression, &mut cursor)
        }
        1 | 3 => decode_row_chunks(header, layout, pixel.compression, &mut cursor),
        version => Err(CarError::UnsupportedVersion { version }),
    }
}

// Row-chunk framing puts the magic 4 bytes later, after the chunk count
fn is_single_stream(compression: CompressionType, rest: &[u8]) -> bool {
    let magic_at = |offset: usize| {
        rest.get(offset..offset + LZFSE_MAGIC_PREFIX.len())
            .is_some_and(|magic| magic == LZFSE_MAGIC_PREFIX)
    };
    compression == CompressionType::Lzfse
        && magic_at(RowChunkHeader::SIZE)
        && !magic_at(4 + RowChunkHeader::SIZE)
}

fn decode_row_chunks(
    header: &CsiHeader,
    layout: PixelLayout,
    compression: CompressionType,
    cursor: &mut ByteCursor<'_>,
) -> Result<DecodedImage, CarError> {
    let chunks = cursor.u32_le().map_err(corrupt)? as usize;
    if chunks == 0 {
        warn!(name = %header.name, "Row-chunked payload without chunks");
    }

    let mut raw = Vec::new();
    for _ in 0..chunks {
        let chunk = RowChunkHeader::decode(cursor).map_err(corrupt)?;
        let data = cursor.take(chunk.row_data_len as usize).map_err(corrupt)?;
        raw.extend_from_slice(&decompress(compression, data)?);
    }

    debug!(chunks, bytes = raw.len(), "Reassembled row chunks");
    Ok(DecodedImage {
        buffer: PixelBuffer::from_raw(layout, header.width, header.height, raw)?,
        compression,
        framing: PayloadFraming::RowChunks { chunks },
    })
}

fn decode_single_stream(
    header: &CsiHeader,
    layout: PixelLayout,
    compression: CompressionType,
    cursor: &mut ByteCursor<'_>,
) -> Result<DecodedImage, CarError> {
    let chunk = RowChunkHeader::decode(cursor).map_err(corrupt)?;
    let raw = decompress(compression, cursor.rest())?;

    let padded_width = header
        .width
        .checked_add(SINGLE_STREAM_WIDTH_PAD)
        .ok_or_else(|| CarError::corrupt_image(format!("width {} overflows", header.width)))?;
    debug!(
        padded_width,
        rows = header.height,
        chunk_rows = chunk.height,
        bytes = raw.len(),
        "Decoded single-stream payload"
    );

    // Rows past the declared height are never read, so the chunk height is
    // informational only
    let stride = padded_width as usize * layout.bytes_per_pixel();
    let buffer = PixelBuffer::with_stride(layout, padded_width, header.height, stride, raw)?
        .crop(header.width, header.height)?;

    Ok(DecodedImage {
        buffer,
        compression,
        framing: PayloadFraming::SingleStream,
    })
}

fn corrupt(e: Truncated) -> CarError {
    CarError::corrupt_image(e.to_string())
}

fn in_entry(index: usize, e: CarError) -> CarError {
    match e {
        CarError::Truncated(_) | CarError::KeyTooShort { .. } => CarError::Format {
            block: "RENDITIONS",
            reason: format!("entry {}: {}", index, e),
        },
        other => other,
    }
}

/// Lazy walk over the RENDITIONS tree
///
/// Yields `Err` at most once, for a structural failure, and then stops.
pub struct Renditions<'a, R> {
    walker: TreeWalker<'a, R>,
    format: KeyFormat,
    index: usize,
    done: bool,
}

impl<'a, R: Read + Seek> Renditions<'a, R> {
    pub(crate) fn new(walker: TreeWalker<'a, R>, format: KeyFormat) -> Self {
        Self {
            walker,
            format,
            index: 0,
            done: false,
        }
    }
}

impl<R: Read + Seek> Iterator for Renditions<'_, R> {
    type Item = Result<Rendition, CarError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.walker.next()? {
            Ok(item) => decode_rendition(
                self.index,
                &self.format,
                &item.key.as_bytes(),
                item.value.into_bytes(),
            ),
            Err(e) => Err(e.into()),
        };

        self.index += 1;
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
