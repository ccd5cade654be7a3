// SPDX-License-Identifier: MIT
//! Pixel payload decompression
//!
//! Codecs are consumed as plain `bytes -> bytes` functions. Any codec
//! failure is returned as [`CarError::Decompression`].

use std::io::{self, Read};

use flate2::read::{GzDecoder, ZlibDecoder};

use super::error::CarError;
use super::types::CompressionType;

/// gzip member magic
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Decompress one payload blob
pub fn decompress(compression: CompressionType, data: &[u8]) -> Result<Vec<u8>, CarError> {
    match compression {
        CompressionType::Uncompressed => Ok(data.to_vec()),
        CompressionType::Zip => inflate(data).map_err(|source| CarError::Decompression {
            codec: compression,
            source,
        }),
        CompressionType::Lzfse => {
            let mut decoded = Vec::with_capacity(estimated_size(data));
            lzfse_rust::decode_bytes(data, &mut decoded).map_err(|e| {
                CarError::Decompression {
                    codec: compression,
                    source: io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
                }
            })?;
            Ok(decoded)
        }
        other => Err(CarError::UnsupportedCompression(other)),
    }
}

/// Inflate a gzip member, or a zlib stream when the gzip magic is absent
fn inflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(estimated_size(data));
    if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut decompressed)?;
    } else {
        ZlibDecoder::new(data).read_to_end(&mut decompressed)?;
    }
    Ok(decompressed)
}

/// Pixel data typically compresses 3-4x
#[inline]
fn estimated_size(data: &[u8]) -> usize {
    data.len().saturating_mul(4).max(1024)
}
