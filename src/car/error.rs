// SPDX-License-Identifier: MIT
use thiserror::Error;

use crate::bom::BomError;
use crate::codec::{FourCc, Truncated};

use super::types::CompressionType;

/// Errors raised while decoding an asset catalog
#[derive(Debug, Error)]
pub enum CarError {
    #[error(transparent)]
    Bom(#[from] BomError),

    #[error("Invalid {block}: {reason}")]
    Format { block: &'static str, reason: String },

    #[error("Rendition key has {actual} bytes, key format needs {expected}")]
    KeyTooShort { expected: usize, actual: usize },

    #[error("Unsupported compression: {0} (code {code})", code = .0.code())]
    UnsupportedCompression(CompressionType),

    #[error("Unimplemented pixel format: {0}")]
    UnimplementedPixelFormat(FourCc),

    #[error("Unknown pixel format {tag:?} in rendition {entry}")]
    UnknownPixelFormat { entry: usize, tag: FourCc },

    #[error("Unsupported pixel rendition version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Corrupt image: {reason}")]
    CorruptImage { reason: String },

    #[error("Decompression error ({codec}): {source}")]
    Decompression {
        codec: CompressionType,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Truncated(#[from] Truncated),
}

impl CarError {
    /// Catalogued cases this decoder knowingly does not handle yet
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            CarError::UnsupportedCompression(_)
                | CarError::UnimplementedPixelFormat(_)
                | CarError::UnsupportedVersion { .. }
        )
    }

    /// Errors that abort a whole rendition walk rather than one entry
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CarError::Bom(_)
                | CarError::Format { .. }
                | CarError::KeyTooShort { .. }
                | CarError::UnknownPixelFormat { .. }
                | CarError::Truncated(_)
        )
    }

    pub(crate) fn corrupt_image(reason: impl Into<String>) -> Self {
        CarError::CorruptImage {
            reason: reason.into(),
        }
    }
}
