// SPDX-License-Identifier: MIT
use thiserror::Error;

use crate::codec::Truncated;

/// Errors raised while reading a BOM store
#[derive(Debug, Error)]
pub enum BomError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Name not found: {0}")]
    NameNotFound(String),

    #[error("Block index {index} out of range (block table has {count} entries)")]
    BlockOutOfRange { index: u32, count: usize },

    #[error(
        "Block {index} at {address}+{length} extends beyond source of {source_len} bytes"
    )]
    BlockBeyondSource {
        index: u32,
        address: u32,
        length: u32,
        source_len: u64,
    },

    #[error("Corrupt tree {name}: {reason}")]
    CorruptTree { name: String, reason: String },

    #[error(transparent)]
    Truncated(#[from] Truncated),
}
