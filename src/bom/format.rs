// SPDX-License-Identifier: MIT
//! BOM store on-disk structures
//!
//! ```text
//! BOM Store
//! =========
//!
//! Header (512 bytes, big-endian):
//! - Magic: "BOMStore" (8 bytes)
//! - Version: 1 (4 bytes)
//! - Number of blocks: non-null block table entries (4 bytes)
//! - Index offset / length: block table location (4 + 4 bytes)
//! - Vars offset / length: variable directory location (4 + 4 bytes)
//! - Padding (480 bytes)
//!
//! Block table: count (4 bytes), then `count` pointers of
//! (address, length). Entry 0 is always the null pointer.
//!
//! Variable directory: count (4 bytes), then `count` entries of
//! (block index: 4 bytes, name length: 1 byte, name).
//!
//! Tree entry ("tree"): version, root node block, block size, path count.
//! Tree node: leaf flag (2), count (2), forward (4), backward (4), then
//! `count` pairs of (value block, key block).
//! ```

use crate::codec::{ByteCursor, FourCc};

use super::error::BomError;

/// Header magic bytes
pub const BOM_MAGIC: &[u8; 8] = b"BOMStore";

/// Header size in bytes
pub const BOM_HEADER_SIZE: usize = 512;

/// Tag of a tree root descriptor
pub const TREE_TAG: FourCc = FourCc::new(b"tree");

/// Expected tree descriptor version
pub const TREE_VERSION: u32 = 1;

/// Size of a tree node header in bytes
pub const TREE_NODE_HEADER_SIZE: usize = 12;

/// Size of one (value, key) pair in a tree node
pub const TREE_INDEX_SIZE: usize = 8;

/// BOM file header (512 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub version: u32,
    pub number_of_blocks: u32,
    pub index_offset: u32,
    pub index_length: u32,
    pub vars_offset: u32,
    pub vars_length: u32,
}

impl Header {
    /// Decode the header from its first 512 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BomError> {
        if bytes.len() < BOM_HEADER_SIZE {
            return Err(BomError::Format(format!(
                "header must be {} bytes, got {}",
                BOM_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut cursor = ByteCursor::new(bytes, "BOM header");
        Ok(Self {
            magic: cursor.array()?,
            version: cursor.u32_be()?,
            number_of_blocks: cursor.u32_be()?,
            index_offset: cursor.u32_be()?,
            index_length: cursor.u32_be()?,
            vars_offset: cursor.u32_be()?,
            vars_length: cursor.u32_be()?,
        })
    }

    /// Check the magic and that both tables lie inside a source of `source_len` bytes
    pub fn validate(&self, source_len: u64) -> Result<(), BomError> {
        if self.magic != *BOM_MAGIC {
            return Err(BomError::Format(format!(
                "header magic mismatch: expected {:?}, got {:?}",
                String::from_utf8_lossy(BOM_MAGIC),
                String::from_utf8_lossy(&self.magic)
            )));
        }

        let tables = [
            ("block table", self.index_offset, self.index_length),
            ("variable directory", self.vars_offset, self.vars_length),
        ];
        for (what, offset, length) in tables {
            let end = offset as u64 + length as u64;
            if end > source_len {
                return Err(BomError::Format(format!(
                    "{} at {}..{} extends beyond source of {} bytes",
                    what, offset, end, source_len
                )));
            }
        }

        Ok(())
    }
}

/// Extent of one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pointer {
    pub address: u32,
    pub length: u32,
}

impl Pointer {
    #[inline]
    pub fn is_null(&self) -> bool {
        self.address == 0 && self.length == 0
    }
}

/// All block extents, indexed by block number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTable {
    pointers: Vec<Pointer>,
}

impl BlockTable {
    /// Decode the table; entry 0 must be the null pointer
    pub fn decode(bytes: &[u8]) -> Result<Self, BomError> {
        let mut cursor = ByteCursor::new(bytes, "block table");
        let count = cursor.u32_be()? as usize;

        // Each pointer takes 8 bytes, reject absurd counts before allocating
        if count > cursor.remaining() / 8 {
            return Err(BomError::Format(format!(
                "block table claims {} pointers but holds {} bytes",
                count,
                cursor.remaining()
            )));
        }

        let mut pointers = Vec::with_capacity(count);
        for i in 0..count {
            let pointer = Pointer {
                address: cursor.u32_be()?,
                length: cursor.u32_be()?,
            };
            if i == 0 && !pointer.is_null() {
                return Err(BomError::Format(format!(
                    "block table entry 0 must be null, got {:?}",
                    pointer
                )));
            }
            pointers.push(pointer);
        }

        Ok(Self { pointers })
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Pointer for `index`, or `BlockOutOfRange`
    pub fn get(&self, index: u32) -> Result<Pointer, BomError> {
        self.pointers
            .get(index as usize)
            .copied()
            .ok_or(BomError::BlockOutOfRange {
                index,
                count: self.pointers.len(),
            })
    }
}

/// Named reference into the block table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub index: u32,
    pub name: String,
}

/// Decode the variable directory
pub fn decode_vars(bytes: &[u8]) -> Result<Vec<Var>, BomError> {
    let mut cursor = ByteCursor::new(bytes, "variable directory");
    let count = cursor.u32_be()? as usize;

    // Smallest entry is 5 bytes (index + zero-length name)
    let mut vars = Vec::with_capacity(count.min(cursor.remaining() / 5));
    for _ in 0..count {
        let index = cursor.u32_be()?;
        let length = cursor.u8()? as usize;
        let name = String::from_utf8_lossy(cursor.take(length)?).into_owned();
        vars.push(Var { index, name });
    }

    Ok(vars)
}

/// Root descriptor of a named B-tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub tag: FourCc,
    pub version: u32,
    /// Block index of the root node
    pub child: u32,
    pub block_size: u32,
    pub path_count: u32,
}

impl TreeEntry {
    pub fn decode(bytes: &[u8]) -> Result<Self, BomError> {
        let mut cursor = ByteCursor::new(bytes, "tree entry");
        Ok(Self {
            tag: cursor.tag_be()?,
            version: cursor.u32_be()?,
            child: cursor.u32_be()?,
            block_size: cursor.u32_be()?,
            path_count: cursor.u32_be()?,
        })
    }
}

/// One (value, key) pair of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeIndex {
    /// Leaf: value block. Branch: child node block.
    pub value_index: u32,
    pub key_index: u32,
}

/// One on-disk B-tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub is_leaf: bool,
    pub forward: u32,
    pub backward: u32,
    pub indices: Vec<TreeIndex>,
}

impl TreeNode {
    /// Decode a node; the block must hold every pair the header announces
    pub fn decode(bytes: &[u8]) -> Result<Self, BomError> {
        let mut cursor = ByteCursor::new(bytes, "tree node");
        let is_leaf = cursor.u16_be()? != 0;
        let count = cursor.u16_be()? as usize;
        let forward = cursor.u32_be()?;
        let backward = cursor.u32_be()?;

        let needed = count * TREE_INDEX_SIZE;
        if needed > cursor.remaining() {
            return Err(BomError::Format(format!(
                "tree node announces {} entries ({} bytes) but holds {}",
                count,
                needed,
                cursor.remaining()
            )));
        }

        let mut indices = Vec::with_capacity(count);
        for _ in 0..count {
            indices.push(TreeIndex {
                value_index: cursor.u32_be()?,
                key_index: cursor.u32_be()?,
            });
        }

        Ok(Self {
            is_leaf,
            forward,
            backward,
            indices,
        })
    }
}
