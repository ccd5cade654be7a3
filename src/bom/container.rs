// SPDX-License-Identifier: MIT
//! BOM store reader

use std::io::{Read, Seek, SeekFrom};
use std::ops::ControlFlow;

use bytes::Bytes;
use tracing::debug;

use crate::range::RangeReader;

use super::error::BomError;
use super::format::{decode_vars, BlockTable, Header, Var, BOM_HEADER_SIZE};
use super::tree::{TreeItem, TreeWalker};

/// Contents of one resolved block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockData {
    /// The block table entry has length 0
    Empty,
    Data(Bytes),
}

impl BlockData {
    /// Bytes of the block; empty for [`BlockData::Empty`]
    pub fn bytes(&self) -> &[u8] {
        match self {
            BlockData::Empty => &[],
            BlockData::Data(bytes) => bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            BlockData::Empty => Bytes::new(),
            BlockData::Data(bytes) => bytes,
        }
    }
}

/// An opened BOM store
///
/// Header, block table and variable directory are parsed once in
/// [`Container::open`]; every block read afterwards goes back to the
/// source. Reads move the source cursor, so methods that touch blocks
/// take `&mut self`.
pub struct Container<R> {
    source: R,
    source_len: u64,
    header: Header,
    blocks: BlockTable,
    vars: Vec<Var>,
}

impl<R: Read + Seek> Container<R> {
    /// Parse the header, block table and variable directory
    pub fn open(mut source: R) -> Result<Self, BomError> {
        let source_len = source.seek(SeekFrom::End(0))?;
        if source_len < BOM_HEADER_SIZE as u64 {
            return Err(BomError::Format(format!(
                "source is {} bytes, smaller than the {}-byte header",
                source_len, BOM_HEADER_SIZE
            )));
        }

        let raw_header = RangeReader::new(&mut source, 0, BOM_HEADER_SIZE as u64).read_to_bytes()?;
        let header = Header::from_bytes(&raw_header)?;
        header.validate(source_len)?;

        let raw_table = RangeReader::new(
            &mut source,
            header.index_offset as u64,
            header.index_length as u64,
        )
        .read_to_bytes()?;
        let blocks = BlockTable::decode(&raw_table)?;

        let raw_vars = RangeReader::new(
            &mut source,
            header.vars_offset as u64,
            header.vars_length as u64,
        )
        .read_to_bytes()?;
        let vars = decode_vars(&raw_vars)?;

        debug!(
            version = header.version,
            blocks = blocks.len(),
            vars = vars.len(),
            "Parsed BOM store header"
        );

        Ok(Self {
            source,
            source_len,
            header,
            blocks,
            vars,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn block_table(&self) -> &BlockTable {
        &self.blocks
    }

    /// Variable directory entries in stored order
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    /// Every name in the variable directory, in stored order
    pub fn block_names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    /// First directory entry with `name`
    pub fn var(&self, name: &str) -> Result<&Var, BomError> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| BomError::NameNotFound(name.to_string()))
    }

    /// Read the named block
    pub fn read_block(&mut self, name: &str) -> Result<BlockData, BomError> {
        let index = self.var(name)?.index;
        self.block(index)
    }

    /// Read a block by table index
    pub fn block(&mut self, index: u32) -> Result<BlockData, BomError> {
        let reader = self.block_reader(index)?;
        if reader.is_empty() {
            return Ok(BlockData::Empty);
        }
        Ok(BlockData::Data(reader.read_to_bytes()?))
    }

    /// Streaming reader over a block by table index
    pub fn block_reader(&mut self, index: u32) -> Result<RangeReader<'_, R>, BomError> {
        let pointer = self.blocks.get(index)?;
        let end = pointer.address as u64 + pointer.length as u64;
        if pointer.length != 0 && end > self.source_len {
            return Err(BomError::BlockBeyondSource {
                index,
                address: pointer.address,
                length: pointer.length,
                source_len: self.source_len,
            });
        }
        Ok(RangeReader::new(
            &mut self.source,
            pointer.address as u64,
            pointer.length as u64,
        ))
    }

    /// Lazily walk the named B-tree in stored leaf order
    pub fn tree_walker(&mut self, name: &str) -> Result<TreeWalker<'_, R>, BomError> {
        TreeWalker::new(self, name)
    }

    /// Visit every entry of the named B-tree
    ///
    /// The walk stops as soon as `visit` returns `ControlFlow::Break` or
    /// an error; the first error is returned and no further leaves are read.
    pub fn read_tree<E, F>(&mut self, name: &str, mut visit: F) -> Result<(), E>
    where
        E: From<BomError>,
        F: FnMut(TreeItem) -> Result<ControlFlow<()>, E>,
    {
        for item in self.tree_walker(name)? {
            if visit(item?)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Source length in bytes
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}
