// SPDX-License-Identifier: MIT
//! B-tree traversal
//!
//! Trees are walked for full in-order scans, never point lookups: the
//! walker follows the first child of every branch down to the leftmost
//! leaf, then yields each leaf's pairs in stored order and moves on via
//! the forward sibling link. Stored order is the effective sort order of
//! every CAR table and is preserved exactly.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Read, Seek};

use tracing::{debug, warn};

use super::container::{BlockData, Container};
use super::error::BomError;
use super::format::{TreeEntry, TreeNode, TREE_TAG, TREE_VERSION};

/// Deepest branch chain accepted before the tree is declared corrupt
pub const MAX_TREE_DEPTH: usize = 64;

/// Key side of a tree entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeKey {
    /// The key index resolved to a block
    Stored(BlockData),
    /// The key index is not a block table index; some trees keep small
    /// integer keys inline instead of pointing at a name block
    Inline(u32),
}

impl TreeKey {
    /// Key bytes; inline keys are rendered as 4 big-endian bytes
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            TreeKey::Stored(data) => Cow::Borrowed(data.bytes()),
            TreeKey::Inline(value) => Cow::Owned(value.to_be_bytes().to_vec()),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, TreeKey::Inline(_))
    }
}

/// One (key, value) pair from a tree leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub key_index: u32,
    pub value_index: u32,
    pub key: TreeKey,
    pub value: BlockData,
}

/// Lazy, finite, non-restartable walk over one named tree
///
/// After the first error the walker yields nothing more.
pub struct TreeWalker<'a, R> {
    container: &'a mut Container<R>,
    name: String,
    entry: TreeEntry,
    leaf: TreeNode,
    position: usize,
    visited: HashSet<u32>,
    done: bool,
}

impl<'a, R: Read + Seek> TreeWalker<'a, R> {
    pub(crate) fn new(container: &'a mut Container<R>, name: &str) -> Result<Self, BomError> {
        let entry = match container.read_block(name)? {
            BlockData::Data(bytes) => TreeEntry::decode(&bytes).map_err(|e| corrupt(name, e))?,
            BlockData::Empty => return Err(corrupt(name, "tree entry block is empty")),
        };

        if entry.tag != TREE_TAG {
            return Err(corrupt(
                name,
                format!("expected tag {}, got {}", TREE_TAG, entry.tag),
            ));
        }
        if entry.version != TREE_VERSION {
            warn!(tree = name, version = entry.version, "Unexpected tree version");
        }

        let mut node_index = entry.child;
        let mut node = read_node(container, name, node_index)?;
        let mut depth = 0;
        while !node.is_leaf {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(corrupt(
                    name,
                    format!("branch chain deeper than {}", MAX_TREE_DEPTH),
                ));
            }
            let first = node
                .indices
                .first()
                .ok_or_else(|| corrupt(name, format!("branch node {} has no children", node_index)))?;
            node_index = first.value_index;
            node = read_node(container, name, node_index)?;
        }

        debug!(
            tree = name,
            root = entry.child,
            leaf = node_index,
            depth,
            paths = entry.path_count,
            "Descended to first leaf"
        );

        let mut visited = HashSet::new();
        visited.insert(node_index);

        Ok(Self {
            container,
            name: name.to_string(),
            entry,
            leaf: node,
            position: 0,
            visited,
            done: false,
        })
    }

    /// Root descriptor of the tree being walked
    pub fn entry(&self) -> &TreeEntry {
        &self.entry
    }

    fn advance(&mut self) -> Result<Option<TreeItem>, BomError> {
        loop {
            if let Some(index) = self.leaf.indices.get(self.position).copied() {
                self.position += 1;

                let key = match self.container.block(index.key_index) {
                    Ok(data) => TreeKey::Stored(data),
                    Err(BomError::BlockOutOfRange { .. }) => {
                        warn!(tree = %self.name, key = index.key_index, "Inline tree key");
                        TreeKey::Inline(index.key_index)
                    }
                    Err(e) => return Err(e),
                };
                let value = self.container.block(index.value_index)?;

                return Ok(Some(TreeItem {
                    key_index: index.key_index,
                    value_index: index.value_index,
                    key,
                    value,
                }));
            }

            let forward = self.leaf.forward;
            if forward == 0 {
                return Ok(None);
            }
            if !self.visited.insert(forward) {
                return Err(corrupt(
                    &self.name,
                    format!("forward link cycle at block {}", forward),
                ));
            }

            let node = read_node(self.container, &self.name, forward)?;
            if !node.is_leaf {
                return Err(corrupt(
                    &self.name,
                    format!("forward link to branch node {}", forward),
                ));
            }
            self.leaf = node;
            self.position = 0;
        }
    }
}

impl<R: Read + Seek> Iterator for TreeWalker<'_, R> {
    type Item = Result<TreeItem, BomError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_node<R: Read + Seek>(
    container: &mut Container<R>,
    name: &str,
    index: u32,
) -> Result<TreeNode, BomError> {
    match container.block(index)? {
        BlockData::Data(bytes) => TreeNode::decode(&bytes).map_err(|e| corrupt(name, e)),
        BlockData::Empty => Err(corrupt(name, format!("node block {} is empty", index))),
    }
}

fn corrupt(name: &str, reason: impl ToString) -> BomError {
    BomError::CorruptTree {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
