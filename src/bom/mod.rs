// SPDX-License-Identifier: MIT
//! BOM store container: named blocks and B-trees

pub mod container;
pub mod error;
pub mod format;
pub mod tree;

pub use container::{BlockData, Container};
pub use error::BomError;
pub use format::{BlockTable, Header, Pointer, TreeEntry, TreeIndex, TreeNode, Var, BOM_MAGIC};
pub use tree::{TreeItem, TreeKey, TreeWalker};
