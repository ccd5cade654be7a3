// SPDX-License-Identifier: MIT
//! # carbom
//!
//! Reader for BOM store archives and the CoreUI asset catalogs (`.car`)
//! stored inside them.
//!
//! ## Layers
//!
//! - [`bom`]: the container. A fixed header points at a block table and a
//!   directory of named blocks; some named blocks are B-tree roots whose
//!   leaves hold (key block, value block) pairs.
//! - [`car`]: the catalog. Flat records (CARHEADER, EXTENDED_METADATA,
//!   KEYFORMAT), tables (FACETKEYS, APPEARANCEKEYS, BITMAPKEYS) and the
//!   RENDITIONS tree, whose values are decoded into pixel buffers.
//!
//! ## Format Overview
//!
//! ```text
//! BOM store (big-endian)
//! ======================
//!
//! Header (512 bytes):
//! - Magic: "BOMStore" (8 bytes)
//! - Version (4), number of blocks (4)
//! - Index offset (4), index length (4)
//! - Vars offset (4), vars length (4)
//! - Padding (480)
//!
//! Block table: count (4), then (address, length) pairs; entry 0 is null
//! Vars: count (4), then (block index (4), name length (1), name)
//! Tree entry: "tree", version, child block, block size, path count
//! Tree node: is_leaf (2), count (2), forward (4), backward (4),
//!            then (value index, key index) pairs
//! ```
//!
//! Catalog records are little-endian except EXTENDED_METADATA and the
//! APPEARANCEKEYS values, which are big-endian. Four-character tags in
//! little-endian records are stored reversed ("CTAR" is stored "RATC").
//!
//! ## Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::ops::ControlFlow;
//!
//! use carbom::AssetCatalog;
//!
//! let mut catalog = AssetCatalog::open(File::open("Assets.car")?)?;
//! println!("{} renditions", catalog.car_header()?.rendition_count);
//!
//! catalog.images(|name, buffer| {
//!     println!("{name}: {}x{}", buffer.width(), buffer.height());
//!     ControlFlow::Continue(())
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bom;
pub mod car;
pub mod codec;
pub mod config;
pub mod range;

// Re-export main types
pub use bom::{BlockData, BomError, Container, TreeItem, TreeKey, TreeWalker};
pub use car::{
    AssetCatalog, CarError, CarHeader, CompressionType, ExtendedMetadata, Facet, KeyFormat,
    LayoutType, PixelBuffer, PixelLayout, Rendition, RenditionAttributeType, RenditionKey,
    RenditionPayload,
};
pub use codec::FourCc;
pub use config::ExtractConfig;
pub use range::RangeReader;
