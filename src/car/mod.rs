// SPDX-License-Identifier: MIT
//! CoreUI asset catalog (.car) decoding on top of a BOM store

pub mod catalog;
pub mod compression;
pub mod csi;
pub mod error;
pub mod header;
pub mod keys;
pub mod pixels;
pub mod rendition;
pub mod types;

pub use catalog::AssetCatalog;
pub use csi::{CsiHeader, MultisizeImageSet, PixelRenditionHeader, RowChunkHeader};
pub use error::CarError;
pub use header::{CarHeader, ExtendedMetadata, KeyFormat};
pub use keys::{Facet, FacetAttributes, RenditionKey};
pub use pixels::{PixelBuffer, PixelLayout};
pub use rendition::{
    DecodedImage, PayloadFraming, Rendition, RenditionPayload, Renditions, Unsupported,
    UnsupportedKind,
};
pub use types::{ColorSpace, CompressionType, Idiom, LayoutType, RenditionAttributeType, RenditionFlags};
