// SPDX-License-Identifier: MIT
//! Asset catalog facade over a BOM container

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};
use std::ops::ControlFlow;

use bytes::Bytes;
use tracing::debug;

use crate::bom::{BlockData, BomError, Container, TreeItem};

use super::error::CarError;
use super::header::{CarHeader, ExtendedMetadata, KeyFormat};
use super::keys::{decode_appearance, key_name, Facet};
use super::pixels::PixelBuffer;
use super::rendition::Renditions;

pub const CARHEADER: &str = "CARHEADER";
pub const EXTENDED_METADATA: &str = "EXTENDED_METADATA";
pub const KEYFORMAT: &str = "KEYFORMAT";
pub const APPEARANCEKEYS: &str = "APPEARANCEKEYS";
pub const FACETKEYS: &str = "FACETKEYS";
pub const RENDITIONS: &str = "RENDITIONS";
pub const BITMAPKEYS: &str = "BITMAPKEYS";

/// A CoreUI asset catalog
///
/// Nothing is cached: every accessor re-reads its block or tree from
/// the source.
pub struct AssetCatalog<R> {
    container: Container<R>,
}

impl<R: Read + Seek> AssetCatalog<R> {
    /// Open the BOM store wrapping the catalog
    pub fn open(source: R) -> Result<Self, CarError> {
        Ok(Self::from_container(Container::open(source)?))
    }

    pub fn from_container(container: Container<R>) -> Self {
        Self { container }
    }

    /// Underlying BOM store
    pub fn container(&mut self) -> &mut Container<R> {
        &mut self.container
    }

    pub fn into_container(self) -> Container<R> {
        self.container
    }

    pub fn block_names(&self) -> Vec<&str> {
        self.container.block_names()
    }

    pub fn car_header(&mut self) -> Result<CarHeader, CarError> {
        CarHeader::decode(&self.flat_block(CARHEADER)?)
    }

    pub fn extended_metadata(&mut self) -> Result<ExtendedMetadata, CarError> {
        ExtendedMetadata::decode(&self.flat_block(EXTENDED_METADATA)?)
    }

    pub fn key_format(&mut self) -> Result<KeyFormat, CarError> {
        KeyFormat::decode(&self.flat_block(KEYFORMAT)?)
    }

    /// FACETKEYS as name -> facet
    pub fn facet_keys(&mut self) -> Result<BTreeMap<String, Facet>, CarError> {
        let mut facets = BTreeMap::new();
        self.container.read_tree(FACETKEYS, |item| {
            let name = key_name(&item.key);
            let facet = Facet::decode(item.value.bytes())
                .map_err(|e| table_error(FACETKEYS, &name, e))?;
            facets.insert(name, facet);
            Ok::<_, CarError>(ControlFlow::Continue(()))
        })?;
        debug!(count = facets.len(), "Read facet keys");
        Ok(facets)
    }

    /// APPEARANCEKEYS as name -> appearance value
    pub fn appearance_keys(&mut self) -> Result<BTreeMap<String, u16>, CarError> {
        let mut appearances = BTreeMap::new();
        self.container.read_tree(APPEARANCEKEYS, |item| {
            let name = key_name(&item.key);
            let value = decode_appearance(item.value.bytes())
                .map_err(|e| table_error(APPEARANCEKEYS, &name, e))?;
            appearances.insert(name, value);
            Ok::<_, CarError>(ControlFlow::Continue(()))
        })?;
        Ok(appearances)
    }

    /// BITMAPKEYS entries, undecoded
    pub fn bitmap_keys(&mut self) -> Result<Vec<TreeItem>, CarError> {
        Ok(self
            .container
            .tree_walker(BITMAPKEYS)?
            .collect::<Result<Vec<_>, BomError>>()?)
    }

    /// Lazily decode RENDITIONS in stored order
    pub fn renditions(&mut self) -> Result<Renditions<'_, R>, CarError> {
        let format = self.key_format()?;
        let walker = self.container.tree_walker(RENDITIONS)?;
        Ok(Renditions::new(walker, format))
    }

    /// Visit every decoded image with its facet name
    ///
    /// The name is the facet whose Identifier matches the rendition key,
    /// or the CSI name when no facet matches. Entries that did not decode
    /// to an image are skipped; structural errors end the walk.
    pub fn images<F>(&mut self, mut visit: F) -> Result<(), CarError>
    where
        F: FnMut(&str, &PixelBuffer) -> ControlFlow<()>,
    {
        let names = self.facet_names()?;
        for rendition in self.renditions()? {
            let rendition = rendition?;
            let Some(image) = rendition.image() else {
                continue;
            };
            let name = rendition
                .key
                .identifier()
                .and_then(|id| names.get(&id))
                .map(String::as_str)
                .unwrap_or(&rendition.header.name);
            if visit(name, &image.buffer).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Largest decoded image for the named facet
    ///
    /// Returns `Ok(None)` when the facet exists but no rendition with its
    /// Identifier decodes to an image.
    pub fn image(&mut self, facet_name: &str) -> Result<Option<PixelBuffer>, CarError> {
        let facet = self
            .facet_keys()?
            .remove(facet_name)
            .ok_or_else(|| BomError::NameNotFound(facet_name.to_string()))?;
        let Some(identifier) = facet.identifier() else {
            return Ok(None);
        };

        let mut best: Option<PixelBuffer> = None;
        for rendition in self.renditions()? {
            let rendition = rendition?;
            if rendition.key.identifier() != Some(identifier) {
                continue;
            }
            let Some(image) = rendition.image() else {
                continue;
            };
            let area = |b: &PixelBuffer| b.width() as u64 * b.height() as u64;
            if best.as_ref().is_none_or(|b| area(&image.buffer) > area(b)) {
                best = Some(image.buffer.clone());
            }
        }
        Ok(best)
    }

    /// Identifier -> first facet name carrying it
    fn facet_names(&mut self) -> Result<HashMap<u16, String>, CarError> {
        let mut names = HashMap::new();
        for (name, facet) in self.facet_keys()? {
            if let Some(id) = facet.identifier() {
                names.entry(id).or_insert(name);
            }
        }
        Ok(names)
    }

    fn flat_block(&mut self, name: &'static str) -> Result<Bytes, CarError> {
        match self.container.read_block(name)? {
            BlockData::Data(bytes) => Ok(bytes),
            BlockData::Empty => Err(CarError::Format {
                block: name,
                reason: "block is empty".to_string(),
            }),
        }
    }
}

fn table_error(block: &'static str, name: &str, e: CarError) -> CarError {
    match e {
        CarError::Truncated(_) => CarError::Format {
            block,
            reason: format!("entry {:?}: {}", name, e),
        },
        other => other,
    }
}
