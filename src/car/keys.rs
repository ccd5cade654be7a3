// SPDX-License-Identifier: MIT
//! Rendition keys and the FACETKEYS / APPEARANCEKEYS table records

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::bom::TreeKey;
use crate::codec::{trim_padded, ByteCursor};

use super::error::CarError;
use super::header::KeyFormat;
use super::types::RenditionAttributeType;

/// Attribute tuple identifying one rendition, in key-format order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RenditionKey {
    attributes: Vec<(RenditionAttributeType, u16)>,
}

impl RenditionKey {
    /// Decode one little-endian `u16` per key-format token
    ///
    /// Bytes beyond the schema width are ignored.
    pub fn decode(format: &KeyFormat, bytes: &[u8]) -> Result<Self, CarError> {
        if bytes.len() < format.key_len() {
            return Err(CarError::KeyTooShort {
                expected: format.key_len(),
                actual: bytes.len(),
            });
        }

        let mut cursor = ByteCursor::new(bytes, "rendition key");
        let attributes = format
            .tokens
            .iter()
            .map(|&token| cursor.u16_le().map(|value| (token, value)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { attributes })
    }

    /// Value of the first slot holding `attribute`
    pub fn get(&self, attribute: RenditionAttributeType) -> Option<u16> {
        self.attributes
            .iter()
            .find(|(t, _)| *t == attribute)
            .map(|(_, v)| *v)
    }

    pub fn identifier(&self) -> Option<u16> {
        self.get(RenditionAttributeType::Identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenditionAttributeType, u16)> + '_ {
        self.attributes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Display for RenditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (attribute, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", attribute, value)?;
        }
        Ok(())
    }
}

/// Attribute map of a facet, ordered by attribute code
pub type FacetAttributes = BTreeMap<RenditionAttributeType, u16>;

/// One FACETKEYS record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Facet {
    pub cursor_hot_spot: (u16, u16),
    pub attributes: FacetAttributes,
}

impl Facet {
    /// Decode a little-endian facet value: hot spot, count, (type, value) pairs
    pub fn decode(bytes: &[u8]) -> Result<Self, CarError> {
        let mut cursor = ByteCursor::new(bytes, "FACETKEYS value");
        let cursor_hot_spot = (cursor.u16_le()?, cursor.u16_le()?);
        let count = cursor.u16_le()?;

        let mut attributes = FacetAttributes::new();
        for _ in 0..count {
            let attribute = RenditionAttributeType::from_code(cursor.u16_le()? as u32);
            let value = cursor.u16_le()?;
            attributes.insert(attribute, value);
        }

        Ok(Self {
            cursor_hot_spot,
            attributes,
        })
    }

    pub fn identifier(&self) -> Option<u16> {
        self.attributes
            .get(&RenditionAttributeType::Identifier)
            .copied()
    }
}

/// Decode one APPEARANCEKEYS value: a single big-endian `u16`
pub fn decode_appearance(bytes: &[u8]) -> Result<u16, CarError> {
    Ok(ByteCursor::new(bytes, "APPEARANCEKEYS value").u16_be()?)
}

/// Table name stored in a tree key
pub fn key_name(key: &TreeKey) -> String {
    trim_padded(&key.as_bytes())
}
