// SPDX-License-Identifier: MIT
//! Flat catalog-level records: CARHEADER, EXTENDED_METADATA, KEYFORMAT
//!
//! CARHEADER and KEYFORMAT are little-endian; EXTENDED_METADATA is
//! big-endian.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::codec::{ByteCursor, FourCc};

use super::error::CarError;
use super::types::RenditionAttributeType;

/// Catalog header ("CTAR")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarHeader {
    pub tag: FourCc,
    pub coreui_version: u32,
    pub storage_version: u32,
    pub storage_timestamp: u32,
    pub rendition_count: u32,
    pub main_version_string: String,
    pub version_string: String,
    pub uuid: Uuid,
    pub associated_checksum: u32,
    pub schema_version: u32,
    pub color_space_id: u32,
    pub key_semantics: u32,
}

impl CarHeader {
    pub const TAG: FourCc = FourCc::new(b"CTAR");

    pub fn decode(bytes: &[u8]) -> Result<Self, CarError> {
        let mut cursor = ByteCursor::new(bytes, "CARHEADER");
        Ok(Self {
            tag: cursor.tag_le()?,
            coreui_version: cursor.u32_le()?,
            storage_version: cursor.u32_le()?,
            storage_timestamp: cursor.u32_le()?,
            rendition_count: cursor.u32_le()?,
            main_version_string: cursor.padded_str(128)?,
            version_string: cursor.padded_str(256)?,
            uuid: Uuid::from_bytes(cursor.array()?),
            associated_checksum: cursor.u32_le()?,
            schema_version: cursor.u32_le()?,
            color_space_id: cursor.u32_le()?,
            key_semantics: cursor.u32_le()?,
        })
    }

    /// Storage timestamp as a date, when non-zero
    pub fn storage_time(&self) -> Option<DateTime<Utc>> {
        if self.storage_timestamp == 0 {
            return None;
        }
        DateTime::from_timestamp(self.storage_timestamp as i64, 0)
    }
}

/// Authoring metadata ("META")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedMetadata {
    pub tag: FourCc,
    pub thinning_arguments: String,
    pub deployment_platform_version: String,
    pub deployment_platform: String,
    pub authoring_tool: String,
}

impl ExtendedMetadata {
    pub const TAG: FourCc = FourCc::new(b"META");

    pub fn decode(bytes: &[u8]) -> Result<Self, CarError> {
        let mut cursor = ByteCursor::new(bytes, "EXTENDED_METADATA");
        Ok(Self {
            tag: cursor.tag_be()?,
            thinning_arguments: cursor.padded_str(256)?,
            deployment_platform_version: cursor.padded_str(256)?,
            deployment_platform: cursor.padded_str(256)?,
            authoring_tool: cursor.padded_str(256)?,
        })
    }
}

/// Rendition key schema ("kfmt")
///
/// Position `i` of `tokens` names the attribute stored in the `i`-th
/// 16-bit slot of every RENDITIONS key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFormat {
    pub tag: FourCc,
    pub version: u32,
    pub tokens: Vec<RenditionAttributeType>,
}

impl KeyFormat {
    pub const TAG: FourCc = FourCc::new(b"kfmt");

    pub fn decode(bytes: &[u8]) -> Result<Self, CarError> {
        let mut cursor = ByteCursor::new(bytes, "KEYFORMAT");
        let tag = cursor.tag_le()?;
        let version = cursor.u32_le()?;
        let count = cursor.u32_le()? as usize;

        if count > cursor.remaining() / 4 {
            return Err(CarError::Format {
                block: "KEYFORMAT",
                reason: format!(
                    "{} key tokens announced, {} bytes left",
                    count,
                    cursor.remaining()
                ),
            });
        }

        let tokens = (0..count)
            .map(|_| cursor.u32_le().map(RenditionAttributeType::from_code))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tag,
            version,
            tokens,
        })
    }

    /// Number of 16-bit slots in each rendition key
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Key width in bytes
    pub fn key_len(&self) -> usize {
        self.tokens.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(s: &str, width: usize) -> Vec<u8> {
        let mut out = s.as_bytes().to_vec();
        out.resize(width, 0);
        out
    }

    #[test]
    fn test_car_header_decode() {
        let mut bytes = b"RATC".to_vec();
        for v in [691u32, 17, 0, 7] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend(padded("@(#)PROGRAM:CoreUI  PROJECT:CoreUI-691.2\n", 128));
        bytes.extend(padded("Xcode 12.5 (12E262)", 256));
        bytes.extend_from_slice(&[0u8; 16]);
        for v in [0u32, 2, 1, 2] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let header = CarHeader::decode(&bytes).unwrap();
        assert_eq!(header.tag, CarHeader::TAG);
        assert_eq!(header.coreui_version, 691);
        assert_eq!(header.rendition_count, 7);
        assert_eq!(header.version_string, "Xcode 12.5 (12E262)");
        assert!(header.uuid.is_nil());
        assert_eq!(header.key_semantics, 2);
        assert_eq!(header.storage_time(), None);
    }

    #[test]
    fn test_car_header_truncated() {
        let err = CarHeader::decode(&[0u8; 40]).unwrap_err();
        assert!(matches!(err, CarError::Truncated(t) if t.context == "CARHEADER"));
    }

    #[test]
    fn test_extended_metadata_is_big_endian_tag() {
        let mut bytes = b"META".to_vec();
        bytes.extend(padded("", 256));
        bytes.extend(padded("13.1", 256));
        bytes.extend(padded("ios", 256));
        bytes.extend(padded("CoreThemeDefinition", 256));

        let meta = ExtendedMetadata::decode(&bytes).unwrap();
        assert_eq!(meta.tag, ExtendedMetadata::TAG);
        assert_eq!(meta.deployment_platform_version, "13.1");
        assert_eq!(meta.deployment_platform, "ios");
    }

    #[test]
    fn test_key_format_decode() {
        let mut bytes = b"tmfk".to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        for code in [12u32, 15, 99] {
            bytes.extend_from_slice(&code.to_le_bytes());
        }

        let format = KeyFormat::decode(&bytes).unwrap();
        assert_eq!(format.tag, KeyFormat::TAG);
        assert_eq!(
            format.tokens,
            vec![
                RenditionAttributeType::Scale,
                RenditionAttributeType::Idiom,
                RenditionAttributeType::Unknown(99),
            ]
        );
        assert_eq!(format.key_len(), 6);
    }

    #[test]
    fn test_key_format_count_too_large() {
        let mut bytes = b"tmfk".to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        assert!(matches!(
            KeyFormat::decode(&bytes),
            Err(CarError::Format { block: "KEYFORMAT", .. })
        ));
    }
}
