//! Shared test fixtures: an in-memory BOM store writer and a sample catalog
//!
//! The sample catalog reproduces the header values of a small iOS asset
//! catalog and adds renditions covering every payload shape the decoder
//! distinguishes.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use carbom::AssetCatalog;

/// Builds a BOM store block by block
pub struct BomBuilder {
    /// Index 0 is the reserved null block
    blocks: Vec<Vec<u8>>,
    vars: Vec<(u32, String)>,
}

impl Default for BomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BomBuilder {
    pub fn new() -> Self {
        Self {
            blocks: vec![Vec::new()],
            vars: Vec::new(),
        }
    }

    /// Append a block and return its index
    pub fn block(&mut self, data: impl Into<Vec<u8>>) -> u32 {
        self.blocks.push(data.into());
        (self.blocks.len() - 1) as u32
    }

    /// Replace the contents of an already allocated block
    pub fn set_block(&mut self, index: u32, data: impl Into<Vec<u8>>) {
        self.blocks[index as usize] = data.into();
    }

    pub fn name(&mut self, name: &str, index: u32) {
        self.vars.push((index, name.to_string()));
    }

    pub fn named_block(&mut self, name: &str, data: impl Into<Vec<u8>>) -> u32 {
        let index = self.block(data);
        self.name(name, index);
        index
    }

    /// Index one past the current last block
    pub fn next_index(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Leaf node over (value index, key index) pairs
    pub fn leaf(&mut self, pairs: &[(u32, u32)], forward: u32, backward: u32) -> u32 {
        self.block(node_bytes(true, pairs, forward, backward))
    }

    /// Branch node over (child index, key index) pairs
    pub fn branch(&mut self, children: &[(u32, u32)]) -> u32 {
        self.block(node_bytes(false, children, 0, 0))
    }

    /// Tree root descriptor named `name` pointing at `child`
    pub fn tree_entry(&mut self, name: &str, child: u32, path_count: u32) -> u32 {
        let mut bytes = b"tree".to_vec();
        for v in [1u32, child, 4096, path_count] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        self.named_block(name, bytes)
    }

    /// Named tree holding `entries` in order, `per_leaf` pairs per leaf
    ///
    /// Leaves are chained by forward/backward links under one branch node
    /// when more than one leaf is needed.
    pub fn tree(&mut self, name: &str, entries: &[(Vec<u8>, Vec<u8>)], per_leaf: usize) -> u32 {
        let pairs: Vec<(u32, u32)> = entries
            .iter()
            .map(|(key, value)| {
                let key = self.block(key.clone());
                let value = self.block(value.clone());
                (value, key)
            })
            .collect();

        let chunks: Vec<&[(u32, u32)]> = if pairs.is_empty() {
            vec![&pairs[..]]
        } else {
            pairs.chunks(per_leaf.max(1)).collect()
        };

        // Reserve leaf indices so forward links can be written up front
        let first = self.next_index();
        let leaves: Vec<u32> = (0..chunks.len() as u32).map(|i| first + i).collect();
        for _ in &leaves {
            self.block(Vec::new());
        }
        for (i, chunk) in chunks.iter().enumerate() {
            let forward = leaves.get(i + 1).copied().unwrap_or(0);
            let backward = if i == 0 { 0 } else { leaves[i - 1] };
            self.set_block(leaves[i], node_bytes(true, chunk, forward, backward));
        }

        let root = if leaves.len() == 1 {
            leaves[0]
        } else {
            let children: Vec<(u32, u32)> = leaves
                .iter()
                .zip(chunks.iter())
                .map(|(&leaf, chunk)| (leaf, chunk.last().map_or(0, |p| p.1)))
                .collect();
            self.branch(&children)
        };

        self.tree_entry(name, root, entries.len() as u32)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; 512];

        let mut pointers = vec![(0u32, 0u32)];
        for data in &self.blocks[1..] {
            pointers.push((out.len() as u32, data.len() as u32));
            out.extend_from_slice(data);
        }

        let index_offset = out.len() as u32;
        out.extend_from_slice(&(pointers.len() as u32).to_be_bytes());
        for (address, length) in &pointers {
            out.extend_from_slice(&address.to_be_bytes());
            out.extend_from_slice(&length.to_be_bytes());
        }
        let index_length = out.len() as u32 - index_offset;

        let vars_offset = out.len() as u32;
        out.extend_from_slice(&(self.vars.len() as u32).to_be_bytes());
        for (index, name) in &self.vars {
            out.extend_from_slice(&index.to_be_bytes());
            out.push(name.len() as u8);
            out.extend_from_slice(name.as_bytes());
        }
        let vars_length = out.len() as u32 - vars_offset;

        let mut header = b"BOMStore".to_vec();
        for v in [
            1u32,
            self.blocks.len() as u32,
            index_offset,
            index_length,
            vars_offset,
            vars_length,
        ] {
            header.extend_from_slice(&v.to_be_bytes());
        }
        out[..header.len()].copy_from_slice(&header);
        out
    }
}

pub fn node_bytes(is_leaf: bool, pairs: &[(u32, u32)], forward: u32, backward: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(12 + pairs.len() * 8);
    bytes.extend_from_slice(&(is_leaf as u16).to_be_bytes());
    bytes.extend_from_slice(&(pairs.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&forward.to_be_bytes());
    bytes.extend_from_slice(&backward.to_be_bytes());
    for (value, key) in pairs {
        bytes.extend_from_slice(&value.to_be_bytes());
        bytes.extend_from_slice(&key.to_be_bytes());
    }
    bytes
}

pub fn padded(s: &str, width: usize) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.resize(width, 0);
    out
}

fn push_u32_le(out: &mut Vec<u8>, values: &[u32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Four-character tag as a little-endian writer stores it
pub fn tag_le(chars: &[u8; 4]) -> [u8; 4] {
    [chars[3], chars[2], chars[1], chars[0]]
}

pub const MAIN_VERSION: &str = "@(#)PROGRAM:CoreUI  PROJECT:CoreUI-691.2\n";
pub const VERSION: &str = "Xcode 12.5 (12E262) via IBCocoaTouchImageCatalogTool";
pub const UUID: [u8; 16] = [
    0x5B, 0x1D, 0x2C, 0x6E, 0x8A, 0x43, 0x4F, 0x1E, 0x9C, 0x7D, 0x01, 0x22, 0x33, 0x44, 0x55, 0x66,
];
pub const STORAGE_TIMESTAMP: u32 = 1_620_000_000;

pub fn car_header_bytes() -> Vec<u8> {
    let mut out = tag_le(b"CTAR").to_vec();
    push_u32_le(&mut out, &[691, 17, STORAGE_TIMESTAMP, 7]);
    out.extend(padded(MAIN_VERSION, 128));
    out.extend(padded(VERSION, 256));
    out.extend_from_slice(&UUID);
    push_u32_le(&mut out, &[0xDEAD_BEEF, 2, 1, 2]);
    out
}

pub fn extended_metadata_bytes() -> Vec<u8> {
    let mut out = b"META".to_vec();
    out.extend(padded("", 256));
    out.extend(padded("13.1", 256));
    out.extend(padded("ios", 256));
    out.extend(padded("@(#)PROGRAM:CoreThemeDefinition  PROJECT:CoreThemeDefinition-491\n", 256));
    out
}

/// Scale, Idiom, Subtype, Dimension2, Identifier, Element, Part
pub const KEY_TOKENS: [u32; 7] = [12, 15, 16, 9, 17, 1, 2];

pub fn key_format_bytes(tokens: &[u32]) -> Vec<u8> {
    let mut out = tag_le(b"kfmt").to_vec();
    push_u32_le(&mut out, &[0, tokens.len() as u32]);
    push_u32_le(&mut out, tokens);
    out
}

/// FACETKEYS value over (attribute code, value) pairs
pub fn facet_bytes(attributes: &[(u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [0u16, 0, attributes.len() as u16] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for (attribute, value) in attributes {
        out.extend_from_slice(&attribute.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// RENDITIONS key in `KEY_TOKENS` order
pub fn rendition_key(scale: u16, identifier: u16) -> Vec<u8> {
    [scale, 1, 0, 0, identifier, 0x55, 0xB5]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

pub const ICON_ID: u16 = 0x1AC1;
pub const TEST_ID: u16 = 0x41A3;
pub const TEST2_ID: u16 = 0x684F;
pub const TEST3_ID: u16 = 0xF4B0;

/// Fixed CSI header fields of a test rendition
pub struct Csi<'a> {
    pub name: &'a str,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    /// Tag in reading order, e.g. `b"ARGB"` or `b"GA8 "`; zero for layout-driven payloads
    pub pixel_format: [u8; 4],
    pub layout: u16,
    pub tlv: Vec<u8>,
}

impl<'a> Csi<'a> {
    pub fn image(name: &'a str, pixel_format: &[u8; 4], width: u32, height: u32) -> Self {
        Self {
            name,
            width,
            height,
            scale: 200,
            pixel_format: *pixel_format,
            layout: 0x0C,
            tlv: Vec::new(),
        }
    }

    /// CSI header, TLV trailer, then `payload`
    pub fn value(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = tag_le(b"CTSI").to_vec();
        push_u32_le(&mut out, &[1, 0, self.width, self.height, self.scale]);
        if self.pixel_format == [0; 4] {
            out.extend_from_slice(&[0; 4]);
        } else {
            out.extend_from_slice(&tag_le(&self.pixel_format));
        }
        push_u32_le(&mut out, &[1, 0]);
        out.extend_from_slice(&self.layout.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend(padded(self.name, 128));
        push_u32_le(&mut out, &[self.tlv.len() as u32, 0, 0, payload.len() as u32]);
        out.extend_from_slice(&self.tlv);
        out.extend_from_slice(payload);
        out
    }
}

fn celm(version: u32, compression: u32) -> Vec<u8> {
    let mut out = tag_le(b"CELM").to_vec();
    push_u32_le(&mut out, &[version, compression]);
    out
}

/// Version 0 payload: one length-prefixed blob
pub fn blob_payload(compression: u32, blob: &[u8]) -> Vec<u8> {
    let mut out = celm(0, compression);
    push_u32_le(&mut out, &[blob.len() as u32]);
    out.extend_from_slice(blob);
    out
}

/// Row chunk header announcing `rows` rows and `len` bytes of data
pub fn chunk_header(rows: u32, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    push_u32_le(&mut out, &[0, 0, rows]);
    out.extend_from_slice(&(len as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// Version 1 payload of independently compressed row chunks
pub fn chunked_payload(compression: u32, chunks: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = celm(1, compression);
    push_u32_le(&mut out, &[chunks.len() as u32]);
    for (rows, data) in chunks {
        out.extend(chunk_header(*rows, data.len()));
        out.extend_from_slice(data);
    }
    out
}

/// Version 3 LZFSE payload: one chunk header then one stream
pub fn single_stream_payload(rows: u32, stream: &[u8]) -> Vec<u8> {
    let mut out = celm(3, 4);
    out.extend(chunk_header(rows, stream.len()));
    out.extend_from_slice(stream);
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn lzfse(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    lzfse_rust::encode_bytes(data, &mut out).unwrap();
    out
}

/// Stored BGRA bytes for `width` x `height` pixels; pixel (x, y) has
/// red = x, green = y, blue = seed, alpha = 255
pub fn bgra(width: u32, height: u32, padding: u32, seed: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for y in 0..height {
        for x in 0..width + padding {
            out.extend_from_slice(&[seed, y as u8, x as u8, 0xFF]);
        }
    }
    out
}

/// Gray + alpha bytes; pixel (x, y) has gray = 10 * y + x
pub fn gray_alpha(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    for y in 0..height {
        for x in 0..width {
            out.extend_from_slice(&[(10 * y + x) as u8, 0x80]);
        }
    }
    out
}

/// Rendition entries of the sample catalog, in stored order
///
/// | index | facet   | payload                                   | outcome                 |
/// |-------|---------|-------------------------------------------|-------------------------|
/// | 0     | AppIcon | ARGB 2x2, gzip blob                       | image                   |
/// | 1     | AppIcon | ARGB 4x4, raw blob, 1 px row padding      | image                   |
/// | 2     | test    | GA8 3x2, two zlib row chunks              | image                   |
/// | 3     | test2   | ARGB 2x2, single LZFSE stream (+4 px)     | image                   |
/// | 4     | test3   | JPEG                                      | unsupported             |
/// | 5     | -       | zero tag, Color layout                    | color                   |
/// | 6     | -       | zero tag, MultisizeImage layout           | multisize set           |
/// | 7     | -       | RGB5                                      | unimplemented format    |
/// | 8     | -       | ARGB, astc compression                    | unsupported compression |
/// | 9     | -       | ARGB 4x4, raw blob one row short          | corrupt image           |
pub fn sample_renditions() -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut renditions = Vec::new();

    let csi = Csi::image("AppIcon.png", b"ARGB", 2, 2);
    let payload = blob_payload(2, &gzip(&bgra(2, 2, 0, 1)));
    renditions.push((rendition_key(2, ICON_ID), csi.value(&payload)));

    let mut csi = Csi::image("AppIcon@3x.png", b"ARGB", 4, 4);
    csi.scale = 300;
    csi.tlv = vec![0xAB; 24];
    let payload = blob_payload(0, &bgra(4, 4, 1, 2));
    renditions.push((rendition_key(3, ICON_ID), csi.value(&payload)));

    let csi = Csi::image("test.png", b"GA8 ", 3, 2);
    let rows = gray_alpha(3, 2);
    let payload = chunked_payload(2, &[(1, zlib(&rows[..6])), (1, zlib(&rows[6..]))]);
    renditions.push((rendition_key(2, TEST_ID), csi.value(&payload)));

    let csi = Csi::image("test2.png", b"ARGB", 2, 2);
    let payload = single_stream_payload(2, &lzfse(&bgra(2, 2, 4, 3)));
    renditions.push((rendition_key(2, TEST2_ID), csi.value(&payload)));

    let csi = Csi::image("test3.jpg", b"JPEG", 8, 8);
    renditions.push((rendition_key(2, TEST3_ID), csi.value(b"\xFF\xD8\xFF\xE0jpeg")));

    let mut csi = Csi::image("tint", &[0; 4], 0, 0);
    csi.layout = 0x3F1;
    renditions.push((rendition_key(1, 0x0101), csi.value(b"RLOC\x01\x00\x00\x00")));

    let mut csi = Csi::image("icon-set", &[0; 4], 0, 0);
    csi.layout = 0x3F2;
    let mut set = tag_le(b"SISM").to_vec();
    push_u32_le(&mut set, &[1, 2, 60, 60, 0]);
    renditions.push((rendition_key(1, 0x0102), csi.value(&set)));

    let csi = Csi::image("legacy.png", b"RGB5", 2, 2);
    renditions.push((rendition_key(1, 0x0103), csi.value(&blob_payload(0, &[0; 8]))));

    let csi = Csi::image("compressed.png", b"ARGB", 4, 4);
    renditions.push((rendition_key(1, 0x0104), csi.value(&blob_payload(7, &[0; 16]))));

    let csi = Csi::image("short.png", b"ARGB", 4, 4);
    let payload = blob_payload(0, &bgra(4, 3, 0, 4));
    renditions.push((rendition_key(1, 0x0105), csi.value(&payload)));

    renditions
}

pub fn sample_facets() -> Vec<(Vec<u8>, Vec<u8>)> {
    vec![
        (
            b"AppIcon".to_vec(),
            facet_bytes(&[(1, 0x55), (2, 0xDC), (17, ICON_ID)]),
        ),
        (
            b"test".to_vec(),
            facet_bytes(&[(1, 0x55), (2, 0xB5), (17, TEST_ID)]),
        ),
        (
            b"test2".to_vec(),
            facet_bytes(&[(1, 0x55), (2, 0xB5), (17, TEST2_ID)]),
        ),
        (
            b"test3".to_vec(),
            facet_bytes(&[(1, 0x55), (2, 0xB5), (17, TEST3_ID)]),
        ),
    ]
}

/// Sample catalog with every table; RENDITIONS spread over 3-entry leaves
pub fn sample_catalog_with(renditions: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    let mut bom = BomBuilder::new();
    bom.named_block("CARHEADER", car_header_bytes());
    bom.tree("RENDITIONS", renditions, 3);
    bom.tree("FACETKEYS", &sample_facets(), 2);
    bom.tree(
        "APPEARANCEKEYS",
        &[(b"UIAppearanceAny".to_vec(), 0u16.to_be_bytes().to_vec())],
        8,
    );
    bom.named_block("KEYFORMAT", key_format_bytes(&KEY_TOKENS));
    bom.named_block("EXTENDED_METADATA", extended_metadata_bytes());
    bom.tree("BITMAPKEYS", &[(b"AppIcon".to_vec(), vec![0; 8])], 8);
    bom.build()
}

pub fn sample_catalog() -> Vec<u8> {
    sample_catalog_with(&sample_renditions())
}

pub fn open_sample() -> AssetCatalog<Cursor<Vec<u8>>> {
    AssetCatalog::open(Cursor::new(sample_catalog())).unwrap()
}
