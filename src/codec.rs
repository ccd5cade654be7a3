// SPDX-License-Identifier: MIT
//! Byte-level decoding helpers shared by the BOM and CAR layers
//!
//! Every fixed-layout record in both formats is decoded through
//! [`ByteCursor`], which never indexes out of bounds: a short read turns
//! into a [`Truncated`] error carrying the record being decoded.
//!
//! Four-character tags go through [`FourCc`] so the byte reversal of
//! little-endian tags lives in exactly one place.

use std::fmt;

use serde::{Serialize, Serializer};

/// A read ran past the end of the buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("truncated {context}: needed {needed} bytes, {available} available")]
pub struct Truncated {
    pub context: &'static str,
    pub needed: usize,
    pub available: usize,
}

/// Bounds-checked cursor over a byte slice
///
/// Endianness is chosen per call, since the CAR format mixes
/// little-endian and big-endian records inside the same container.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor; `context` names the record for error messages
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }

    /// Current offset from the start of the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The unread tail, without advancing
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Take `len` bytes and advance
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], Truncated> {
        if len > self.remaining() {
            return Err(Truncated {
                context: self.context,
                needed: len,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Advance without looking at the bytes
    pub fn skip(&mut self, len: usize) -> Result<(), Truncated> {
        self.take(len).map(|_| ())
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, Truncated> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn u16_be(&mut self) -> Result<u16, Truncated> {
        self.array().map(u16::from_be_bytes)
    }

    pub fn u32_le(&mut self) -> Result<u32, Truncated> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn u32_be(&mut self) -> Result<u32, Truncated> {
        self.array().map(u32::from_be_bytes)
    }

    /// Four-character tag stored as a little-endian integer (reversed on disk)
    pub fn tag_le(&mut self) -> Result<FourCc, Truncated> {
        self.array().map(FourCc::from_le_bytes)
    }

    /// Four-character tag stored in reading order
    pub fn tag_be(&mut self) -> Result<FourCc, Truncated> {
        self.array().map(FourCc::from_be_bytes)
    }

    /// Fixed-width, NUL-padded string field
    pub fn padded_str(&mut self, width: usize) -> Result<String, Truncated> {
        self.take(width).map(trim_padded)
    }
}

/// Four-character code in reading order
///
/// CAR structures store tags as little-endian `u32`s, so the bytes on
/// disk are reversed (`"BGRA"` on disk means `"ARGB"`). BOM structures
/// store them big-endian, in reading order. Constructing through
/// [`FourCc::from_le_bytes`] or [`FourCc::from_be_bytes`] normalises both.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCc([u8; 4]);

impl FourCc {
    pub const ZERO: FourCc = FourCc([0; 4]);

    /// Build from the characters as they read (`FourCc::new(b"ARGB")`)
    pub const fn new(chars: &[u8; 4]) -> Self {
        Self(*chars)
    }

    /// Bytes as stored by a little-endian writer
    pub fn from_le_bytes(raw: [u8; 4]) -> Self {
        Self([raw[3], raw[2], raw[1], raw[0]])
    }

    /// Bytes as stored by a big-endian writer
    pub fn from_be_bytes(raw: [u8; 4]) -> Self {
        Self(raw)
    }

    /// Bytes in the order a little-endian writer puts them on disk
    pub fn to_le_bytes(self) -> [u8; 4] {
        let c = self.0;
        [c[3], c[2], c[1], c[0]]
    }

    /// Characters in reading order
    pub fn chars(&self) -> [u8; 4] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Text form with padding spaces and NULs stripped (`"GA8 "` -> `"GA8"`)
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ' || *b == 0) {
            f.write_str(&self.as_text())
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?} {})", self.to_string(), hex::encode(self.0))
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Trim a fixed-width C string at its padding
///
/// Padding is any run of trailing `\0` or `\x01` bytes; invalid UTF-8 is
/// replaced rather than rejected.
pub fn trim_padded(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != 0 && b != 1)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
