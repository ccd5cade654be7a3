// SPDX-License-Identifier: MIT
//! Bounded read window over a seekable source

use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

/// Reads `length` bytes starting at `address` of the underlying source
///
/// The window is offset-relative: reading starts at `address` no matter
/// where the source cursor currently sits, and the reader seeks before
/// every read, so several windows can be used one after another over the
/// same source. It never reads past `address + length`.
pub struct RangeReader<'a, R> {
    inner: &'a mut R,
    address: u64,
    length: u64,
    offset: u64,
}

impl<'a, R: Read + Seek> RangeReader<'a, R> {
    pub fn new(inner: &'a mut R, address: u64, length: u64) -> Self {
        Self {
            inner,
            address,
            length,
            offset: 0,
        }
    }

    /// Total window length
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes not yet read from the window
    pub fn remaining(&self) -> u64 {
        self.length - self.offset
    }

    /// Read the rest of the window into an owned buffer
    pub fn read_to_bytes(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::with_capacity(self.remaining() as usize);
        self.read_to_end(&mut buf)?;
        if (buf.len() as u64) < self.length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range at {} ended after {} of {} bytes",
                    self.address,
                    buf.len(),
                    self.length
                ),
            ));
        }
        Ok(Bytes::from(buf))
    }
}

impl<R: Read + Seek> Read for RangeReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.offset >= self.length {
            return Ok(0);
        }

        let to_read = buf.len().min((self.length - self.offset) as usize);
        if to_read == 0 {
            return Ok(0);
        }

        self.inner
            .seek(SeekFrom::Start(self.address + self.offset))?;
        let n = self.inner.read(&mut buf[..to_read])?;
        self.offset += n as u64;
        Ok(n)
    }
}
