//! Bounds-checked little-endian reader.

use std::io::{self, Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Sequential and random-access reader over a seekable byte store.
///
/// The stream length is measured once when the reader is created, so every
/// read knows in advance whether enough bytes remain. A read of width `w`
/// either consumes exactly `w` bytes or fails with [`Error::TruncatedRead`]
/// without reinterpreting a short buffer.
///
/// The reader owns its source; dropping it releases the underlying handle.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    pos: u64,
    len: u64,
    context: &'static str,
}

impl<R: Read + Seek> ByteReader<R> {
    /// Wrap `inner`, keeping its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner,
            pos,
            len,
            context: "read",
        })
    }

    /// Label the errors raised by subsequent operations.
    pub fn set_context(&mut self, context: &'static str) {
        self.context = context;
    }

    /// Current absolute position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the stream holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes between the current position and the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Read one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian `u16`.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read exactly `N` bytes into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut b = [0u8; N];
        self.fill(&mut b)?;
        Ok(b)
    }

    /// Read exactly `len` bytes into a `Vec`.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len as u64)?;
        let mut b = vec![0u8; len];
        self.fill(&mut b)?;
        Ok(b)
    }

    /// Read exactly `len` bytes starting at absolute `offset`.
    ///
    /// Leaves the reader positioned just past the range.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if offset > self.len {
            return Err(Error::TruncatedRead {
                context: self.context,
                offset,
                need: len as u64,
                have: 0,
            });
        }
        self.seek(offset)?;
        self.read_bytes(len)
    }

    /// Step over a field of `n` bytes.
    ///
    /// Fails like a read would if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.ensure(n)?;
        self.inner.seek(SeekFrom::Start(self.pos + n))?;
        self.pos += n;
        Ok(())
    }

    /// Move to absolute `offset`. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(self.out_of_bounds(offset as i128));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    /// Move by `delta` bytes relative to the current position.
    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        let target = self.pos as i128 + delta as i128;
        if target < 0 || target > self.len as i128 {
            return Err(self.out_of_bounds(target));
        }
        self.seek(target as u64)
    }

    /// Consume the reader, returning the inner source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure(&self, need: u64) -> Result<()> {
        let have = self.remaining();
        if have < need {
            return Err(Error::TruncatedRead {
                context: self.context,
                offset: self.pos,
                need,
                have,
            });
        }
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure(buf.len() as u64)?;
        // The source may have shrunk since its length was measured.
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::TruncatedRead {
                context: self.context,
                offset: self.pos,
                need: buf.len() as u64,
                have: 0,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn out_of_bounds(&self, target: i128) -> Error {
        Error::UnexpectedEof {
            context: self.context,
            target,
            len: self.len,
        }
    }
}
