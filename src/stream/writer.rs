//! Little-endian writer mirroring [`ByteReader`](super::ByteReader).

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::Result;

/// Sequential and random-access writer over a seekable byte sink.
///
/// Seeking past the current end and writing zero-fills the gap, as
/// [`std::fs::File`] and [`std::io::Cursor`] do.
#[derive(Debug)]
pub struct ByteWriter<W> {
    inner: W,
    pos: u64,
}

impl<W: Write + Seek> ByteWriter<W> {
    /// Wrap `inner`, keeping its current position.
    pub fn new(mut inner: W) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    /// Current absolute position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Write one byte.
    #[inline]
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_bytes(&[v])
    }

    /// Write a little-endian `u16`.
    #[inline]
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a little-endian `u32`.
    #[inline]
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a little-endian `u64`.
    #[inline]
    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write all of `b`.
    pub fn write_bytes(&mut self, b: &[u8]) -> Result<()> {
        self.inner.write_all(b)?;
        self.pos += b.len() as u64;
        Ok(())
    }

    /// Write `n` zero bytes.
    pub fn write_zeros(&mut self, n: u64) -> Result<()> {
        let written = io::copy(&mut io::repeat(0).take(n), &mut self.inner)?;
        self.pos += written;
        Ok(())
    }

    /// Move to absolute `offset`.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Flush buffered output to the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consume the writer, returning the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn writes_little_endian() {
        let mut w = ByteWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_u8(0xAB).unwrap();
        w.write_u16(0x1234).unwrap();
        w.write_u32(0x1234_5678).unwrap();
        w.write_u64(1).unwrap();
        assert_eq!(w.position(), 15);
        assert_eq!(
            w.into_inner().into_inner(),
            [0xAB, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn seek_past_end_zero_fills() {
        let mut w = ByteWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_bytes(b"ab").unwrap();
        w.seek(5).unwrap();
        w.write_bytes(b"z").unwrap();
        w.seek(0).unwrap();
        w.write_u8(b'A').unwrap();
        assert_eq!(w.position(), 1);
        assert_eq!(w.into_inner().into_inner(), b"Ab\0\0\0z");
    }

    #[test]
    fn write_zeros_advances() {
        let mut w = ByteWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_zeros(3).unwrap();
        w.write_u8(1).unwrap();
        assert_eq!(w.position(), 4);
        assert_eq!(w.into_inner().into_inner(), [0, 0, 0, 1]);
    }
}
