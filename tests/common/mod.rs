#![allow(dead_code)]

use std::cell::Cell;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

/// Size of everything before the allocation table.
pub const TABLE_OFFSET: usize = 0x1C;

/// Hand-assemble an archive.
///
/// `payload` is appended verbatim right after the name table, so it must
/// carry its own block header if the caller wants one.
pub fn archive(entries: &[(u32, u32)], names: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"NARC");
    b.extend_from_slice(&0xFFFEu16.to_le_bytes());
    b.extend_from_slice(&0x0100u16.to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&0x10u16.to_le_bytes());
    b.extend_from_slice(&3u16.to_le_bytes());
    b.extend_from_slice(b"BTAF");
    b.extend_from_slice(&(12 + 8 * entries.len() as u32).to_le_bytes());
    b.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for &(start, end) in entries {
        b.extend_from_slice(&start.to_le_bytes());
        b.extend_from_slice(&end.to_le_bytes());
    }
    b.extend_from_slice(b"BTNF");
    b.extend_from_slice(&(names.len() as u32).to_le_bytes());
    b.extend_from_slice(names);
    b.extend_from_slice(payload);

    let total = b.len() as u32;
    b[8..12].copy_from_slice(&total.to_le_bytes());
    b
}

/// Payload block header followed by `data`.
pub fn payload_block(data: &[u8]) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"GMIF");
    b.extend_from_slice(&(8 + data.len() as u32).to_le_bytes());
    b.extend_from_slice(data);
    b
}

/// Payload base of an archive built by [`archive`].
pub fn payload_base(entry_count: usize, names_len: usize) -> u64 {
    (TABLE_OFFSET + entry_count * 8 + 8 + names_len) as u64
}

/// Reader that counts how many times it has been dropped.
pub struct DropCounter {
    inner: Cursor<Vec<u8>>,
    drops: Rc<Cell<u32>>,
}

impl DropCounter {
    pub fn new(bytes: Vec<u8>) -> (Self, Rc<Cell<u32>>) {
        let drops = Rc::new(Cell::new(0));
        let reader = Self {
            inner: Cursor::new(bytes),
            drops: Rc::clone(&drops),
        };
        (reader, drops)
    }
}

impl Read for DropCounter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for DropCounter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
