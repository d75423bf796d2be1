//! NARC (Nitro ARChive) - Nintendo DS file container.
//!
//! Bundles any number of variable-length files behind an allocation table.
//! Used throughout DS game data for sprites, palettes, maps and text banks.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "NARC"                      (4 bytes)
//! [0x04] BOM (0xFFFE)                      (u16 LE)
//! [0x06] Version (0x0100)                  (u16 LE)
//! [0x08] TotalFileSize                     (u32 LE)
//! [0x0C] HeaderSize (0x10)                 (u16 LE)
//! [0x0E] SectionCount (3)                  (u16 LE)
//! [0x10] Magic "BTAF"                      (4 bytes)
//! [0x14] AllocationBlockSize               (u32 LE)
//! [0x18] FileCount                         (u32 LE)
//! [0x1C] AllocationTable                   (FileCount × 0x08 bytes)
//! [...]  Magic "BTNF"                      (4 bytes)
//!        NameTableSize                     (u32 LE)
//!        NameTable                         (NameTableSize bytes, not decoded)
//! [base] Magic "GMIF"                      (4 bytes)
//!        PayloadBlockSize                  (u32 LE)
//!        File data
//! ```
//!
//! ## Allocation Entry (0x08 bytes)
//! ```text
//! [0x00] Start - relative to the payload base (u32 LE)
//! [0x04] End   - relative to the payload base, exclusive (u32 LE)
//! ```
//!
//! ## Notes
//! * The payload base is not stored anywhere; it is the stream position
//!   right after the name table.
//! * Entries are read in table order, but each one is located on its own.
//!   Ranges need not be contiguous or increasing, and may overlap.
//! * Only the signature, BOM, `BTAF` and `BTNF` tags are checked, and only
//!   under [`Validation::Strict`]. A file range may begin at the payload base
//!   itself, so the `GMIF` tag is never checked.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::ops::Index;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::stream::{ByteReader, ByteWriter};
use crate::{Error, Result};

const MAGIC: &[u8; 4] = b"NARC";
const ALLOCATION_TAG: &[u8; 4] = b"BTAF";
const NAME_TAG: &[u8; 4] = b"BTNF";
const PAYLOAD_TAG: &[u8; 4] = b"GMIF";

const BYTE_ORDER_LE: u16 = 0xFFFE;
const VERSION: u16 = 0x0100;
const HEADER_SIZE: u16 = 0x10;
const SECTION_COUNT: u16 = 3;

/// Archive header plus the allocation block's tag, size and count fields.
const TABLE_OFFSET: u64 = 0x1C;
const ENTRY_SIZE: u64 = 8;
/// Tag and size fields of a block.
const BLOCK_HEADER_SIZE: u64 = 8;
const PAYLOAD_ALIGN: u64 = 4;

/// How much of the container framing is checked while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Skip the framing fields without looking at them.
    #[default]
    Lenient,
    /// Reject archives whose signature, byte-order mark or block tags are
    /// wrong.
    Strict,
}

/// Options controlling [`Narc::parse_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub validation: Validation,
}

impl ParseOptions {
    /// Options with [`Validation::Strict`].
    pub fn strict() -> Self {
        Self {
            validation: Validation::Strict,
        }
    }
}

/// Byte range of one file, relative to the payload base.
///
/// `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationEntry {
    start: u32,
    end: u32,
}

impl AllocationEntry {
    /// Start offset, relative to the payload base.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// End offset (exclusive), relative to the payload base.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Size of this file's data in bytes.
    pub fn size(&self) -> u32 {
        self.end - self.start
    }
}

/// Raw bytes of one embedded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Parsed NARC archive with every file's data loaded.
///
/// `entries()[i]` and `payloads()[i]` describe the same file, and
/// `payloads()[i].len() == entries()[i].size()`.
///
/// Equality compares the archive contents only; [`Narc::path`] is ignored.
#[derive(Debug, Clone, Eq)]
pub struct Narc {
    archive_size: u32,
    allocation_size: u32,
    name_table_size: u32,
    payload_size: u32,
    payload_offset: u64,
    path: Option<PathBuf>,
    entries: Vec<AllocationEntry>,
    payloads: Vec<Payload>,
}

impl Narc {
    /// Parse a NARC archive from `r` with lenient validation.
    ///
    /// `r` must be positioned at the very beginning of the archive.
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        Self::parse_with(r, &ParseOptions::default())
    }

    /// Parse a NARC archive from `r`.
    pub fn parse_with<R: Read + Seek>(r: &mut R, options: &ParseOptions) -> Result<Self> {
        Self::read_from(r, options)
    }

    /// Parse a NARC archive, taking ownership of `reader`.
    ///
    /// The reader is dropped before this returns, whether or not parsing
    /// succeeded.
    pub fn read_from<R: Read + Seek>(reader: R, options: &ParseOptions) -> Result<Self> {
        let mut r = ByteReader::new(reader)?;
        decode(&mut r, options)
    }

    /// Open and parse the archive at `path` with lenient validation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ParseOptions::default())
    }

    /// Open and parse the archive at `path`.
    ///
    /// The file is closed before this returns.
    pub fn open_with(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut narc = Self::read_from(BufReader::new(file), options)?;
        narc.path = Some(path.to_path_buf());
        Ok(narc)
    }

    /// Total archive size as declared in the header.
    pub fn archive_size(&self) -> u32 {
        self.archive_size
    }

    /// Number of embedded files.
    pub fn entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Allocation block size as declared in its header.
    pub fn allocation_size(&self) -> u32 {
        self.allocation_size
    }

    /// Number of name-table bytes that were skipped.
    pub fn name_table_size(&self) -> u32 {
        self.name_table_size
    }

    /// Payload block size as declared in its header.
    pub fn payload_size(&self) -> u32 {
        self.payload_size
    }

    /// Absolute stream offset every allocation entry is relative to.
    pub fn payload_offset(&self) -> u64 {
        self.payload_offset
    }

    /// Path the archive was opened from, if it came from [`Narc::open`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Allocation table in declaration order.
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// File data, index-aligned with [`Narc::entries`].
    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    /// Data of file `index`. Returns [`None`] if out of range.
    pub fn file(&self, index: usize) -> Option<&[u8]> {
        self.payloads.get(index).map(Payload::as_bytes)
    }

    /// Iterate over every file's allocation entry and data.
    pub fn files(&self) -> impl ExactSizeIterator<Item = (&AllocationEntry, &[u8])> {
        self.entries
            .iter()
            .zip(self.payloads.iter().map(Payload::as_bytes))
    }

    /// Consume the archive, returning the file data.
    pub fn into_payloads(self) -> Vec<Payload> {
        self.payloads
    }

    /// Serialize the archive to `w`.
    ///
    /// Allocation entries are written verbatim and each file's data is placed
    /// at `base + start`. The block and archive sizes are recomputed from the
    /// entries; the name table is written as `name_table_size` zero bytes.
    pub fn write<W: Write + Seek>(&self, w: &mut W) -> Result<()> {
        let layout = Layout::new(&self.entries, self.name_table_size)?;
        let mut w = ByteWriter::new(w)?;

        w.write_bytes(MAGIC)?;
        w.write_u16(BYTE_ORDER_LE)?;
        w.write_u16(VERSION)?;
        w.write_u32(layout.archive_size)?;
        w.write_u16(HEADER_SIZE)?;
        w.write_u16(SECTION_COUNT)?;

        w.write_bytes(ALLOCATION_TAG)?;
        w.write_u32(layout.allocation_size)?;
        w.write_u32(self.entry_count())?;
        for entry in &self.entries {
            w.write_u32(entry.start)?;
            w.write_u32(entry.end)?;
        }

        w.write_bytes(NAME_TAG)?;
        w.write_u32(self.name_table_size)?;
        w.write_zeros(self.name_table_size as u64)?;

        let base = w.position();
        w.write_bytes(PAYLOAD_TAG)?;
        w.write_u32(layout.payload_size)?;

        // A range starting inside the block header overwrites it.
        let mut written = w.position();
        for (entry, data) in self.files() {
            w.seek(base + entry.start as u64)?;
            w.write_bytes(data)?;
            written = written.max(w.position());
        }

        // Empty ranges past the last data byte still count towards the sizes.
        w.seek(written)?;
        w.write_zeros(base + layout.payload_size as u64 - written)?;
        w.flush()
    }

    /// Serialize the archive to a new file at `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write(&mut BufWriter::new(File::create(path)?))
    }
}

impl PartialEq for Narc {
    fn eq(&self, other: &Self) -> bool {
        self.archive_size == other.archive_size
            && self.allocation_size == other.allocation_size
            && self.name_table_size == other.name_table_size
            && self.payload_size == other.payload_size
            && self.payload_offset == other.payload_offset
            && self.entries == other.entries
            && self.payloads == other.payloads
    }
}

impl Index<usize> for Narc {
    type Output = [u8];

    /// Index by file number.
    ///
    /// # Panics
    /// Panics if `index` is not less than the entry count.
    fn index(&self, index: usize) -> &Self::Output {
        self.file(index)
            .unwrap_or_else(|| panic!("no file {index} in NARC"))
    }
}

fn decode<R: Read + Seek>(r: &mut ByteReader<R>, options: &ParseOptions) -> Result<Narc> {
    let strict = options.validation == Validation::Strict;

    r.set_context("archive header");
    if strict {
        magic(r, MAGIC)?;
        let bom = r.read_u16()?;
        if bom != BYTE_ORDER_LE {
            return Err(Error::BadByteOrder { found: bom });
        }
        let _version = r.read_u16()?;
    } else {
        r.skip(8)?;
    }
    r.set_context("archive size");
    let archive_size = r.read_u32()?;

    r.set_context("allocation block header");
    if strict {
        let _header_size = r.read_u16()?;
        let _section_count = r.read_u16()?;
        magic(r, ALLOCATION_TAG)?;
    } else {
        r.skip(8)?;
    }
    r.set_context("allocation block size");
    let allocation_size = r.read_u32()?;
    r.set_context("entry count");
    let entry_count = r.read_u32()?;
    debug!("NARC: {entry_count} entries, allocation block {allocation_size:#x} bytes");

    // Never reserve more entries than the stream could hold.
    r.set_context("allocation entry");
    let capacity = (entry_count as u64).min(r.remaining() / ENTRY_SIZE) as usize;
    let mut entries = Vec::with_capacity(capacity);
    for index in 0..entry_count {
        let start = r.read_u32()?;
        let end = r.read_u32()?;
        if end < start {
            return Err(Error::MalformedEntry { index, start, end });
        }
        entries.push(AllocationEntry { start, end });
    }

    r.set_context("name block header");
    if strict {
        magic(r, NAME_TAG)?;
    } else {
        r.skip(4)?;
    }
    r.set_context("name block size");
    let name_table_size = r.read_u32()?;
    r.set_context("name table");
    r.skip(name_table_size as u64)?;

    let payload_offset = r.position();
    debug!("NARC: name table {name_table_size:#x} bytes, payload base {payload_offset:#x}");

    r.set_context("payload block header");
    r.skip(4)?;
    r.set_context("payload block size");
    let payload_size = r.read_u32()?;

    r.set_context("payload");
    let mut payloads = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let offset = payload_offset + entry.start as u64;
        trace!("NARC: file {index} at {offset:#x}, {:#x} bytes", entry.size());
        payloads.push(Payload(r.read_at(offset, entry.size() as usize)?));
    }

    Ok(Narc {
        archive_size,
        allocation_size,
        name_table_size,
        payload_size,
        payload_offset,
        path: None,
        entries,
        payloads,
    })
}

/// Verify that the next four bytes match `expected`.
fn magic<R: Read + Seek>(r: &mut ByteReader<R>, expected: &[u8; 4]) -> Result<()> {
    let offset = r.position();
    let found = r.read_array::<4>()?;
    if &found != expected {
        return Err(Error::BadMagic {
            offset,
            expected: *expected,
            found,
        });
    }
    Ok(())
}

/// Size fields derived from an allocation table, as [`Narc::write`] emits them.
struct Layout {
    archive_size: u32,
    allocation_size: u32,
    payload_size: u32,
    /// Payload base relative to the start of the archive.
    payload_offset: u64,
}

impl Layout {
    fn new(entries: &[AllocationEntry], name_table_size: u32) -> Result<Self> {
        let table_size = entries.len() as u64 * ENTRY_SIZE;
        let allocation_size = fit(BLOCK_HEADER_SIZE + 4 + table_size, "allocation block size")?;
        let payload_offset =
            TABLE_OFFSET + table_size + BLOCK_HEADER_SIZE + name_table_size as u64;
        let payload_end = entries.iter().map(|e| e.end).max().unwrap_or(0);
        let payload_size = payload_end.max(BLOCK_HEADER_SIZE as u32);
        let archive_size = fit(payload_offset + payload_size as u64, "archive size")?;
        Ok(Self {
            archive_size,
            allocation_size,
            payload_size,
            payload_offset,
        })
    }
}

fn fit(v: u64, what: &'static str) -> Result<u32> {
    u32::try_from(v).map_err(|_| Error::TooLarge(what))
}

/// Assembles a new archive from raw file data.
///
/// Files are laid out in insertion order right after the payload block
/// header, each starting on a 4-byte boundary. The archive has an empty name
/// table.
///
/// ```
/// use narc::formats::narc::{Narc, NarcBuilder};
///
/// let narc = NarcBuilder::new().file(*b"first").file(*b"second").build()?;
/// assert_eq!(&narc[1], b"second");
///
/// let mut out = std::io::Cursor::new(Vec::new());
/// narc.write(&mut out)?;
/// out.set_position(0);
/// assert_eq!(Narc::parse(&mut out)?, narc);
/// # Ok::<(), narc::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct NarcBuilder {
    files: Vec<Vec<u8>>,
}

impl NarcBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file.
    pub fn file(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.files.push(data.into());
        self
    }

    pub fn build(self) -> Result<Narc> {
        let mut entries = Vec::with_capacity(self.files.len());
        let mut cursor = BLOCK_HEADER_SIZE;
        for data in &self.files {
            let end = cursor + data.len() as u64;
            entries.push(AllocationEntry {
                start: fit(cursor, "file offset")?,
                end: fit(end, "file offset")?,
            });
            cursor = end.next_multiple_of(PAYLOAD_ALIGN);
        }

        let layout = Layout::new(&entries, 0)?;
        Ok(Narc {
            archive_size: layout.archive_size,
            allocation_size: layout.allocation_size,
            name_table_size: 0,
            payload_size: layout.payload_size,
            payload_offset: layout.payload_offset,
            path: None,
            entries,
            payloads: self.files.into_iter().map(Payload).collect(),
        })
    }
}
