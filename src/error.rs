//! Library-wide error and result types.

use std::io;

use thiserror::Error;

/// Result alias used throughout narc.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Every error aborts the operation that raised it; a failed parse never
/// yields a partially populated archive.
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes remained in the stream than the field being read requires.
    #[error("truncated {context} at offset {offset:#x} (need {need} bytes, have {have})")]
    TruncatedRead {
        context: &'static str,
        offset: u64,
        need: u64,
        have: u64,
    },

    /// An allocation entry ends before it starts.
    #[error("malformed allocation entry {index}: end {end:#x} precedes start {start:#x}")]
    MalformedEntry { index: u32, start: u32, end: u32 },

    /// A seek targeted a position outside the stream.
    #[error("{context}: seek to {target:#x} is outside the stream (length {len:#x})")]
    UnexpectedEof {
        context: &'static str,
        target: i128,
        len: u64,
    },

    /// A tag or signature did not match its expected value (strict mode only).
    #[error("bad magic at offset {offset:#x}: expected {expected:?}, found {found:?}")]
    BadMagic {
        offset: u64,
        expected: [u8; 4],
        found: [u8; 4],
    },

    /// The byte-order mark is not the little-endian marker (strict mode only).
    #[error("unsupported byte-order mark {found:#06x}")]
    BadByteOrder { found: u16 },

    /// A value does not fit in the format's 32-bit size or offset fields.
    #[error("{0} does not fit in a 32-bit field")]
    TooLarge(&'static str),
}
