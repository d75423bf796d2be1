//! Low-level byte primitives shared by the container parser and writer.
//!
//! All multi-byte integers are little-endian. Reads are exact: each one
//! consumes the bytes it promises or returns an error, with no partial-read
//! ambiguity.

mod reader;
mod writer;

pub use reader::ByteReader;
pub use writer::ByteWriter;
