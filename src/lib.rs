//! **narc** - a Rust library for reading and writing Nintendo DS NARC archives.
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`formats::narc`] | NARC - Nitro ARChive parser, writer and builder |
//! | [`stream`]        | Bounds-checked little-endian byte reader and writer |
//!
//! ```no_run
//! use narc::formats::narc::Narc;
//!
//! let narc = Narc::open("a/0/1/6")?;
//! for (entry, data) in narc.files() {
//!     println!("{:#x}..{:#x}: {} bytes", entry.start(), entry.end(), data.len());
//! }
//! # Ok::<(), narc::Error>(())
//! ```

pub mod error;
pub mod formats;
pub mod stream;

pub use error::{Error, Result};
