//! Parsers for Nintendo DS container formats.
//!
//! Parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] + [`std::io::Seek`] - pass a [`std::fs::File`], a
//!   [`std::io::Cursor`], or anything else that implements both traits.
//! * **All-or-nothing** - `parse` either returns a fully populated value or
//!   an [`crate::Error`]; nothing is logged and dropped.
//! * **Fully materialized** - file data is loaded while parsing, so the
//!   parsed value does not borrow the source.
//!
//! ## Format overview
//!
//! | Module   | Format | Description |
//! |----------|--------|-------------|
//! | [`narc`] | NARC   | Nitro ARChive; bundles numbered files behind an allocation table |

pub mod narc;
