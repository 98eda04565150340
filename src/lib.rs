//! **nitrokit** - decoding library for Nintendo DS "Nitro" archives and
//! sprite records.
//!
//! # Supported formats
//! | Module | Format |
//! |--------|--------|
//! | [`formats::narc`] | NARC - file archive (allocation table, names, data) |
//! | [`formats::nclr`] | NCLR - BGR555 palettes |
//! | [`formats::ncgr`] | NCGR - 4/8 bpp tile sheets |
//! | [`formats::ncer`] | NCER - sprite cells and OAM records |
//! | [`formats::nanr`] | NANR - cell animations |
//! | [`formats::nmcr`] | NMCR - mapped (multi-cell) animations |
//! | [`compression::lz`] | LZ10 / LZ11 compressed streams |
//!
//! # Decoding an archive
//! [`Narc::parse`] reads the container and classifies every file through a
//! [`Decoder`]: files with a known tag become typed [`Record`]s, LZ-packed
//! files holding embedded records become composites, and everything else
//! is left opaque. A file that fails to decode carries its error without
//! affecting its siblings.
//!
//! ```no_run
//! use nitrokit::{EntryKind, Narc};
//!
//! let arc = Narc::parse(std::fs::read("a/0/0/4")?)?;
//! for entry in arc.walk() {
//!     match &entry.kind {
//!         Ok(EntryKind::Typed(record)) => println!("{}: {}", entry.label(), record.kind().name()),
//!         Ok(_) => {}
//!         Err(err) => eprintln!("{}: {err}", entry.label()),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The [`render`] module combines decoded records into bitmaps and keyframe
//! tracks.

pub mod compression;
pub mod dispatch;
pub mod error;
pub mod formats;
pub mod options;
pub mod render;
pub mod scanner;
mod utils;

#[cfg(test)]
mod test_support;

pub use dispatch::{Decoder, Record, RecordKind, Registry};
pub use error::{Error, Result};
pub use formats::narc::{EntryKind, Narc, NarcEntry};
pub use options::DecodeOptions;
