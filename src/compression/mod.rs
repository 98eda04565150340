//! Decompression for packed Nitro data.
//!
//! ## Submodules
//!
//! | Module | Algorithm | Typical use |
//! |--------|-----------|-------------|
//! | [`lz`] | LZ10 / LZ11 (LZ77 family) | Archive entries packing one or more records |
//!
//! Use [`lz::decompress`] when the stream starts at a known offset. It
//! returns `Ok(None)` for data that is not LZ at all, so callers can fall
//! back to the raw bytes without inspecting the type byte themselves.

pub mod lz;
