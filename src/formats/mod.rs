//! Decoders for the Nitro format family.
//!
//! All decoders follow the same conventions:
//!
//! * **Whole buffers** - input is a fully loaded `&[u8]` holding one record
//!   (or, for [`narc`], one archive). Nothing reads from a stream.
//! * **Explicit little-endian reads** - fields are read at documented
//!   offsets through bounds-checked helpers; structures are never overlaid
//!   on raw memory.
//! * **Framing first** - every record starts with a [`nitro::NitroHeader`];
//!   a decoder checks the magic against its two accepted spellings, then
//!   walks the chunk list looking for its primary chunk. Unknown chunks are
//!   skipped by their declared size.
//! * **Offsets in errors** - errors report positions relative to the start
//!   of the record passed in.
//! * **Decompression is separate** - decoders expect raw record bytes. The
//!   [`dispatch`](crate::dispatch) layer decompresses with
//!   [`crate::compression::lz`] where needed.
//!
//! ## Format overview
//!
//! | Module    | Magic          | Primary chunk  | Contents |
//! |-----------|----------------|----------------|----------|
//! | [`nitro`] | -              | -              | Shared header and chunk framing |
//! | [`narc`]  | `NARC`         | FATB/FNTB/FIMG | Archive of numbered, optionally named files |
//! | [`nclr`]  | `RLCN` / `NCLR`| `TTLP` / `PLTT`| BGR555 palettes |
//! | [`ncgr`]  | `RGCN` / `NCGR`| `RAHC` / `CHAR`| 4 / 8 bpp tile sheets |
//! | [`ncer`]  | `RECN` / `NCER`| `KBEC` / `CEBK`| Sprite cells built from OAM records |
//! | [`nanr`]  | `RNAN` / `NANR`| `KNBA` / `ABNK`| Cell animations |
//! | [`nmcr`]  | `RCMN` / `NMCR`| `KBCM` / `MCBK`| Placement of animated cells |

pub mod nanr;
pub mod narc;
pub mod ncer;
pub mod ncgr;
pub mod nclr;
pub mod nitro;
pub mod nmcr;
