//! Entry dispatch: decides what an archive entry is and decodes it.
//!
//! ```text
//! tag registered?  ── yes ──> Typed(record)          (or the decode error)
//!       │ no
//! LZ stream at 0?  ── no ───> Opaque
//!       │ yes, decompresses
//! scanner hits?    ── none ─> Opaque
//!       │ some
//! Composite { children }     each child dispatched the same way
//! ```
//!
//! Tag lookup goes through a [`Registry`] that is built once and then only
//! read, so one [`Decoder`] can be shared between threads.

use std::collections::HashMap;

use bytes::Bytes;

use crate::Result;
use crate::compression::lz::{LzHeader, decompress_body};
use crate::formats::nanr::AnimationBank;
use crate::formats::narc::{EntryKind, NarcEntry};
use crate::formats::ncer::CellBank;
use crate::formats::ncgr::TileSheet;
use crate::formats::nclr::Palette;
use crate::formats::nitro::{Aliases, FourCc};
use crate::formats::nmcr::MappedCellBank;
use crate::formats::{nanr, ncer, ncgr, nclr, nmcr};
use crate::options::DecodeOptions;
use crate::scanner::scan;

/// The record types with decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Palette,
    TileSheet,
    CellBank,
    AnimationBank,
    MappedCellBank,
}

impl RecordKind {
    /// Every kind, in registration order.
    pub const ALL: [RecordKind; 5] = [
        Self::Palette,
        Self::TileSheet,
        Self::CellBank,
        Self::AnimationBank,
        Self::MappedCellBank,
    ];

    /// The two tags a record of this kind may start with.
    pub fn aliases(self) -> &'static Aliases {
        match self {
            Self::Palette => &nclr::MAGIC,
            Self::TileSheet => &ncgr::MAGIC,
            Self::CellBank => &ncer::MAGIC,
            Self::AnimationBank => &nanr::MAGIC,
            Self::MappedCellBank => &nmcr::MAGIC,
        }
    }

    /// Conventional file extension, e.g. `"NCLR"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Palette => "NCLR",
            Self::TileSheet => "NCGR",
            Self::CellBank => "NCER",
            Self::AnimationBank => "NANR",
            Self::MappedCellBank => "NMCR",
        }
    }

    fn decoder(self) -> DecodeFn {
        match self {
            Self::Palette => decode_palette,
            Self::TileSheet => decode_tile_sheet,
            Self::CellBank => decode_cell_bank,
            Self::AnimationBank => decode_animation_bank,
            Self::MappedCellBank => decode_mapped_cell_bank,
        }
    }
}

fn decode_palette(buf: &[u8], opts: &DecodeOptions) -> Result<Record> {
    Palette::parse(buf, opts.transparent_zero).map(Record::Palette)
}

fn decode_tile_sheet(buf: &[u8], _: &DecodeOptions) -> Result<Record> {
    TileSheet::parse(buf).map(Record::TileSheet)
}

fn decode_cell_bank(buf: &[u8], _: &DecodeOptions) -> Result<Record> {
    CellBank::parse(buf).map(Record::CellBank)
}

fn decode_animation_bank(buf: &[u8], _: &DecodeOptions) -> Result<Record> {
    AnimationBank::parse(buf).map(Record::AnimationBank)
}

fn decode_mapped_cell_bank(buf: &[u8], _: &DecodeOptions) -> Result<Record> {
    MappedCellBank::parse(buf).map(Record::MappedCellBank)
}

/// A decoded typed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Palette(Palette),
    TileSheet(TileSheet),
    CellBank(CellBank),
    AnimationBank(AnimationBank),
    MappedCellBank(MappedCellBank),
}

impl Record {
    /// Which kind of record this is.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Palette(_) => RecordKind::Palette,
            Self::TileSheet(_) => RecordKind::TileSheet,
            Self::CellBank(_) => RecordKind::CellBank,
            Self::AnimationBank(_) => RecordKind::AnimationBank,
            Self::MappedCellBank(_) => RecordKind::MappedCellBank,
        }
    }

    /// The palette, if this is one.
    pub fn as_palette(&self) -> Option<&Palette> {
        match self {
            Self::Palette(p) => Some(p),
            _ => None,
        }
    }

    /// The tile sheet, if this is one.
    pub fn as_tile_sheet(&self) -> Option<&TileSheet> {
        match self {
            Self::TileSheet(t) => Some(t),
            _ => None,
        }
    }

    /// The cell bank, if this is one.
    pub fn as_cell_bank(&self) -> Option<&CellBank> {
        match self {
            Self::CellBank(c) => Some(c),
            _ => None,
        }
    }

    /// The animation bank, if this is one.
    pub fn as_animation_bank(&self) -> Option<&AnimationBank> {
        match self {
            Self::AnimationBank(a) => Some(a),
            _ => None,
        }
    }

    /// The mapped cell bank, if this is one.
    pub fn as_mapped_cell_bank(&self) -> Option<&MappedCellBank> {
        match self {
            Self::MappedCellBank(m) => Some(m),
            _ => None,
        }
    }
}

/// Signature of a record decoder.
pub type DecodeFn = fn(&[u8], &DecodeOptions) -> Result<Record>;

/// Tag to decoder table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    decoders: HashMap<FourCc, (RecordKind, DecodeFn)>,
}

impl Registry {
    /// A registry with no decoders; every entry becomes composite or opaque.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All built-in decoders under both of their tags.
    pub fn standard() -> Self {
        RecordKind::ALL
            .into_iter()
            .fold(Self::empty(), |reg, kind| reg.with(kind, kind.decoder()))
    }

    /// Register `decode` under both aliases of `kind`, replacing any
    /// previous decoder for those tags.
    pub fn with(mut self, kind: RecordKind, decode: DecodeFn) -> Self {
        for tag in kind.aliases() {
            self.decoders.insert(*tag, (kind, decode));
        }
        self
    }

    /// Look up the decoder for `tag`.
    pub fn get(&self, tag: FourCc) -> Option<(RecordKind, DecodeFn)> {
        self.decoders.get(&tag).copied()
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no decoder is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Turns entry bytes into [`NarcEntry`] values.
#[derive(Debug, Clone)]
pub struct Decoder {
    registry: Registry,
    options: DecodeOptions,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Registry::standard(), DecodeOptions::default())
    }
}

impl Decoder {
    /// Decoder over `registry` with `options`.
    pub fn new(registry: Registry, options: DecodeOptions) -> Self {
        Self { registry, options }
    }

    /// Standard registry with custom options.
    pub fn with_options(options: DecodeOptions) -> Self {
        Self::new(Registry::standard(), options)
    }

    /// The tag table in use.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The options passed to every decoder.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode `buf` as a registered record type, chosen by its first four
    /// bytes. `None` if the tag has no decoder.
    pub fn decode_record(&self, buf: &[u8]) -> Option<Result<Record>> {
        let tag = FourCc::peek(buf)?;
        let (_, decode) = self.registry.get(tag)?;
        Some(decode(buf, &self.options))
    }

    /// Classify and decode one entry.
    pub fn decode_entry(
        &self,
        index: usize,
        name: Option<String>,
        offset: usize,
        data: Bytes,
    ) -> NarcEntry {
        self.entry_at(index, name, offset, data, 0)
    }

    fn entry_at(
        &self,
        index: usize,
        name: Option<String>,
        offset: usize,
        data: Bytes,
        depth: usize,
    ) -> NarcEntry {
        let label = name.clone().unwrap_or_else(|| index.to_string());
        let kind = self.classify(&label, &data, depth);
        match &kind {
            Ok(EntryKind::Typed(record)) => {
                tracing::trace!(entry = %label, kind = record.kind().name(), "decoded record");
            }
            Ok(EntryKind::Composite { children, .. }) => {
                tracing::trace!(entry = %label, children = children.len(), "composite entry");
            }
            Ok(EntryKind::Opaque) => tracing::trace!(entry = %label, "opaque entry"),
            Err(err) => tracing::debug!(entry = %label, error = %err, "entry failed to decode"),
        }
        NarcEntry {
            index,
            name,
            offset,
            data,
            kind,
        }
    }

    fn classify(&self, label: &str, data: &Bytes, depth: usize) -> Result<EntryKind> {
        if let Some(record) = self.decode_record(data) {
            return record.map(EntryKind::Typed);
        }
        if depth >= self.options.max_depth {
            return Ok(EntryKind::Opaque);
        }
        let Some(decompressed) = self.unpack(label, data) else {
            return Ok(EntryKind::Opaque);
        };

        let hits = scan(&decompressed, self.options.max_hits);
        if hits.is_empty() {
            return Ok(EntryKind::Opaque);
        }
        let children = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                self.entry_at(
                    i,
                    Some(format!("{label}_{i:02}")),
                    hit.offset,
                    decompressed.slice(hit.range()),
                    depth + 1,
                )
            })
            .collect();

        Ok(EntryKind::Composite {
            decompressed,
            children,
        })
    }

    /// Decompress `data` if it is an LZ stream within the size limit.
    /// Malformed streams are not an error here; the entry is just opaque.
    fn unpack(&self, label: &str, data: &[u8]) -> Option<Bytes> {
        let header = match LzHeader::parse(data, 0) {
            Ok(Some(header)) => header,
            Ok(None) => return None,
            Err(err) => {
                tracing::trace!(entry = %label, error = %err, "not a valid LZ header");
                return None;
            }
        };
        if header.decompressed_size > self.options.max_decompressed_size {
            tracing::trace!(
                entry = %label,
                size = header.decompressed_size,
                "LZ output exceeds the size limit"
            );
            return None;
        }
        match decompress_body(data, &header) {
            Ok(out) => Some(Bytes::from(out)),
            Err(err) => {
                tracing::trace!(entry = %label, error = %err, "LZ stream rejected");
                None
            }
        }
    }
}
