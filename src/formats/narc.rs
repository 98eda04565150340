//! NARC (Nitro ARChive) - flat file container.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header, magic "NARC", BOM 0xFFFE
//! [0x10] Blocks, in any order:
//!        FATB ("BTAF" / "FATB") - file allocation table
//!        FNTB ("BTNF" / "FNTB") - file name table
//!        FIMG ("GMIF" / "FIMG") - concatenated file data
//! ```
//!
//! ## FATB payload
//! ```text
//! [0x00] FileCount                                     (u32 LE)
//! [0x04] FileCount x { Start u32, End u32 }, relative to the FIMG payload
//! ```
//!
//! The name table is only mined for NUL-terminated printable runs, which
//! are matched to files by position. Archives without usable names identify
//! files by index alone.
//!
//! Parsing the container is all-or-nothing. Decoding the files inside it is
//! not: every entry carries its own `Result`.

use std::ops::Range;

use bytes::Bytes;

use crate::dispatch::{Decoder, Record};
use crate::formats::nitro::{Aliases, FourCc, NitroHeader};
use crate::utils::{le_u32, printable_runs};
use crate::{Error, Result};

/// Archive tag; there is only one spelling.
pub const MAGIC: Aliases = [FourCc::new(b"NARC"); 2];
/// Allocation table block tags.
pub const FATB: Aliases = [FourCc::new(b"BTAF"), FourCc::new(b"FATB")];
/// Name table block tags.
pub const FNTB: Aliases = [FourCc::new(b"BTNF"), FourCc::new(b"FNTB")];
/// File image block tags.
pub const FIMG: Aliases = [FourCc::new(b"GMIF"), FourCc::new(b"FIMG")];

/// What an entry turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    /// A record with a registered decoder.
    Typed(Record),
    /// LZ-compressed data holding one or more embedded records.
    Composite {
        /// The decompressed bytes the children slice into.
        decompressed: Bytes,
        children: Vec<NarcEntry>,
    },
    /// Nothing recognizable; only the raw bytes are available.
    Opaque,
}

/// One file of an archive, or one record found inside a composite entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NarcEntry {
    /// Position in the allocation table, or in the parent's child list.
    pub index: usize,
    /// Name from the name table; composite children get a derived name.
    pub name: Option<String>,
    /// Offset of `data` within the FIMG payload, or within the parent's
    /// decompressed bytes.
    pub offset: usize,
    /// The entry's bytes.
    pub data: Bytes,
    /// Decoded contents, or the error that stopped decoding.
    pub kind: Result<EntryKind>,
}

impl NarcEntry {
    /// First four bytes of the data, if there are that many.
    pub fn tag(&self) -> Option<FourCc> {
        FourCc::peek(&self.data)
    }

    /// Size of the entry's bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the entry has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte range within the containing blob.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.data.len()
    }

    /// The name, or the index as text.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.index.to_string(),
        }
    }

    /// The decoded record, for typed entries.
    pub fn record(&self) -> Option<&Record> {
        match &self.kind {
            Ok(EntryKind::Typed(record)) => Some(record),
            _ => None,
        }
    }

    /// Children of a composite entry; empty otherwise.
    pub fn children(&self) -> &[NarcEntry] {
        match &self.kind {
            Ok(EntryKind::Composite { children, .. }) => children,
            _ => &[],
        }
    }

    /// This entry followed by all descendants, depth first.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Depth-first iterator returned by [`NarcEntry::walk`] and [`Narc::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<&'a NarcEntry>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a NarcEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        self.stack.extend(entry.children().iter().rev());
        Some(entry)
    }
}

/// Parsed archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Narc {
    pub header: NitroHeader,
    /// Names recovered from the name table, possibly empty.
    pub names: Vec<String>,
    /// FIMG payload that every top-level entry slices into.
    pub image: Bytes,
    /// One entry per allocation table slot, in table order.
    pub entries: Vec<NarcEntry>,
}

impl Narc {
    /// Parse an archive with the standard decoders and default options.
    pub fn parse(buf: impl Into<Bytes>) -> Result<Self> {
        Self::parse_with(buf, &Decoder::default())
    }

    /// Parse an archive, decoding entries with `decoder`.
    pub fn parse_with(buf: impl Into<Bytes>, decoder: &Decoder) -> Result<Self> {
        let buf: Bytes = buf.into();
        let header = NitroHeader::parse_expecting(&buf, &MAGIC)?;

        let mut fat = None;
        let mut names = Vec::new();
        let mut image = None;
        for chunk in header.chunks(&buf) {
            let chunk = chunk?;
            let base = chunk.data_offset();
            if FATB.contains(&chunk.tag) {
                fat = Some(parse_fat(chunk.data, base)?);
            } else if FNTB.contains(&chunk.tag) {
                names = printable_runs(chunk.data);
            } else if FIMG.contains(&chunk.tag) {
                image = Some(buf.slice(base..base + chunk.data.len()));
            } else {
                tracing::trace!(tag = %chunk.tag, offset = chunk.offset, "skipping archive block");
            }
        }

        let fat = fat.ok_or(Error::MissingChunk {
            record: "NARC",
            chunk: "FATB",
        })?;
        let image = image.ok_or(Error::MissingChunk {
            record: "NARC",
            chunk: "FIMG",
        })?;

        for slot in &fat {
            if slot.range.end < slot.range.start || slot.range.end > image.len() {
                return Err(Error::InvalidRange { offset: slot.field });
            }
        }
        tracing::debug!(
            files = fat.len(),
            names = names.len(),
            image = image.len(),
            "parsed archive blocks"
        );

        let entries = fat
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                let name = names.get(index).cloned();
                let data = image.slice(slot.range.clone());
                decoder.decode_entry(index, name, slot.range.start, data)
            })
            .collect();

        Ok(Self {
            header,
            names,
            image,
            entries,
        })
    }

    /// Every entry and composite child, depth first.
    pub fn walk(&self) -> impl Iterator<Item = &NarcEntry> {
        self.entries.iter().flat_map(NarcEntry::walk)
    }
}

struct Slot {
    range: Range<usize>,
    /// Absolute offset of the slot's start field.
    field: usize,
}

fn parse_fat(p: &[u8], base: usize) -> Result<Vec<Slot>> {
    let count = le_u32(p, 0).map_err(|e| e.rebase(base))? as usize;
    if count.saturating_mul(8) > p.len() - 4 {
        return Err(Error::format("allocation table larger than its block", base));
    }

    (0..count)
        .map(|i| {
            let at = 4 + i * 8;
            let start = le_u32(p, at)? as usize;
            let end = le_u32(p, at + 4)? as usize;
            Ok(Slot {
                range: start..end,
                field: base + at,
            })
        })
        .collect()
}
