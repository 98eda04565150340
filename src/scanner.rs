//! Finds Nitro records embedded in a blob of unknown structure.
//!
//! The scan walks the blob one byte at a time and stops at every position
//! where [`probe`] accepts a header. After a hit it resumes right past the
//! hit's declared extent, so hits never overlap and a record's own chunk
//! tags are never reported as separate records.

use std::ops::Range;

use crate::formats::nitro::{FourCc, NitroHeader, probe};

/// A candidate record found by [`scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Tag at the start of the record.
    pub tag: FourCc,
    /// Offset of the record within the scanned blob.
    pub offset: usize,
    /// Declared record size.
    pub length: usize,
}

impl Hit {
    /// Byte range of the record within the scanned blob.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }
}

/// Scan `buf` for embedded records, returning at most `max_hits` of them in
/// ascending offset order.
pub fn scan(buf: &[u8], max_hits: usize) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut i = 0;
    while i + NitroHeader::SIZE <= buf.len() && hits.len() < max_hits {
        match probe(&buf[i..]) {
            Some((tag, length)) => {
                hits.push(Hit {
                    tag,
                    offset: i,
                    length,
                });
                i += length;
            }
            None => i += 1,
        }
    }
    if hits.len() == max_hits && i + NitroHeader::SIZE <= buf.len() {
        tracing::debug!(max_hits, stopped_at = i, "scan hit limit reached");
    }
    hits
}
