//! Decoding options.

/// Knobs for [`Decoder`](crate::dispatch::Decoder).
///
/// ```
/// use nitrokit::DecodeOptions;
///
/// let opts = DecodeOptions::default().with_transparent_zero(false).with_max_depth(1);
/// assert!(!opts.transparent_zero);
/// assert_eq!(opts.max_hits, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Give color 0 of palette 0 an alpha of 0.
    pub transparent_zero: bool,
    /// Maximum number of embedded records taken from one decompressed blob.
    pub max_hits: usize,
    /// Maximum composite nesting. Entries at this depth are left opaque.
    pub max_depth: usize,
    /// LZ streams declaring a larger output are not decompressed.
    pub max_decompressed_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            transparent_zero: true,
            max_hits: 1024,
            max_depth: 4,
            max_decompressed_size: 64 << 20,
        }
    }
}

impl DecodeOptions {
    /// Set [`transparent_zero`](Self::transparent_zero).
    pub fn with_transparent_zero(mut self, on: bool) -> Self {
        self.transparent_zero = on;
        self
    }

    /// Set [`max_hits`](Self::max_hits).
    pub fn with_max_hits(mut self, n: usize) -> Self {
        self.max_hits = n;
        self
    }

    /// Set [`max_depth`](Self::max_depth).
    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    /// Set [`max_decompressed_size`](Self::max_decompressed_size).
    pub fn with_max_decompressed_size(mut self, bytes: usize) -> Self {
        self.max_decompressed_size = bytes;
        self
    }
}
