//! Builders shared by the integration tests.

#![allow(dead_code)]

/// Chainable little-endian byte writer.
#[derive(Debug, Default, Clone)]
pub struct Buf(pub Vec<u8>);

impl Buf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Nitro record: 16-byte header followed by `chunks`.
pub fn record(magic: &[u8; 4], chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let body: Vec<u8> = chunks
        .iter()
        .flat_map(|(tag, payload)| chunk(tag, payload))
        .collect();
    Buf::new()
        .bytes(magic)
        .u16(0xFEFF)
        .u16(0x0100)
        .u32((0x10 + body.len()) as u32)
        .u16(0x10)
        .u16(chunks.len() as u16)
        .bytes(&body)
        .build()
}

pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    Buf::new()
        .bytes(tag)
        .u32((payload.len() + 8) as u32)
        .bytes(payload)
        .build()
}

/// Palette record with one run of BGR555 colors.
pub fn palette(colors: &[u16]) -> Vec<u8> {
    let mut pltt = Buf::new()
        .u32(3)
        .u32(0)
        .u32((colors.len() * 2) as u32)
        .u32(0x10);
    for &c in colors {
        pltt = pltt.u16(c);
    }
    record(b"RLCN", &[(b"TTLP", pltt.build())])
}

/// 4 bpp block-layout sheet with 1D 32K mapping; tile `i` is filled with
/// color index `fills[i]`.
pub fn tile_sheet(fills: &[u8]) -> Vec<u8> {
    let pixels: Vec<u8> = fills.iter().flat_map(|&v| [v | (v << 4); 32]).collect();
    let char_ = Buf::new()
        .u16(1)
        .u16(fills.len() as u16)
        .u32(3)
        .u32(0x10)
        .u32(0)
        .u32(pixels.len() as u32)
        .u32(0x18)
        .bytes(&pixels)
        .build();
    record(b"RGCN", &[(b"RAHC", char_)])
}

/// Cell bank without explicit bounds; each cell is a list of
/// `(x, y, tile)` 8x8 objects stored with the 6-byte stride.
pub fn cell_bank(cells: &[Vec<(i16, i16, u16)>]) -> Vec<u8> {
    let mut table = Buf::new();
    let mut oams = Buf::new();
    for oams_of_cell in cells {
        table = table
            .u16(oams_of_cell.len() as u16)
            .u16(0)
            .u32(oams.len() as u32);
        for &(x, y, tile) in oams_of_cell {
            oams = oams
                .u16(y as u16 & 0xFF)
                .u16(x as u16 & 0x1FF)
                .u16(tile);
        }
    }
    // A trailing non-zero word keeps the last list from looking padded.
    let cebk = Buf::new()
        .u16(cells.len() as u16)
        .u16(0)
        .u32(0x18)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .bytes(&table.build())
        .bytes(&oams.build())
        .u16(0xFFFF)
        .build();
    record(b"RECN", &[(b"KBEC", cebk)])
}

/// Animation bank whose cells use translate frames `(duration, cell, x, y)`.
pub fn animation_bank(cells: &[Vec<(u16, u16, i16, i16)>]) -> Vec<u8> {
    let frame_total: usize = cells.iter().map(Vec::len).sum();
    let cell_table = 0x10;
    let frame_table = cell_table + cells.len() * 0x10;
    let pool = frame_table + frame_total * 8;

    let mut table = Buf::new();
    let mut frames = Buf::new();
    let mut data = Buf::new();
    for list in cells {
        table = table
            .u32(list.len() as u32)
            .u16(2)
            .u16(1)
            .u32(0)
            .u32(frames.len() as u32);
        for &(duration, cell, x, y) in list {
            frames = frames.u32(data.len() as u32).u16(duration).u16(0);
            data = data.u16(cell).u16(0).i16(x).i16(y);
        }
    }

    let abnk = Buf::new()
        .u16(cells.len() as u16)
        .u16(frame_total as u16)
        .u32(cell_table as u32)
        .u32(frame_table as u32)
        .u32(pool as u32)
        .bytes(&table.build())
        .bytes(&frames.build())
        .bytes(&data.build())
        .build();
    record(b"RNAN", &[(b"KNBA", abnk)])
}

/// Mapped cell bank; each animation lists `(animation cell, x, y, priority)`.
pub fn mapped_cell_bank(animations: &[Vec<(u16, i16, i16, u8)>]) -> Vec<u8> {
    let headers = 0x0C;
    let pool = headers + animations.len() * 8;
    let mut table = Buf::new();
    let mut cells = Buf::new();
    for anim in animations {
        table = table.u16(anim.len() as u16).u16(0).u32(cells.len() as u32);
        for &(index, x, y, priority) in anim {
            cells = cells.u16(index).i16(x).i16(y).u16((priority as u16) << 8);
        }
    }
    let mcbk = Buf::new()
        .u16(animations.len() as u16)
        .u16(0)
        .u32(headers as u32)
        .u32(pool as u32)
        .bytes(&table.build())
        .bytes(&cells.build())
        .build();
    record(b"RCMN", &[(b"KBCM", mcbk)])
}

/// NARC archive. `names` become a NUL-separated name table.
pub fn narc(files: &[Vec<u8>], names: &[&str]) -> Vec<u8> {
    let mut fat = Buf::new().u32(files.len() as u32);
    let mut img = Vec::new();
    for f in files {
        let start = img.len() as u32;
        img.extend_from_slice(f);
        fat = fat.u32(start).u32(img.len() as u32);
    }
    let mut fnt = Buf::new().u32(8).u16(0).u16(1);
    for n in names {
        fnt = fnt.bytes(n.as_bytes()).u8(0);
    }

    let blocks = [
        chunk(b"BTAF", &fat.build()),
        chunk(b"BTNF", &fnt.build()),
        chunk(b"GMIF", &img),
    ]
    .concat();
    Buf::new()
        .bytes(b"NARC")
        .u16(0xFFFE)
        .u16(0x0100)
        .u32((0x10 + blocks.len()) as u32)
        .u16(0x10)
        .u16(3)
        .bytes(&blocks)
        .build()
}

const WINDOW: usize = 0x1000;

/// Longest earlier match for `data[pos..]`, as `(length, disp)` where the
/// source is `pos - disp - 1`.
fn longest_match(data: &[u8], pos: usize, max_len: usize) -> Option<(usize, usize)> {
    let limit = max_len.min(data.len() - pos);
    let mut best: Option<(usize, usize)> = None;
    for disp in 0..WINDOW.min(pos) {
        let from = pos - disp - 1;
        let len = (0..limit)
            .take_while(|&k| data[from + k] == data[pos + k])
            .count();
        if best.is_none_or(|(l, _)| len > l) {
            best = Some((len, disp));
        }
    }
    best
}

fn header(kind: u8, size: usize) -> Vec<u8> {
    if size < 1 << 24 {
        vec![kind, size as u8, (size >> 8) as u8, (size >> 16) as u8]
    } else {
        let mut out = vec![kind, 0, 0, 0];
        out.extend_from_slice(&(size as u32).to_le_bytes());
        out
    }
}

/// Greedy encoder shared by both variants. `token` writes one
/// back-reference and `min_len`/`max_len` bound its length.
fn compress_with(
    kind: u8,
    data: &[u8],
    min_len: usize,
    max_len: usize,
    token: fn(&mut Vec<u8>, usize, usize),
) -> Vec<u8> {
    let mut out = header(kind, data.len());
    let mut pos = 0;
    while pos < data.len() {
        let flag_at = out.len();
        out.push(0);
        for bit in 0..8 {
            if pos >= data.len() {
                break;
            }
            match longest_match(data, pos, max_len) {
                Some((len, disp)) if len >= min_len => {
                    out[flag_at] |= 0x80 >> bit;
                    token(&mut out, len, disp);
                    pos += len;
                }
                _ => {
                    out.push(data[pos]);
                    pos += 1;
                }
            }
        }
    }
    out
}

/// Reference LZ10 encoder.
pub fn lz10(data: &[u8]) -> Vec<u8> {
    compress_with(0x10, data, 3, 18, |out, len, disp| {
        out.push((((len - 3) << 4) | (disp >> 8)) as u8);
        out.push(disp as u8);
    })
}

/// Reference LZ11 encoder using all three token widths.
pub fn lz11(data: &[u8]) -> Vec<u8> {
    compress_with(0x11, data, 3, 0x111 + 0xFFF, |out, len, disp| {
        if len <= 0x10 {
            out.push((((len - 1) << 4) | (disp >> 8)) as u8);
            out.push(disp as u8);
        } else if len < 0x111 {
            let l = len - 0x11;
            out.push((l >> 12) as u8);
            out.push((l >> 4) as u8);
            out.push((((l & 0x0F) << 4) | (disp >> 8)) as u8);
            out.push(disp as u8);
        } else {
            let l = len - 0x111;
            out.push(0x10 | (l >> 20) as u8);
            out.push((l >> 12) as u8);
            out.push((l >> 4) as u8);
            out.push((((l & 0x0F) << 4) | (disp >> 8)) as u8);
            out.push(disp as u8);
        }
    })
}
