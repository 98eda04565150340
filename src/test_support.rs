//! Byte builders for unit tests.

/// Chainable little-endian byte writer.
#[derive(Debug, Default, Clone)]
pub(crate) struct Buf(pub Vec<u8>);

impl Buf {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub(crate) fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    pub(crate) fn zeros(mut self, n: usize) -> Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Build a Nitro record: 16-byte header followed by the given chunks.
pub(crate) fn record(magic: &[u8; 4], chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
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

/// Build a single chunk with its tag/size prefix.
pub(crate) fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    Buf::new()
        .bytes(tag)
        .u32((payload.len() + 8) as u32)
        .bytes(payload)
        .build()
}

/// Build a palette record holding `colors` as one BGR555 run.
pub(crate) fn palette_record(colors: &[u16]) -> Vec<u8> {
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

/// Build a NARC archive. `names` become a NUL-separated name table.
pub(crate) fn narc(files: &[Vec<u8>], names: Option<&[&str]>) -> Vec<u8> {
    let mut fat = Buf::new().u32(files.len() as u32);
    let mut img = Vec::new();
    for f in files {
        let start = img.len() as u32;
        img.extend_from_slice(f);
        fat = fat.u32(start).u32(img.len() as u32);
    }
    let mut fnt = Buf::new().u32(8).u16(0).u16(1);
    if let Some(names) = names {
        for n in names {
            fnt = fnt.bytes(n.as_bytes()).u8(0);
        }
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

/// Wrap `data` in an LZ10 stream made only of literals.
pub(crate) fn lz10_literals(data: &[u8]) -> Vec<u8> {
    let n = data.len() as u32;
    let mut out = vec![0x10, n as u8, (n >> 8) as u8, (n >> 16) as u8];
    for block in data.chunks(8) {
        out.push(0x00);
        out.extend_from_slice(block);
    }
    out
}
