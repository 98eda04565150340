//! Decompression against reference encoders.

mod support;

use nitrokit::Error;
use nitrokit::compression::lz::{LzHeader, LzKind, decompress};
use proptest::prelude::*;

/// Repetitive data: runs of a few symbols, so back-references of every
/// width show up.
fn repetitive() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((0u8..4, 1usize..300), 1..24).prop_map(|runs| {
        runs.into_iter()
            .flat_map(|(b, n)| std::iter::repeat_n(b, n))
            .collect()
    })
}

proptest! {
    #[test]
    fn lz10_inverts_reference_encoder(data in repetitive()) {
        let packed = support::lz10(&data);
        prop_assert_eq!(decompress(&packed, 0).unwrap(), Some(data));
    }

    #[test]
    fn lz11_inverts_reference_encoder(data in repetitive()) {
        let packed = support::lz11(&data);
        prop_assert_eq!(decompress(&packed, 0).unwrap(), Some(data));
    }

    #[test]
    fn random_bytes_round_trip(data in prop::collection::vec(any::<u8>(), 1..512)) {
        prop_assert_eq!(decompress(&support::lz10(&data), 0).unwrap(), Some(data.clone()));
        prop_assert_eq!(decompress(&support::lz11(&data), 0).unwrap(), Some(data));
    }

    #[test]
    fn truncation_never_panics(data in repetitive(), cut in 0usize..64) {
        let packed = support::lz11(&data);
        let keep = packed.len().saturating_sub(cut + 1);
        match decompress(&packed[..keep], 0) {
            Ok(Some(out)) => prop_assert_eq!(out, data),
            Ok(None) => prop_assert!(keep == 0),
            Err(err) => prop_assert!(matches!(err, Error::Lz { .. }), "expected Error::Lz, got {:?}", err),
        }
    }
}

#[test]
fn long_run_uses_widest_lz11_token() {
    let data = vec![7u8; 0x400];
    let packed = support::lz11(&data);
    // literal, then one 5-byte back-reference
    assert_eq!(packed.len(), 4 + 1 + 1 + 5);
    assert_eq!(packed[6] >> 4, 1);

    let header = LzHeader::parse(&packed, 0).unwrap().unwrap();
    assert_eq!(header.kind, LzKind::Lz11);
    assert_eq!(header.decompressed_size, 0x400);
    assert_eq!(decompress(&packed, 0).unwrap().unwrap(), data);
}

#[test]
fn stream_inside_a_larger_buffer() {
    let data = b"nitro nitro nitro nitro".to_vec();
    let mut buf = vec![0xAA; 5];
    buf.extend(support::lz10(&data));
    buf.extend([0xBB; 3]);
    assert_eq!(decompress(&buf, 5).unwrap(), Some(data));
}
