//! Whole-archive decoding through the public API.

mod support;

use nitrokit::formats::nitro::FourCc;
use nitrokit::render::{compose_cell_bitmap, flatten_animation};
use nitrokit::{DecodeOptions, Decoder, EntryKind, Error, Narc, Record, RecordKind, Registry};

/// Palette, sheet, cell bank, an LZ11 pack of animation records, and a raw
/// blob.
fn sprite_archive() -> Vec<u8> {
    let colors: Vec<u16> = (0..16).collect();
    let anims = support::animation_bank(&[vec![(30, 0, 1, 1), (30, 1, 2, 2)]]);
    let mapped = support::mapped_cell_bank(&[vec![(0, 10, 20, 1)]]);
    support::narc(
        &[
            support::palette(&colors),
            support::tile_sheet(&[1, 2]),
            support::cell_bank(&[vec![(0, 0, 0)], vec![(-4, -4, 1)]]),
            support::lz11(&[anims, mapped].concat()),
            vec![1, 2, 3],
        ],
        &["pal", "chr", "cel", "anim", "raw"],
    )
}

fn record<'a>(arc: &'a Narc, label: &str) -> &'a Record {
    arc.walk()
        .find(|e| e.label() == label)
        .and_then(|e| e.record())
        .unwrap_or_else(|| panic!("{label} is not a typed entry"))
}

#[test]
fn entries_are_classified() {
    let arc = Narc::parse(sprite_archive()).unwrap();
    assert_eq!(arc.names, ["pal", "chr", "cel", "anim", "raw"]);

    let kinds: Vec<Option<RecordKind>> = arc
        .entries
        .iter()
        .map(|e| e.record().map(Record::kind))
        .collect();
    assert_eq!(
        kinds,
        [
            Some(RecordKind::Palette),
            Some(RecordKind::TileSheet),
            Some(RecordKind::CellBank),
            None,
            None,
        ]
    );
    assert_eq!(arc.entries[4].kind, Ok(EntryKind::Opaque));
    assert_eq!(arc.entries[1].tag(), Some(FourCc::new(b"RGCN")));

    let anim = &arc.entries[3];
    let Ok(EntryKind::Composite { decompressed, children }) = &anim.kind else {
        panic!("expected a composite, got {:?}", anim.kind);
    };
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name.as_deref(), Some("anim_00"));
    assert_eq!(children[1].name.as_deref(), Some("anim_01"));
    assert_eq!(children[0].offset, 0);
    assert_eq!(children[1].offset, children[0].len());
    assert_eq!(children[1].range().end, decompressed.len());
    assert_eq!(children[1].record().map(Record::kind), Some(RecordKind::MappedCellBank));
}

#[test]
fn walk_is_depth_first() {
    let arc = Narc::parse(sprite_archive()).unwrap();
    let labels: Vec<String> = arc.walk().map(|e| e.label()).collect();
    assert_eq!(labels, ["pal", "chr", "cel", "anim", "anim_00", "anim_01", "raw"]);
}

#[test]
fn cells_render_from_decoded_records() {
    let arc = Narc::parse(sprite_archive()).unwrap();
    let palette = record(&arc, "pal").as_palette().unwrap();
    let sheet = record(&arc, "chr").as_tile_sheet().unwrap();
    let bank = record(&arc, "cel").as_cell_bank().unwrap();
    let page = palette.page(0).unwrap();
    assert_eq!(page[0].a, 0);

    let first = compose_cell_bitmap(&bank.cells[0], sheet, page).unwrap();
    assert_eq!((first.width, first.height), (8, 8));
    assert_eq!(first.get(3, 3), Some(page[1]));

    let second = compose_cell_bitmap(&bank.cells[1], sheet, page).unwrap();
    assert_eq!(bank.cells[1].bounds.x, -4);
    assert_eq!(second.get(0, 0), Some(page[2]));
    assert_eq!(second.to_rgba_bytes().len(), 8 * 8 * 4);
}

#[test]
fn packed_animation_flattens() {
    let arc = Narc::parse(sprite_archive()).unwrap();
    let anims = record(&arc, "anim_00").as_animation_bank().unwrap();
    let mapped = record(&arc, "anim_01").as_mapped_cell_bank().unwrap();
    let bank = record(&arc, "cel").as_cell_bank().unwrap();

    let tracks = flatten_animation(&mapped.animations[0], anims, bank).unwrap();
    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.sort_priority, -1);
    assert_eq!(track.duration, 1.0);
    let keys: Vec<(f32, (i32, i32), Option<u16>)> = track
        .keyframes
        .iter()
        .map(|k| (k.time, k.position, k.sprite_index))
        .collect();
    assert_eq!(keys, [(0.0, (11, 21), Some(0)), (0.5, (12, 22), Some(1))]);
}

#[test]
fn one_bad_entry_leaves_the_rest_intact() {
    let mut broken = support::palette(&[0; 16]);
    broken.truncate(0x18);
    let buf = support::narc(
        &[
            support::palette(&[0x7FFF; 16]),
            broken,
            support::lz10(b"no records in here, just text"),
            vec![0x10, 0x40, 0, 0, 0x80],
        ],
        &[],
    );
    let arc = Narc::parse(buf).unwrap();

    assert!(arc.entries[0].record().is_some());
    assert!(arc.entries[1].kind.is_err());
    assert_eq!(arc.entries[2].kind, Ok(EntryKind::Opaque));
    assert_eq!(arc.entries[3].kind, Ok(EntryKind::Opaque));
    assert_eq!(arc.entries[1].label(), "1");
}

#[test]
fn options_shape_classification() {
    let packed = support::lz10(&support::palette(&[0x1F; 16]));
    let buf = support::narc(&[packed, support::palette(&[0x1F; 16])], &["a", "b"]);

    let shallow = Decoder::with_options(DecodeOptions::default().with_max_depth(0));
    let arc = Narc::parse_with(buf.clone(), &shallow).unwrap();
    assert_eq!(arc.entries[0].kind, Ok(EntryKind::Opaque));
    assert!(arc.entries[1].record().is_some());

    let tiny = Decoder::with_options(DecodeOptions::default().with_max_decompressed_size(16));
    let arc = Narc::parse_with(buf.clone(), &tiny).unwrap();
    assert_eq!(arc.entries[0].kind, Ok(EntryKind::Opaque));

    let opaque_zero = Decoder::with_options(DecodeOptions::default().with_transparent_zero(false));
    let arc = Narc::parse_with(buf.clone(), &opaque_zero).unwrap();
    let child = &arc.entries[0].children()[0];
    assert_eq!(child.name.as_deref(), Some("a_00"));
    let page = child.record().and_then(Record::as_palette).unwrap().page(0).unwrap();
    assert_eq!(page[0].a, 255);

    let bare = Decoder::new(Registry::empty(), DecodeOptions::default());
    let arc = Narc::parse_with(buf, &bare).unwrap();
    assert!(arc.walk().all(|e| e.record().is_none()));
    assert_eq!(arc.entries[0].children().len(), 1);
}

#[test]
fn decoder_is_shared_between_threads() {
    let decoder = Decoder::default();
    let buf = sprite_archive();
    let counts: Vec<usize> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| Narc::parse_with(buf.clone(), &decoder).map(|arc| arc.walk().count()))
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().unwrap().unwrap())
            .collect()
    });
    assert_eq!(counts, [7; 4]);
}

#[test]
fn truncated_archive_is_rejected() {
    let mut buf = sprite_archive();
    buf.truncate(0x20);
    assert!(matches!(
        Narc::parse(buf),
        Err(Error::UnexpectedEof { .. } | Error::InvalidRange { .. } | Error::Format { .. })
    ));
}
