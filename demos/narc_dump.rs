use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nitrokit::dispatch::Record;
use nitrokit::{DecodeOptions, Decoder, EntryKind, Narc, NarcEntry};
use tracing_subscriber::EnvFilter;

/// Print the entry tree of a NARC archive.
#[derive(Parser)]
#[command(name = "narc_dump", about = "Inspect Nintendo DS NARC archives")]
struct Cli {
    /// Archive to read.
    path: PathBuf,
    /// Maximum composite nesting.
    #[arg(long, default_value_t = 4)]
    max_depth: usize,
    /// Keep color 0 of the first palette opaque.
    #[arg(long)]
    opaque_zero: bool,
    /// Write every entry's bytes into this directory.
    #[arg(long)]
    extract: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let bytes = fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;

    let options = DecodeOptions::default()
        .with_max_depth(cli.max_depth)
        .with_transparent_zero(!cli.opaque_zero);
    let arc = Narc::parse_with(bytes, &Decoder::with_options(options))
        .with_context(|| format!("parsing {}", cli.path.display()))?;

    println!(
        "{}: {} files, {} names, {} bytes of data",
        cli.path.display(),
        arc.entries.len(),
        arc.names.len(),
        arc.image.len()
    );
    for entry in &arc.entries {
        print_entry(entry, 1);
    }

    if let Some(dir) = &cli.extract {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for entry in arc.walk() {
            let file = dir.join(format!("{}.bin", entry.label()));
            fs::write(&file, &entry.data).with_context(|| format!("writing {}", file.display()))?;
        }
    }

    Ok(())
}

fn print_entry(entry: &NarcEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    let tag = entry
        .tag()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "----".into());
    let what = match &entry.kind {
        Ok(EntryKind::Typed(record)) => describe(record),
        Ok(EntryKind::Composite { decompressed, children }) => {
            format!("composite, {} bytes unpacked, {} records", decompressed.len(), children.len())
        }
        Ok(EntryKind::Opaque) => "opaque".to_string(),
        Err(err) => format!("error: {err}"),
    };
    println!(
        "{indent}[{}] {:<12} {tag} @{:#x} +{:#x}  {what}",
        entry.index,
        entry.name.as_deref().unwrap_or("-"),
        entry.offset,
        entry.len()
    );
    for child in entry.children() {
        print_entry(child, depth + 1);
    }
}

fn describe(record: &Record) -> String {
    match record {
        Record::Palette(p) => format!(
            "NCLR {} x {} colors",
            p.palettes.len(),
            p.colors_per_palette
        ),
        Record::TileSheet(t) => format!(
            "NCGR {}x{} tiles, {:?}, {:?}, {:?}",
            t.width_tiles, t.height_tiles, t.depth, t.layout, t.mapping
        ),
        Record::CellBank(c) => format!(
            "NCER {} cells, {} objects",
            c.cells.len(),
            c.cells.iter().map(|cell| cell.oams.len()).sum::<usize>()
        ),
        Record::AnimationBank(a) => format!(
            "NANR {} animations, {} frames",
            a.cells.len(),
            a.cells.iter().map(|cell| cell.frames.len()).sum::<usize>()
        ),
        Record::MappedCellBank(m) => format!("NMCR {} animations", m.animations.len()),
    }
}
