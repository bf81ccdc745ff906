//! Demo host: trains on a procedural terrain sample and grows a new one.
//!
//! Usage: `block_synth [config.json]`. Log verbosity follows `RUST_LOG`.

use std::collections::BTreeMap;
use synth_core::{
    train, Block, BlockGridSink, Bounds, Coords, GeneratingWorld, SparseGrid, SynthConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STONE: Block = Block(1);
const DIRT: Block = Block(2);
const GRASS: Block = Block(3);
const LOG: Block = Block(4);
const LEAVES: Block = Block(5);

/// Rolling stone/dirt/grass ground with a tree every 12 blocks.
fn terrain(c: Coords) -> Block {
    let ground = 3 + ((c.x / 4 + c.z / 6) % 2);
    let (tx, tz) = (c.x.rem_euclid(12), c.z.rem_euclid(12));
    let trunk = tx == 6 && tz == 6;
    let crown = (5..=7).contains(&tx) && (5..=7).contains(&tz);
    match c.y {
        y if y < ground - 2 => STONE,
        y if y < ground => DIRT,
        y if y == ground => GRASS,
        y if trunk && y < ground + 4 => LOG,
        y if crown && (ground + 4..ground + 6).contains(&y) => LEAVES,
        _ => Block::AIR,
    }
}

fn glyph(block: Block) -> char {
    match block {
        STONE => '#',
        DIRT => '%',
        GRASS => '"',
        LOG => '|',
        LEAVES => '*',
        _ => '.',
    }
}

/// Top-down view: the highest solid block of each column.
fn print_height_map(blocks: &SparseGrid<Block>) {
    let Some(bounds) = blocks.populated_bounds() else {
        return;
    };
    let (min, max) = (bounds.min(), bounds.max());
    for z in min.z..=max.z {
        let row: String = (min.x..=max.x)
            .map(|x| {
                (min.y..=max.y)
                    .rev()
                    .filter_map(|y| blocks.get(Coords::new(x, y, z)).copied())
                    .find(|b| !b.is_air())
                    .map(glyph)
                    .unwrap_or(' ')
            })
            .collect();
        println!("{}", row);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,synth_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SynthConfig::load(&path)?,
        None => SynthConfig::default(),
    };
    tracing::debug!("Config: {}", serde_json::to_string(&config)?);

    let sample = Bounds::new(Coords::new(0, 0, 0), Coords::new(35, 11, 35))?;
    let catalog = train(&terrain, sample, &config.sample_config())?;
    tracing::info!("Catalog: {}", catalog.stats());

    let target = Bounds::new(Coords::new(-30, 0, -18), Coords::new(29, 11, 17))?;
    let mut world = GeneratingWorld::new(&catalog, target, config.seed)?
        .with_mode(config.resolve_mode)
        .with_enlarge_at_once(config.enlarge_at_once);
    let mut sink = BlockGridSink::new(catalog.tile_size());
    let report = world.run(&mut sink)?;
    let blocks = sink.finish()?;

    let mut counts: BTreeMap<Block, usize> = BTreeMap::new();
    for (_, &block) in blocks.iter_set() {
        *counts.entry(block).or_default() += 1;
    }

    println!(
        "seed {}: placed {} tiles in {} waves, {} lattice cells unresolved",
        report.seed, report.placed, report.waves, report.unresolved
    );
    for (block, count) in &counts {
        println!("  {} block {:>3}: {}", glyph(*block), block.0, count);
    }
    print_height_map(&blocks);
    Ok(())
}
