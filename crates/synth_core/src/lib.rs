//! Adjacency-learning block synthesizer.
//!
//! Learns which cubic tiles sit next to which in a sampled block volume, then
//! grows new volumes that are locally consistent with the sample.
//!
//! This crate provides:
//! - `SparseGrid`: growable 3D storage addressed by signed coordinates
//! - `Piece` / `PiecePool`: fixed-size tiles and their content-interned ids
//! - `Face` / `Transform`: the 26 neighbor directions and the cube symmetries
//!   acting on them
//! - `WeightedMultiset`: weighted occurrence counts with weighted draws
//! - `Catalog`: per-tile neighbor statistics, merged across observations
//! - `sample`: training from a `BlockSource`
//! - `generator`: wave-by-wave generation with per-coordinate seeding
//!
//! ## Example
//!
//! ```ignore
//! use synth_core::{train, BlockGridSink, Bounds, Coords, GeneratingWorld, SynthConfig};
//!
//! let config = SynthConfig::default();
//! let catalog = train(&source, sample_region, &config.sample_config())?;
//!
//! let target = Bounds::new(Coords::new(-24, 0, -24), Coords::new(23, 11, 23))?;
//! let mut world = GeneratingWorld::new(&catalog, target, config.seed)?;
//! let mut sink = BlockGridSink::new(catalog.tile_size());
//! world.run(&mut sink)?;
//! let blocks = sink.finish()?;
//! ```

pub mod catalog;
pub mod config;
pub mod face;
pub mod generator;
pub mod geometry;
pub mod multiset;
pub mod piece;
pub mod pool;
pub mod rng;
pub mod sample;
pub mod sparse_grid;
pub mod symmetry;
pub mod transform;

pub use catalog::{Catalog, CatalogError, CatalogStats, PieceNeighbors};
pub use config::{ConfigError, ConfigResult, SynthConfig};
pub use face::{Face, FaceError, FaceKind};
pub use generator::{
    BlockGridSink, GeneratingWorld, GenerationError, GenerationReport, GenerationState,
    PlacementSink, ResolveMode,
};
pub use geometry::{Bounds, BoundsError, Coords};
pub use multiset::{MultisetError, WeightedMultiset, WeightedSampler};
pub use piece::{Block, Piece, PieceError};
pub use pool::{PieceId, PiecePool, UnknownPiece};
pub use rng::{coord_seed, StdRandom, SynthRng};
pub use sample::{train, BlockSource, ExtractionReport, SampleConfig, SampleError, SampleExtractor};
pub use sparse_grid::{SparseGrid, SparseGridError};
pub use symmetry::{generate_sibling_ids, generate_siblings, observation_orbit, SymmetryGroup};
pub use transform::{Angle, Axis, InvalidAngle, Transform};
