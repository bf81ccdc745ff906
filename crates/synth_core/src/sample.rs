//! Training: learning neighbor statistics from a sampled block region.
//!
//! The region is cut into a lattice of non-overlapping cubic tiles. For every
//! lattice position the extractor records the tile and its six axis-aligned
//! neighbor tiles, expands that observation over the allowed symmetry group
//! and folds every distinct orbit member into the catalog with weight 1.
//!
//! Neighbor addressing wraps around horizontally (X and Z) within the
//! sampled lattice. Vertically it wraps only when
//! `use_modulo_coords_top_and_bottom` is set; otherwise the bottom row has no
//! BOTTOM neighbor and the top row has no TOP neighbor.
//!
//! # Example
//!
//! ```ignore
//! use synth_core::{train, Block, Bounds, Coords, SampleConfig};
//!
//! let region = Bounds::new(Coords::new(0, 0, 0), Coords::new(11, 5, 11))?;
//! let ground = |c: Coords| if c.y < 3 { Block(1) } else { Block::AIR };
//! let catalog = train(&ground, region, &SampleConfig::default())?;
//! ```

use crate::catalog::{Catalog, CatalogError, PieceNeighbors};
use crate::face::Face;
use crate::geometry::{Bounds, Coords};
use crate::piece::{Block, Piece};
use crate::pool::{PieceId, UnknownPiece};
use crate::sparse_grid::SparseGrid;
use crate::symmetry::{observation_orbit, SymmetryGroup};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Read access to the blocks of an external world.
pub trait BlockSource {
    fn block_at(&self, at: Coords) -> Block;
}

impl<F> BlockSource for F
where
    F: Fn(Coords) -> Block,
{
    fn block_at(&self, at: Coords) -> Block {
        self(at)
    }
}

/// Unset cells read as the grid's fill value, or air without one.
impl BlockSource for SparseGrid<Block> {
    fn block_at(&self, at: Coords) -> Block {
        self.get_or_fill(at).copied().unwrap_or(Block::AIR)
    }
}

/// Training switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Tile edge length in blocks
    pub tile_size: u32,
    /// Expand observations over the full cube group instead of Y-only
    pub allow_upside_down: bool,
    /// Wrap vertical neighbors around the sampled region
    pub use_modulo_coords_top_and_bottom: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            tile_size: 3,
            allow_upside_down: false,
            use_modulo_coords_top_and_bottom: false,
        }
    }
}

impl SampleConfig {
    pub fn symmetry(&self) -> SymmetryGroup {
        SymmetryGroup::for_upside_down(self.allow_upside_down)
    }
}

/// Errors raised during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// Tile size of zero
    InvalidTileSize(u32),
    /// The region does not hold a single tile along some axis
    RegionTooSmall { size: [u64; 3], tile_size: u32 },
    /// Catalog rejected a tile or observation
    Catalog(CatalogError),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::InvalidTileSize(size) => {
                write!(f, "tile size must be at least 1, got {}", size)
            }
            SampleError::RegionTooSmall { size, tile_size } => write!(
                f,
                "sample region {}x{}x{} is smaller than one {}-block tile",
                size[0], size[1], size[2], tile_size
            ),
            SampleError::Catalog(e) => write!(f, "catalog error: {}", e),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for SampleError {
    fn from(e: CatalogError) -> Self {
        SampleError::Catalog(e)
    }
}

impl From<UnknownPiece> for SampleError {
    fn from(e: UnknownPiece) -> Self {
        SampleError::Catalog(e.into())
    }
}

/// Counts from one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionReport {
    /// Lattice positions observed
    pub observations: usize,
    /// Distinct tiles cut from the region
    pub distinct_tiles: usize,
    /// Orbit members folded into the catalog
    pub orbit_members: usize,
}

/// Cuts a sampled region into tiles and records their neighbors.
pub struct SampleExtractor<'s> {
    source: &'s dyn BlockSource,
    region: Bounds,
    config: SampleConfig,
    /// Tiles per axis
    tiles: [i32; 3],
    /// lattice coordinate -> interned tile
    cache: HashMap<Coords, PieceId>,
}

impl<'s> SampleExtractor<'s> {
    pub fn new(
        source: &'s dyn BlockSource,
        region: Bounds,
        config: SampleConfig,
    ) -> Result<Self, SampleError> {
        if config.tile_size == 0 {
            return Err(SampleError::InvalidTileSize(0));
        }
        let size = region.size();
        let t = config.tile_size as u64;
        if size.iter().any(|&s| s < t) {
            return Err(SampleError::RegionTooSmall {
                size,
                tile_size: config.tile_size,
            });
        }
        let tiles = [(size[0] / t) as i32, (size[1] / t) as i32, (size[2] / t) as i32];
        Ok(Self {
            source,
            region,
            config,
            tiles,
            cache: HashMap::new(),
        })
    }

    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Lattice positions, starting at the origin.
    pub fn lattice(&self) -> Bounds {
        Bounds::from_corners(
            Coords::ORIGIN,
            Coords::new(self.tiles[0] - 1, self.tiles[1] - 1, self.tiles[2] - 1),
        )
    }

    /// Lattice position of the neighbor in direction `face`, if any.
    fn neighbor_of(&self, at: Coords, face: Face) -> Option<Coords> {
        let n = at.offset(face);
        let y = if self.config.use_modulo_coords_top_and_bottom {
            n.y.rem_euclid(self.tiles[1])
        } else if (0..self.tiles[1]).contains(&n.y) {
            n.y
        } else {
            return None;
        };
        Some(Coords::new(
            n.x.rem_euclid(self.tiles[0]),
            y,
            n.z.rem_euclid(self.tiles[2]),
        ))
    }

    /// Interned tile at a lattice position, cut from the source once.
    fn tile(&mut self, at: Coords, catalog: &mut Catalog) -> Result<PieceId, SampleError> {
        if let Some(&id) = self.cache.get(&at) {
            return Ok(id);
        }
        let t = self.config.tile_size as usize;
        let origin = self.region.min();
        let base = Coords::new(
            origin.x + at.x * t as i32,
            origin.y + at.y * t as i32,
            origin.z + at.z * t as i32,
        );
        let source = self.source;
        let piece = Piece::from_fn([t; 3], |x, y, z| {
            source.block_at(Coords::new(
                base.x + x as i32,
                base.y + y as i32,
                base.z + z as i32,
            ))
        })
        .map_err(|_| SampleError::InvalidTileSize(self.config.tile_size))?;
        let id = catalog.intern(piece)?;
        self.cache.insert(at, id);
        Ok(id)
    }

    /// The raw observation at one lattice position: its tile and the six
    /// axis-aligned neighbors that exist.
    pub fn observe(
        &mut self,
        at: Coords,
        catalog: &mut Catalog,
    ) -> Result<PieceNeighbors, SampleError> {
        let center = self.tile(at, catalog)?;
        let mut observation = PieceNeighbors::new(center);
        for face in Face::CARTESIAN {
            if let Some(n) = self.neighbor_of(at, face) {
                let neighbor = self.tile(n, catalog)?;
                observation.add_neighbor(face, neighbor, 1);
            }
        }
        Ok(observation)
    }

    /// Observe every lattice position and fold the symmetry orbits into
    /// `catalog`.
    pub fn extract_into(&mut self, catalog: &mut Catalog) -> Result<ExtractionReport, SampleError> {
        let tile_size = self.config.tile_size as usize;
        if catalog.tile_size() != tile_size {
            return Err(CatalogError::TileSizeMismatch {
                expected: catalog.tile_size(),
                actual: [tile_size; 3],
            }
            .into());
        }

        let group = self.config.symmetry();
        let mut report = ExtractionReport::default();
        for at in self.lattice().iter() {
            let observation = self.observe(at, catalog)?;
            let orbit = observation_orbit(&observation, group, catalog.pool_mut())?;
            debug!("Tile {} at {} expands to {} orbit members", observation.center(), at, orbit.len());
            report.observations += 1;
            report.orbit_members += orbit.len();
            for member in orbit {
                catalog.add(member)?;
            }
        }
        let mut distinct: Vec<PieceId> = self.cache.values().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        report.distinct_tiles = distinct.len();

        info!(
            "Extracted {} observations ({} distinct tiles, {} orbit members) from {}: {}",
            report.observations,
            report.distinct_tiles,
            report.orbit_members,
            self.region,
            catalog.stats()
        );
        Ok(report)
    }
}

/// Build a fresh catalog from one sampled region.
pub fn train(
    source: &dyn BlockSource,
    region: Bounds,
    config: &SampleConfig,
) -> Result<Catalog, SampleError> {
    let mut catalog = Catalog::new(config.tile_size)
        .map_err(|_| SampleError::InvalidTileSize(config.tile_size))?;
    SampleExtractor::new(source, region, *config)?.extract_into(&mut catalog)?;
    Ok(catalog)
}
