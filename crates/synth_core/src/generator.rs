//! Growing a new volume from a trained catalog.
//!
//! `GeneratingWorld` places tiles on a lattice derived from the target block
//! bounds. It seeds one random tile, then expands in synchronous waves: each
//! wave gathers the neighbor options that the previous wave's tiles recorded
//! for their unplaced lattice neighbors, merges the options arriving at the
//! same cell from different directions, and commits every pending cell in
//! ascending coordinate order.
//!
//! A cell's choice is drawn from a generator seeded by
//! [`coord_seed`](crate::rng::coord_seed) of the global seed and the cell
//! coordinate, so it does not depend on when the cell is visited. Two runs
//! with the same seed, catalog and bounds place the same tiles in the same
//! order.
//!
//! State machine: `Idle -> SeededStart -> Expanding -> Done`.
//!
//! # Example
//!
//! ```ignore
//! let mut world = GeneratingWorld::new(&catalog, bounds, Some(7))?;
//! let mut sink = BlockGridSink::new(catalog.tile_size());
//! let report = world.run(&mut sink)?;
//! let blocks = sink.finish()?;
//! ```

use crate::catalog::Catalog;
use crate::face::Face;
use crate::geometry::{Bounds, Coords};
use crate::multiset::WeightedMultiset;
use crate::piece::{Block, Piece};
use crate::pool::PieceId;
use crate::rng::{random_seed, StdRandom, SynthRng};
use crate::sparse_grid::{SparseGrid, SparseGridError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Progress of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Nothing placed yet
    Idle,
    /// Start tile placed, no wave run yet
    SeededStart,
    /// At least one wave has run and tiles remain pending
    Expanding,
    /// No pending cells remain
    Done,
}

/// How a pending cell picks its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Draw from the accumulated options without further checks
    #[default]
    Greedy,
    /// Keep only options consistent with every placed neighbor; an empty
    /// result is a contradiction
    Strict,
}

/// Receives every committed tile, in placement order.
pub trait PlacementSink {
    fn place(&mut self, at: Coords, piece: &Piece);
}

impl<F> PlacementSink for F
where
    F: FnMut(Coords, &Piece),
{
    fn place(&mut self, at: Coords, piece: &Piece) {
        self(at, piece)
    }
}

/// Errors that abort a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The catalog has no entries to start from
    EmptyCatalog,
    /// A chosen tile has no center entry in the catalog
    MissingCatalogEntry { piece: PieceId, at: Coords },
    /// No option is consistent with the placed neighbors (strict mode)
    Contradiction { at: Coords },
    /// The requested step is not valid in the current state
    InvalidState(GenerationState),
    /// Grid storage could not grow
    Grid(SparseGridError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::EmptyCatalog => write!(f, "cannot generate from an empty catalog"),
            GenerationError::MissingCatalogEntry { piece, at } => write!(
                f,
                "piece {} chosen at {} has no catalog entry (corrupted catalog)",
                piece, at
            ),
            GenerationError::Contradiction { at } => {
                write!(f, "no tile is consistent with the neighbors of {}", at)
            }
            GenerationError::InvalidState(state) => {
                write!(f, "operation not valid while generation is {:?}", state)
            }
            GenerationError::Grid(e) => write!(f, "grid error: {}", e),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SparseGridError> for GenerationError {
    fn from(e: SparseGridError) -> Self {
        GenerationError::Grid(e)
    }
}

/// Summary of a finished (or interrupted) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub seed: u64,
    /// Tiles placed, start tile included
    pub placed: u64,
    /// Expansion waves run
    pub waves: u32,
    /// Lattice cells left without a tile
    pub unresolved: u64,
}

/// Single generation run over a fixed catalog and target region.
pub struct GeneratingWorld<'c> {
    catalog: &'c Catalog,
    bounds: Bounds,
    lattice: Bounds,
    seed: u64,
    mode: ResolveMode,
    state: GenerationState,
    placed: SparseGrid<PieceId>,
    placed_count: u64,
    /// Cells placed by the most recent step
    frontier: Vec<Coords>,
    waves: u32,
}

impl<'c> GeneratingWorld<'c> {
    /// Prepare a run filling `bounds` (block coordinates).
    ///
    /// Without a seed one is drawn from OS entropy; [`GeneratingWorld::seed`]
    /// reports it so the run can be reproduced.
    pub fn new(catalog: &'c Catalog, bounds: Bounds, seed: Option<u64>) -> Result<Self, GenerationError> {
        if catalog.is_empty() {
            return Err(GenerationError::EmptyCatalog);
        }
        let lattice = bounds.to_lattice(catalog.tile_size() as u32);
        Ok(Self {
            catalog,
            bounds,
            lattice,
            seed: seed.unwrap_or_else(random_seed),
            mode: ResolveMode::Greedy,
            state: GenerationState::Idle,
            placed: SparseGrid::new(),
            placed_count: 0,
            frontier: Vec::new(),
            waves: 0,
        })
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Storage growth step for the placement grid. Tiles already placed stay.
    pub fn with_enlarge_at_once(mut self, enlarge_at_once: usize) -> Self {
        self.placed.set_enlarge_at_once(enlarge_at_once);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Target region in block coordinates.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Target region in tile units.
    pub fn lattice(&self) -> Bounds {
        self.lattice
    }

    /// Tiles placed so far, by lattice coordinate.
    pub fn placed(&self) -> &SparseGrid<PieceId> {
        &self.placed
    }

    /// Content of the tile placed at a lattice coordinate.
    pub fn piece_at(&self, at: Coords) -> Option<&Piece> {
        self.placed.get(at).and_then(|&id| self.catalog.piece(id))
    }

    pub fn report(&self) -> GenerationReport {
        GenerationReport {
            seed: self.seed,
            placed: self.placed_count,
            waves: self.waves,
            unresolved: self.lattice.volume().saturating_sub(self.placed_count),
        }
    }

    /// Place the start tile: a uniform lattice coordinate and a catalog
    /// entry weighted by occurrence, both drawn from the global seed.
    pub fn start(&mut self, sink: &mut dyn PlacementSink) -> Result<Coords, GenerationError> {
        if self.state != GenerationState::Idle {
            return Err(GenerationError::InvalidState(self.state));
        }
        let mut rng = StdRandom::from_u64_seed(self.seed);
        let (min, max) = (self.lattice.min(), self.lattice.max());
        let at = Coords::new(
            rng.next_i32_inclusive(min.x, max.x),
            rng.next_i32_inclusive(min.y, max.y),
            rng.next_i32_inclusive(min.z, max.z),
        );
        let start_piece = self
            .catalog
            .choose_random(&mut rng)
            .map_err(|_| GenerationError::EmptyCatalog)?
            .center();

        info!(
            "Generating {} ({} lattice cells) with seed {} in {:?} mode, starting at {}",
            self.bounds,
            self.lattice.volume(),
            self.seed,
            self.mode,
            at
        );
        self.commit(at, start_piece, sink)?;
        self.frontier = vec![at];
        self.state = GenerationState::SeededStart;
        Ok(at)
    }

    /// Run one expansion wave. Returns the number of tiles it placed.
    ///
    /// Starts the run first when it is still idle.
    pub fn step_wave(&mut self, sink: &mut dyn PlacementSink) -> Result<usize, GenerationError> {
        match self.state {
            GenerationState::Done => return Err(GenerationError::InvalidState(self.state)),
            GenerationState::Idle => {
                self.start(sink)?;
            }
            GenerationState::SeededStart | GenerationState::Expanding => {}
        }

        let tasks = self.pending_tasks()?;
        let mut next_frontier = Vec::with_capacity(tasks.len());
        for (at, options) in tasks {
            let chosen = self.resolve(at, options)?;
            self.commit(at, chosen, sink)?;
            next_frontier.push(at);
        }

        self.waves += 1;
        let placed = next_frontier.len();
        debug!("Wave {} placed {} tiles ({} total)", self.waves, placed, self.placed_count);
        self.frontier = next_frontier;
        self.state = if self.frontier.is_empty() {
            GenerationState::Done
        } else {
            GenerationState::Expanding
        };
        Ok(placed)
    }

    /// Run to completion.
    pub fn run(&mut self, sink: &mut dyn PlacementSink) -> Result<GenerationReport, GenerationError> {
        while self.state != GenerationState::Done {
            self.step_wave(sink)?;
        }
        let report = self.report();
        if report.unresolved > 0 {
            warn!(
                "Generation stalled with {} of {} lattice cells unresolved",
                report.unresolved,
                self.lattice.volume()
            );
        }
        info!(
            "Generation finished: {} tiles in {} waves (seed {})",
            report.placed, report.waves, report.seed
        );
        Ok(report)
    }

    /// Options for every unplaced lattice cell next to the last wave's tiles,
    /// merged per cell and keyed in coordinate order.
    ///
    /// Tiles placed before the last wave contribute nothing new: every cell
    /// they had options for was committed in the wave after them.
    fn pending_tasks(&self) -> Result<BTreeMap<Coords, WeightedMultiset<PieceId>>, GenerationError> {
        let mut tasks: BTreeMap<Coords, WeightedMultiset<PieceId>> = BTreeMap::new();
        for &from in &self.frontier {
            let Some(&id) = self.placed.get(from) else {
                continue;
            };
            let entry = self
                .catalog
                .get(id)
                .ok_or(GenerationError::MissingCatalogEntry { piece: id, at: from })?;
            for (face, options) in entry.iter() {
                let Some(to) = from.checked_offset(face) else {
                    continue;
                };
                if options.is_empty() || !self.lattice.contains(to) || self.placed.contains(to) {
                    continue;
                }
                tasks.entry(to).or_default().merge(options, 1);
            }
        }
        Ok(tasks)
    }

    fn resolve(
        &self,
        at: Coords,
        mut options: WeightedMultiset<PieceId>,
    ) -> Result<PieceId, GenerationError> {
        if self.mode == ResolveMode::Strict {
            let mut missing = None;
            options.retain(|&candidate, _| match self.consistent_with_neighbors(at, candidate) {
                Some(ok) => ok,
                None => {
                    missing.get_or_insert(candidate);
                    false
                }
            });
            if let Some(piece) = missing {
                return Err(GenerationError::MissingCatalogEntry { piece, at });
            }
            if options.is_empty() {
                warn!("Contradiction at {}", at);
                return Err(GenerationError::Contradiction { at });
            }
        }

        let mut rng = StdRandom::for_coords(self.seed, at);
        let chosen = *options
            .weighted_choose(&mut rng)
            .map_err(|_| GenerationError::Contradiction { at })?;
        Ok(chosen)
    }

    /// Whether `candidate` at `at` agrees with every placed neighbor in both
    /// directions. `None` when `candidate` has no catalog entry.
    fn consistent_with_neighbors(&self, at: Coords, candidate: PieceId) -> Option<bool> {
        let entry = self.catalog.get(candidate)?;
        for face in Face::ALL {
            let Some(&neighbor) = at.checked_offset(face).and_then(|n| self.placed.get(n)) else {
                continue;
            };
            if let Some(options) = entry.get(face) {
                if !options.contains(&neighbor) {
                    return Some(false);
                }
            }
            let back = self
                .catalog
                .get(neighbor)
                .and_then(|n| n.get(face.opposite()));
            if let Some(options) = back {
                if !options.contains(&candidate) {
                    return Some(false);
                }
            }
        }
        Some(true)
    }

    fn commit(
        &mut self,
        at: Coords,
        id: PieceId,
        sink: &mut dyn PlacementSink,
    ) -> Result<(), GenerationError> {
        if !self.catalog.contains(id) {
            return Err(GenerationError::MissingCatalogEntry { piece: id, at });
        }
        let piece = self
            .catalog
            .piece(id)
            .ok_or(GenerationError::MissingCatalogEntry { piece: id, at })?;
        self.placed.try_set(at, id)?;
        self.placed_count += 1;
        trace!("Placed {} at {}", id, at);
        sink.place(at, piece);
        Ok(())
    }
}

/// Writes placed tiles into a block grid at `lattice * tile_size`.
#[derive(Debug, Clone)]
pub struct BlockGridSink {
    tile_size: i32,
    grid: SparseGrid<Block>,
    error: Option<SparseGridError>,
}

impl BlockGridSink {
    pub fn new(tile_size: usize) -> Self {
        Self {
            tile_size: tile_size as i32,
            grid: SparseGrid::new(),
            error: None,
        }
    }

    pub fn grid(&self) -> &SparseGrid<Block> {
        &self.grid
    }

    /// The materialized blocks, or the first storage error hit while writing.
    pub fn finish(self) -> Result<SparseGrid<Block>, SparseGridError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.grid),
        }
    }
}

impl PlacementSink for BlockGridSink {
    fn place(&mut self, at: Coords, piece: &Piece) {
        if self.error.is_some() {
            return;
        }
        for ([x, y, z], block) in piece.iter() {
            let Some(cell) = at.checked_cell(self.tile_size, x, y, z) else {
                self.error = Some(SparseGridError::CapacityOverflow {
                    dims: self.grid.capacity_dims(),
                });
                return;
            };
            if let Err(e) = self.grid.try_set(cell, block) {
                self.error = Some(e);
                return;
            }
        }
    }
}
