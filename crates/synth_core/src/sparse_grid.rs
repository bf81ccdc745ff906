//! Growable 3D array addressed by signed coordinates.
//!
//! `SparseGrid<T>` accepts `get`/`set` at any `i32` coordinate. Storage is a
//! dense backing array plus a per-axis origin; writing outside the allocated
//! range grows that axis on the side that needs it by the distance plus
//! `enlarge_at_once` extra slots, so a run of single-step writes does not
//! reallocate every time. Growth only moves the internal offset: every stored
//! value keeps its coordinate.
//!
//! A cell that was never written reads as `None`. When a fill value is
//! configured, [`SparseGrid::get_or_fill`] and [`SparseGrid::iter`] report it
//! in place of `None`; [`SparseGrid::get`] and [`SparseGrid::iter_raw`] never
//! substitute.
//!
//! Indexing follows `index = x + y * len_x + z * len_x * len_y` over the
//! backing array.

use crate::geometry::{Bounds, Coords};
use crate::piece::Block;
use crate::sample::BlockSource;
use std::fmt;

/// Default number of extra slots allocated per growth step.
pub const DEFAULT_ENLARGE_AT_ONCE: usize = 8;

/// Errors surfaced by the fallible grid operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparseGridError {
    /// The backing array would exceed addressable memory
    CapacityOverflow { dims: [usize; 3] },
    /// The allocator refused the new backing array
    OutOfMemory { cells: usize },
}

impl fmt::Display for SparseGridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparseGridError::CapacityOverflow { dims } => write!(
                f,
                "grid of {}x{}x{} cells exceeds addressable memory",
                dims[0], dims[1], dims[2]
            ),
            SparseGridError::OutOfMemory { cells } => {
                write!(f, "out of memory allocating {} grid cells", cells)
            }
        }
    }
}

impl std::error::Error for SparseGridError {}

/// Allocated range along one axis: index 0 is coordinate `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct AxisLayout {
    origin: i32,
    len: usize,
}

impl AxisLayout {
    #[inline]
    fn index_of(&self, coord: i32) -> Option<usize> {
        let offset = coord as i64 - self.origin as i64;
        if offset >= 0 && (offset as u64) < self.len as u64 {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Layout that also covers `coord`, growing only the side that needs it.
    fn grown_to(&self, coord: i32, enlarge: usize) -> AxisLayout {
        let enlarge = enlarge as i64;
        if self.len == 0 {
            let end = (coord as i64 + enlarge).min(i32::MAX as i64);
            return AxisLayout {
                origin: coord,
                len: (end - coord as i64 + 1) as usize,
            };
        }
        let start = self.origin as i64;
        let end = start + self.len as i64 - 1;
        let c = coord as i64;
        if c < start {
            let new_start = (c - enlarge).max(i32::MIN as i64);
            AxisLayout {
                origin: new_start as i32,
                len: (end - new_start + 1) as usize,
            }
        } else if c > end {
            let new_end = (c + enlarge).min(i32::MAX as i64);
            AxisLayout {
                origin: self.origin,
                len: (new_end - start + 1) as usize,
            }
        } else {
            *self
        }
    }
}

/// Growable, offset-indexed 3D array with an "unset" state per cell.
#[derive(Debug, Clone)]
pub struct SparseGrid<T> {
    cells: Vec<Option<T>>,
    axes: [AxisLayout; 3],
    populated: Option<Bounds>,
    count: usize,
    fill: Option<T>,
    enlarge_at_once: usize,
}

impl<T> Default for SparseGrid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseGrid<T> {
    pub fn new() -> Self {
        Self::with_enlarge_at_once(DEFAULT_ENLARGE_AT_ONCE)
    }

    /// Grid growing by `enlarge_at_once` extra slots per step (at least 1).
    pub fn with_enlarge_at_once(enlarge_at_once: usize) -> Self {
        Self {
            cells: Vec::new(),
            axes: [AxisLayout::default(); 3],
            populated: None,
            count: 0,
            fill: None,
            enlarge_at_once: enlarge_at_once.max(1),
        }
    }

    /// Set the value reported for unset cells by the fill-aware accessors.
    pub fn with_fill(mut self, fill: T) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn set_fill(&mut self, fill: Option<T>) {
        self.fill = fill;
    }

    pub fn fill(&self) -> Option<&T> {
        self.fill.as_ref()
    }

    /// Change the growth step for later writes; stored values are kept.
    pub fn set_enlarge_at_once(&mut self, enlarge_at_once: usize) {
        self.enlarge_at_once = enlarge_at_once.max(1);
    }

    pub fn enlarge_at_once(&self) -> usize {
        self.enlarge_at_once
    }

    /// Number of cells currently holding a value.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Allocated extents of the backing array.
    pub fn capacity_dims(&self) -> [usize; 3] {
        [self.axes[0].len, self.axes[1].len, self.axes[2].len]
    }

    /// Smallest box containing every coordinate ever set.
    ///
    /// Not shrunk by [`SparseGrid::clear_cell`].
    pub fn populated_bounds(&self) -> Option<Bounds> {
        self.populated
    }

    #[inline]
    fn index(&self, at: Coords) -> Option<usize> {
        let ix = self.axes[0].index_of(at.x)?;
        let iy = self.axes[1].index_of(at.y)?;
        let iz = self.axes[2].index_of(at.z)?;
        Some(ix + iy * self.axes[0].len + iz * self.axes[0].len * self.axes[1].len)
    }

    /// Raw cell value, `None` when unset.
    pub fn get(&self, at: Coords) -> Option<&T> {
        self.index(at).and_then(|i| self.cells[i].as_ref())
    }

    pub fn get_mut(&mut self, at: Coords) -> Option<&mut T> {
        let i = self.index(at)?;
        self.cells[i].as_mut()
    }

    /// Cell value, or the fill value when unset, or `None` without a fill.
    pub fn get_or_fill(&self, at: Coords) -> Option<&T> {
        self.get(at).or(self.fill.as_ref())
    }

    pub fn contains(&self, at: Coords) -> bool {
        self.get(at).is_some()
    }

    /// Write `value`, growing storage as needed.
    ///
    /// # Panics
    /// Panics if the backing array cannot be allocated.
    /// Use [`SparseGrid::try_set`] to handle that as an error.
    pub fn set(&mut self, at: Coords, value: T) {
        if let Err(e) = self.try_set(at, value) {
            panic!("sparse grid growth failed: {}", e);
        }
    }

    /// Write `value`, reporting allocation failure instead of panicking.
    pub fn try_set(&mut self, at: Coords, value: T) -> Result<(), SparseGridError> {
        self.ensure_contains(at)?;
        let Some(i) = self.index(at) else {
            // ensure_contains guarantees the coordinate is allocated
            return Err(SparseGridError::CapacityOverflow {
                dims: self.capacity_dims(),
            });
        };
        if self.cells[i].replace(value).is_none() {
            self.count += 1;
        }
        self.populated = Some(match self.populated {
            Some(b) => b.expanded_to(at),
            None => Bounds::single(at),
        });
        Ok(())
    }

    /// Unset a cell, returning its previous value.
    pub fn clear_cell(&mut self, at: Coords) -> Option<T> {
        let i = self.index(at)?;
        let previous = self.cells[i].take();
        if previous.is_some() {
            self.count -= 1;
        }
        previous
    }

    fn ensure_contains(&mut self, at: Coords) -> Result<(), SparseGridError> {
        let coords = [at.x, at.y, at.z];
        let mut grown = self.axes;
        for axis in 0..3 {
            grown[axis] = self.axes[axis].grown_to(coords[axis], self.enlarge_at_once);
        }
        if grown == self.axes {
            return Ok(());
        }
        self.relayout(grown)
    }

    /// Move every stored value into a backing array with the new layout.
    fn relayout(&mut self, layout: [AxisLayout; 3]) -> Result<(), SparseGridError> {
        let dims = [layout[0].len, layout[1].len, layout[2].len];
        let total = dims[0]
            .checked_mul(dims[1])
            .and_then(|v| v.checked_mul(dims[2]))
            .ok_or(SparseGridError::CapacityOverflow { dims })?;

        let mut cells: Vec<Option<T>> = Vec::new();
        cells
            .try_reserve_exact(total)
            .map_err(|_| SparseGridError::OutOfMemory { cells: total })?;
        cells.resize_with(total, || None);

        let old_axes = self.axes;
        let old_cells = std::mem::take(&mut self.cells);
        let (old_lx, old_ly) = (old_axes[0].len, old_axes[1].len);
        for (i, cell) in old_cells.into_iter().enumerate() {
            let Some(value) = cell else { continue };
            let x = old_axes[0].origin as i64 + (i % old_lx) as i64;
            let y = old_axes[1].origin as i64 + ((i / old_lx) % old_ly) as i64;
            let z = old_axes[2].origin as i64 + (i / (old_lx * old_ly)) as i64;
            let nx = (x - layout[0].origin as i64) as usize;
            let ny = (y - layout[1].origin as i64) as usize;
            let nz = (z - layout[2].origin as i64) as usize;
            cells[nx + ny * dims[0] + nz * dims[0] * dims[1]] = Some(value);
        }

        self.cells = cells;
        self.axes = layout;
        Ok(())
    }

    /// Every coordinate of the populated box in ascending x, y, z order, with
    /// the fill value substituted for unset cells.
    pub fn iter(&self) -> impl Iterator<Item = (Coords, Option<&T>)> + '_ {
        self.populated
            .into_iter()
            .flat_map(|b| b.iter())
            .map(move |c| (c, self.get_or_fill(c)))
    }

    /// Like [`SparseGrid::iter`] but unset cells are always reported as `None`.
    pub fn iter_raw(&self) -> impl Iterator<Item = (Coords, Option<&T>)> + '_ {
        self.populated
            .into_iter()
            .flat_map(|b| b.iter())
            .map(move |c| (c, self.get(c)))
    }

    /// Only the cells holding a value, in ascending x, y, z order.
    pub fn iter_set(&self) -> impl Iterator<Item = (Coords, &T)> + '_ {
        self.iter_raw().filter_map(|(c, v)| v.map(|v| (c, v)))
    }
}

impl SparseGrid<Block> {
    /// Copy every block of `bounds` out of `source`.
    pub fn from_source(bounds: Bounds, source: &dyn BlockSource) -> Result<Self, SparseGridError> {
        let mut grid = SparseGrid::new();
        // Reach both corners first so the whole box is allocated once.
        grid.try_set(bounds.min(), source.block_at(bounds.min()))?;
        grid.try_set(bounds.max(), source.block_at(bounds.max()))?;
        for at in bounds.iter() {
            grid.try_set(at, source.block_at(at))?;
        }
        Ok(grid)
    }
}
