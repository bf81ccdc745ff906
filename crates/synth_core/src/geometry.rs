//! Integer coordinates and axis-aligned boxes.
//!
//! Both types are small `Copy` values. `Coords` orders lexicographically by
//! `(x, y, z)`, which is the traversal order used everywhere a deterministic
//! order over cells is needed (grid iteration, generation waves).
//!
//! ## Coordinate Systems
//!
//! - **Block coordinates**: positions of individual blocks in the sampled or
//!   generated volume.
//! - **Lattice coordinates**: positions of whole tiles, `block / tile_size`
//!   rounded toward negative infinity.

use crate::face::Face;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3-integer coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coords {
    pub const ORIGIN: Coords = Coords { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring coordinate one step in `face`'s direction.
    pub fn offset(self, face: Face) -> Coords {
        let (dx, dy, dz) = face.offset();
        Coords::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Like [`Coords::offset`], but `None` when the step leaves the i32 range.
    pub fn checked_offset(self, face: Face) -> Option<Coords> {
        let (dx, dy, dz) = face.offset();
        Some(Coords::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// Sum of absolute per-axis differences.
    pub fn manhattan_distance(self, other: Coords) -> i64 {
        let [dx, dy, dz] = self.deltas(other);
        dx.abs() + dy.abs() + dz.abs()
    }

    /// Squared euclidean distance (exact, no floating point).
    pub fn squared_distance(self, other: Coords) -> i64 {
        let [dx, dy, dz] = self.deltas(other);
        dx * dx + dy * dy + dz * dz
    }

    /// Largest absolute per-axis difference.
    pub fn chebyshev_distance(self, other: Coords) -> i64 {
        let [dx, dy, dz] = self.deltas(other);
        dx.abs().max(dy.abs()).max(dz.abs())
    }

    /// Block coordinate of `(x, y, z)` inside the tile at this lattice position.
    /// `None` when it falls outside the i32 range.
    pub fn checked_cell(self, tile_size: i32, x: usize, y: usize, z: usize) -> Option<Coords> {
        let along = |base: i32, step: usize| {
            base.checked_mul(tile_size)?
                .checked_add(i32::try_from(step).ok()?)
        };
        Some(Coords::new(along(self.x, x)?, along(self.y, y)?, along(self.z, z)?))
    }

    fn deltas(self, other: Coords) -> [i64; 3] {
        [
            other.x as i64 - self.x as i64,
            other.y as i64 - self.y as i64,
            other.z as i64 - self.z as i64,
        ]
    }
}

impl From<(i32, i32, i32)> for Coords {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Coords::new(x, y, z)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Error type for bounds construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsError {
    /// `min > max` on the named axis
    Inverted { axis: char, min: i32, max: i32 },
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsError::Inverted { axis, min, max } => {
                write!(f, "bounds inverted on {} axis: min {} > max {}", axis, min, max)
            }
        }
    }
}

impl std::error::Error for BoundsError {}

/// Inclusive axis-aligned integer box.
///
/// Invariant: `min <= max` on every axis. Only constructible through
/// [`Bounds::new`] (checked) or [`Bounds::from_corners`] (normalizing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct Bounds {
    min: Coords,
    max: Coords,
}

#[derive(Deserialize)]
struct RawBounds {
    min: Coords,
    max: Coords,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = BoundsError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Bounds::new(raw.min, raw.max)
    }
}

impl Bounds {
    /// Create bounds from inclusive corners, rejecting `min > max`.
    pub fn new(min: Coords, max: Coords) -> Result<Self, BoundsError> {
        for (axis, lo, hi) in [
            ('x', min.x, max.x),
            ('y', min.y, max.y),
            ('z', min.z, max.z),
        ] {
            if lo > hi {
                return Err(BoundsError::Inverted {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Create bounds spanning two arbitrary corners.
    pub fn from_corners(a: Coords, b: Coords) -> Self {
        Self {
            min: Coords::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Coords::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Bounds containing exactly one cell.
    pub fn single(at: Coords) -> Self {
        Self { min: at, max: at }
    }

    pub fn min(&self) -> Coords {
        self.min
    }

    pub fn max(&self) -> Coords {
        self.max
    }

    /// Extent per axis (`max - min + 1`).
    pub fn size(&self) -> [u64; 3] {
        [
            (self.max.x as i64 - self.min.x as i64 + 1) as u64,
            (self.max.y as i64 - self.min.y as i64 + 1) as u64,
            (self.max.z as i64 - self.min.z as i64 + 1) as u64,
        ]
    }

    /// Number of cells, saturating at `u64::MAX`.
    pub fn volume(&self) -> u64 {
        let [sx, sy, sz] = self.size();
        sx.saturating_mul(sy).saturating_mul(sz)
    }

    #[inline]
    pub fn contains(&self, c: Coords) -> bool {
        c.x >= self.min.x
            && c.x <= self.max.x
            && c.y >= self.min.y
            && c.y <= self.max.y
            && c.z >= self.min.z
            && c.z <= self.max.z
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Smallest bounds containing both `self` and `c`.
    pub fn expanded_to(&self, c: Coords) -> Bounds {
        Bounds::from_corners(
            Coords::new(
                self.min.x.min(c.x),
                self.min.y.min(c.y),
                self.min.z.min(c.z),
            ),
            Coords::new(
                self.max.x.max(c.x),
                self.max.y.max(c.y),
                self.max.z.max(c.z),
            ),
        )
    }

    /// Lattice bounds of the tiles that intersect this block region.
    ///
    /// The lower edge is floored and the exclusive upper edge is rounded up, so
    /// a tile that is only partially covered still belongs to the lattice.
    pub fn to_lattice(&self, tile_size: u32) -> Bounds {
        let t = tile_size.max(1) as i32;
        Bounds {
            min: Coords::new(
                self.min.x.div_euclid(t),
                self.min.y.div_euclid(t),
                self.min.z.div_euclid(t),
            ),
            max: Coords::new(
                self.max.x.div_euclid(t),
                self.max.y.div_euclid(t),
                self.max.z.div_euclid(t),
            ),
        }
    }

    /// Every coordinate in ascending x, then y, then z order.
    pub fn iter(&self) -> impl Iterator<Item = Coords> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| Coords::new(x, y, z)))
        })
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_rejects_inverted() {
        let result = Bounds::new(Coords::new(0, 5, 0), Coords::new(3, 4, 3));
        assert_eq!(
            result,
            Err(BoundsError::Inverted {
                axis: 'y',
                min: 5,
                max: 4
            })
        );
    }

    #[test]
    fn test_bounds_from_corners_normalizes() {
        let b = Bounds::from_corners(Coords::new(3, -1, 2), Coords::new(-2, 4, 2));
        assert_eq!(b.min(), Coords::new(-2, -1, 2));
        assert_eq!(b.max(), Coords::new(3, 4, 2));
        assert_eq!(b.size(), [6, 6, 1]);
        assert_eq!(b.volume(), 36);
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(Coords::new(-1, -1, -1), Coords::new(1, 1, 1)).unwrap();
        assert!(b.contains(Coords::ORIGIN));
        assert!(b.contains(Coords::new(-1, 1, -1)));
        assert!(!b.contains(Coords::new(2, 0, 0)));
        assert!(!b.contains(Coords::new(0, -2, 0)));
    }

    #[test]
    fn test_bounds_iter_order() {
        let b = Bounds::new(Coords::new(0, 0, 0), Coords::new(1, 1, 1)).unwrap();
        let cells: Vec<_> = b.iter().collect();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0], Coords::new(0, 0, 0));
        assert_eq!(cells[1], Coords::new(0, 0, 1));
        assert_eq!(cells[2], Coords::new(0, 1, 0));
        assert_eq!(cells[7], Coords::new(1, 1, 1));
        let mut sorted = cells.clone();
        sorted.sort();
        assert_eq!(cells, sorted);
    }

    #[test]
    fn test_to_lattice_covers_partial_tiles() {
        let b = Bounds::new(Coords::new(0, 0, 0), Coords::new(9, 3, 4)).unwrap();
        let lattice = b.to_lattice(4);
        assert_eq!(lattice.min(), Coords::new(0, 0, 0));
        assert_eq!(lattice.max(), Coords::new(2, 0, 1));

        let negative = Bounds::new(Coords::new(-5, -4, -1), Coords::new(-1, 0, 0)).unwrap();
        let lattice = negative.to_lattice(4);
        assert_eq!(lattice.min(), Coords::new(-2, -1, -1));
        assert_eq!(lattice.max(), Coords::new(-1, 0, 0));
    }

    #[test]
    fn test_checked_cell_near_range_ends() {
        assert_eq!(Coords::new(-1, 0, 2).checked_cell(2, 1, 0, 1), Some(Coords::new(-1, 0, 5)));
        let top = Coords::new(i32::MAX / 2, 0, 0);
        assert_eq!(top.checked_cell(2, 1, 0, 0), Some(Coords::new(i32::MAX, 0, 0)));
        assert_eq!(Coords::new(i32::MAX / 2 + 1, 0, 0).checked_cell(2, 0, 0, 0), None);
        assert_eq!(Coords::new(i32::MIN / 3 - 1, 0, 0).checked_cell(3, 2, 0, 0), None);
    }

    #[test]
    fn test_distances() {
        let a = Coords::new(1, 2, 3);
        let b = Coords::new(-2, 6, 3);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(a.squared_distance(b), 25);
        assert_eq!(a.chebyshev_distance(b), 4);
    }

    #[test]
    fn test_offset_by_face() {
        let c = Coords::new(5, 5, 5);
        assert_eq!(c.offset(Face::TOP), Coords::new(5, 6, 5));
        assert_eq!(c.offset(Face::BOTTOM_NORTH_WEST), Coords::new(4, 4, 4));
        assert_eq!(c.checked_offset(Face::TOP), Some(Coords::new(5, 6, 5)));
        let edge = Coords::new(i32::MAX, 0, i32::MIN);
        assert_eq!(edge.checked_offset(Face::EAST), None);
        assert_eq!(edge.checked_offset(Face::WEST), Some(Coords::new(i32::MAX - 1, 0, i32::MIN)));
        assert_eq!(edge.checked_offset(Face::TOP), Some(Coords::new(i32::MAX, 1, i32::MIN)));
    }

    #[test]
    fn test_bounds_deserialize_validates() {
        let ok: Bounds =
            serde_json::from_str(r#"{"min":{"x":0,"y":0,"z":0},"max":{"x":1,"y":2,"z":3}}"#)
                .unwrap();
        assert_eq!(ok.size(), [2, 3, 4]);

        let bad = serde_json::from_str::<Bounds>(
            r#"{"min":{"x":2,"y":0,"z":0},"max":{"x":1,"y":2,"z":3}}"#,
        );
        assert!(bad.is_err());
    }
}
