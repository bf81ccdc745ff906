//! The 26 neighbor directions of a cell.
//!
//! A `Face` is a non-zero triple of unit offsets: 6 axis-aligned faces, 12
//! edges and 8 corners. Rotations and reflections of a non-zero unit triple
//! are again non-zero unit triples, so every transform maps a `Face` to
//! another member of the same 26-element set.
//!
//! Naming follows block-game conventions with Y vertical:
//! `TOP = +y`, `BOTTOM = -y`, `EAST = +x`, `WEST = -x`, `SOUTH = +z`,
//! `NORTH = -z`.

use crate::transform::{Angle, Axis, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error for offsets that do not name one of the 26 directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceError {
    InvalidOffset(i32, i32, i32),
}

impl fmt::Display for FaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceError::InvalidOffset(dx, dy, dz) => {
                write!(f, "({}, {}, {}) is not a neighbor direction", dx, dy, dz)
            }
        }
    }
}

impl std::error::Error for FaceError {}

/// How many axes a direction moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceKind {
    /// Shares a face with the center cell (6)
    Cartesian,
    /// Shares an edge (12)
    Edge,
    /// Shares a corner (8)
    Corner,
}

/// One of the 26 directions from a cell to an adjacent cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32, i32)", into = "(i32, i32, i32)")]
pub struct Face {
    dx: i8,
    dy: i8,
    dz: i8,
}

const fn face(dx: i8, dy: i8, dz: i8) -> Face {
    Face { dx, dy, dz }
}

impl Face {
    pub const TOP: Face = face(0, 1, 0);
    pub const BOTTOM: Face = face(0, -1, 0);
    pub const EAST: Face = face(1, 0, 0);
    pub const WEST: Face = face(-1, 0, 0);
    pub const SOUTH: Face = face(0, 0, 1);
    pub const NORTH: Face = face(0, 0, -1);

    pub const TOP_EAST: Face = face(1, 1, 0);
    pub const TOP_WEST: Face = face(-1, 1, 0);
    pub const TOP_SOUTH: Face = face(0, 1, 1);
    pub const TOP_NORTH: Face = face(0, 1, -1);
    pub const BOTTOM_EAST: Face = face(1, -1, 0);
    pub const BOTTOM_WEST: Face = face(-1, -1, 0);
    pub const BOTTOM_SOUTH: Face = face(0, -1, 1);
    pub const BOTTOM_NORTH: Face = face(0, -1, -1);
    pub const SOUTH_EAST: Face = face(1, 0, 1);
    pub const SOUTH_WEST: Face = face(-1, 0, 1);
    pub const NORTH_EAST: Face = face(1, 0, -1);
    pub const NORTH_WEST: Face = face(-1, 0, -1);

    pub const TOP_SOUTH_EAST: Face = face(1, 1, 1);
    pub const TOP_SOUTH_WEST: Face = face(-1, 1, 1);
    pub const TOP_NORTH_EAST: Face = face(1, 1, -1);
    pub const TOP_NORTH_WEST: Face = face(-1, 1, -1);
    pub const BOTTOM_SOUTH_EAST: Face = face(1, -1, 1);
    pub const BOTTOM_SOUTH_WEST: Face = face(-1, -1, 1);
    pub const BOTTOM_NORTH_EAST: Face = face(1, -1, -1);
    pub const BOTTOM_NORTH_WEST: Face = face(-1, -1, -1);

    /// The six axis-aligned directions, in extraction order.
    pub const CARTESIAN: [Face; 6] = [
        Face::TOP,
        Face::BOTTOM,
        Face::WEST,
        Face::EAST,
        Face::NORTH,
        Face::SOUTH,
    ];

    /// All 26 directions: cartesian, then edges, then corners.
    pub const ALL: [Face; 26] = [
        Face::TOP,
        Face::BOTTOM,
        Face::WEST,
        Face::EAST,
        Face::NORTH,
        Face::SOUTH,
        Face::TOP_EAST,
        Face::TOP_WEST,
        Face::TOP_SOUTH,
        Face::TOP_NORTH,
        Face::BOTTOM_EAST,
        Face::BOTTOM_WEST,
        Face::BOTTOM_SOUTH,
        Face::BOTTOM_NORTH,
        Face::SOUTH_EAST,
        Face::SOUTH_WEST,
        Face::NORTH_EAST,
        Face::NORTH_WEST,
        Face::TOP_SOUTH_EAST,
        Face::TOP_SOUTH_WEST,
        Face::TOP_NORTH_EAST,
        Face::TOP_NORTH_WEST,
        Face::BOTTOM_SOUTH_EAST,
        Face::BOTTOM_SOUTH_WEST,
        Face::BOTTOM_NORTH_EAST,
        Face::BOTTOM_NORTH_WEST,
    ];

    /// Look up the direction with the given unit offsets.
    ///
    /// Fails for `(0, 0, 0)` and for any component outside `-1..=1`.
    pub fn from_offset(dx: i32, dy: i32, dz: i32) -> Result<Face, FaceError> {
        let unit = |v: i32| (-1..=1).contains(&v);
        if !(unit(dx) && unit(dy) && unit(dz)) || (dx, dy, dz) == (0, 0, 0) {
            return Err(FaceError::InvalidOffset(dx, dy, dz));
        }
        Ok(face(dx as i8, dy as i8, dz as i8))
    }

    /// `(dx, dy, dz)` unit offsets.
    #[inline]
    pub fn offset(self) -> (i32, i32, i32) {
        (self.dx as i32, self.dy as i32, self.dz as i32)
    }

    pub fn opposite(self) -> Face {
        face(-self.dx, -self.dy, -self.dz)
    }

    pub fn kind(self) -> FaceKind {
        let moved = [self.dx, self.dy, self.dz]
            .iter()
            .filter(|&&d| d != 0)
            .count();
        match moved {
            1 => FaceKind::Cartesian,
            2 => FaceKind::Edge,
            _ => FaceKind::Corner,
        }
    }

    /// Position of this face in [`Face::ALL`].
    pub fn index(self) -> usize {
        Face::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    /// Apply an arbitrary cube symmetry.
    pub fn transformed(self, t: Transform) -> Face {
        let [dx, dy, dz] = t.apply_vector([self.dx as i32, self.dy as i32, self.dz as i32]);
        face(dx as i8, dy as i8, dz as i8)
    }

    pub fn rotate_x(self, angle: Angle) -> Face {
        self.transformed(Transform::rotation(Axis::X, angle))
    }

    pub fn rotate_y(self, angle: Angle) -> Face {
        self.transformed(Transform::rotation(Axis::Y, angle))
    }

    pub fn rotate_z(self, angle: Angle) -> Face {
        self.transformed(Transform::rotation(Axis::Z, angle))
    }

    pub fn flip_x(self) -> Face {
        self.transformed(Transform::flip(Axis::X))
    }

    pub fn flip_y(self) -> Face {
        self.transformed(Transform::flip(Axis::Y))
    }

    pub fn flip_z(self) -> Face {
        self.transformed(Transform::flip(Axis::Z))
    }

    /// Upper-case name such as `TOP_NORTH_EAST`.
    pub fn name(self) -> &'static str {
        match (self.dx, self.dy, self.dz) {
            (0, 1, 0) => "TOP",
            (0, -1, 0) => "BOTTOM",
            (1, 0, 0) => "EAST",
            (-1, 0, 0) => "WEST",
            (0, 0, 1) => "SOUTH",
            (0, 0, -1) => "NORTH",
            (1, 1, 0) => "TOP_EAST",
            (-1, 1, 0) => "TOP_WEST",
            (0, 1, 1) => "TOP_SOUTH",
            (0, 1, -1) => "TOP_NORTH",
            (1, -1, 0) => "BOTTOM_EAST",
            (-1, -1, 0) => "BOTTOM_WEST",
            (0, -1, 1) => "BOTTOM_SOUTH",
            (0, -1, -1) => "BOTTOM_NORTH",
            (1, 0, 1) => "SOUTH_EAST",
            (-1, 0, 1) => "SOUTH_WEST",
            (1, 0, -1) => "NORTH_EAST",
            (-1, 0, -1) => "NORTH_WEST",
            (1, 1, 1) => "TOP_SOUTH_EAST",
            (-1, 1, 1) => "TOP_SOUTH_WEST",
            (1, 1, -1) => "TOP_NORTH_EAST",
            (-1, 1, -1) => "TOP_NORTH_WEST",
            (1, -1, 1) => "BOTTOM_SOUTH_EAST",
            (-1, -1, 1) => "BOTTOM_SOUTH_WEST",
            (1, -1, -1) => "BOTTOM_NORTH_EAST",
            _ => "BOTTOM_NORTH_WEST",
        }
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<(i32, i32, i32)> for Face {
    type Error = FaceError;

    fn try_from((dx, dy, dz): (i32, i32, i32)) -> Result<Self, Self::Error> {
        Face::from_offset(dx, dy, dz)
    }
}

impl From<Face> for (i32, i32, i32) {
    fn from(face: Face) -> Self {
        face.offset()
    }
}
