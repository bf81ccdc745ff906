//! Rotations and reflections of the cube as signed axis permutations.
//!
//! Every operation in the rotate/flip vocabulary (`rotate_x(90)`, `flip_z()`,
//! ...) is a [`Transform`]: output axis `i` reads input axis `perm[i]`,
//! negated when `negate[i]` is set. Applying the same `Transform` to a
//! direction vector and to a piece's cell positions keeps the two consistent,
//! so "the neighbor to the EAST of `p`" becomes "the neighbor to `t(EAST)` of
//! `t(p)`" for every `t`.
//!
//! Axis conventions (Y is vertical):
//! - `rotate_x(90)`: `(x, y, z) -> (x, -z, y)`
//! - `rotate_y(90)`: `(x, y, z) -> (-z, y, x)`
//! - `rotate_z(90)`: `(x, y, z) -> (-y, x, z)`

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Error for rotation angles that are not a quarter turn multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAngle(pub i32);

impl fmt::Display for InvalidAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rotation angle {} (expected 90, 180 or 270)", self.0)
    }
}

impl std::error::Error for InvalidAngle {}

/// Quarter-turn rotation angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Angle {
    Deg90,
    Deg180,
    Deg270,
}

impl Angle {
    pub const ALL: [Angle; 3] = [Angle::Deg90, Angle::Deg180, Angle::Deg270];

    /// Parse a degree value. Accepts 90, 180 and 270.
    pub fn from_degrees(degrees: i32) -> Result<Self, InvalidAngle> {
        match degrees {
            90 => Ok(Angle::Deg90),
            180 => Ok(Angle::Deg180),
            270 => Ok(Angle::Deg270),
            other => Err(InvalidAngle(other)),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Angle::Deg90 => 90,
            Angle::Deg180 => 180,
            Angle::Deg270 => 270,
        }
    }

    /// Number of 90° steps.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Angle::Deg90 => 1,
            Angle::Deg180 => 2,
            Angle::Deg270 => 3,
        }
    }
}

impl TryFrom<i32> for Angle {
    type Error = InvalidAngle;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Angle::from_degrees(degrees)
    }
}

/// An element of the 48-element cube symmetry group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transform {
    perm: [u8; 3],
    negate: [bool; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        perm: [0, 1, 2],
        negate: [false, false, false],
    };

    const QUARTER_X: Transform = Transform {
        perm: [0, 2, 1],
        negate: [false, true, false],
    };

    const QUARTER_Y: Transform = Transform {
        perm: [2, 1, 0],
        negate: [true, false, false],
    };

    const QUARTER_Z: Transform = Transform {
        perm: [1, 0, 2],
        negate: [true, false, false],
    };

    /// Rotation about `axis` by `angle`.
    pub fn rotation(axis: Axis, angle: Angle) -> Self {
        let quarter = match axis {
            Axis::X => Self::QUARTER_X,
            Axis::Y => Self::QUARTER_Y,
            Axis::Z => Self::QUARTER_Z,
        };
        let mut result = quarter;
        for _ in 1..angle.quarter_turns() {
            result = result.then(quarter);
        }
        result
    }

    /// Mirror along `axis` (negates that coordinate).
    pub fn flip(axis: Axis) -> Self {
        let mut negate = [false; 3];
        negate[axis.index()] = true;
        Transform {
            perm: [0, 1, 2],
            negate,
        }
    }

    /// The transform equivalent to applying `self` first and `next` second.
    pub fn then(self, next: Transform) -> Transform {
        let mut perm = [0u8; 3];
        let mut negate = [false; 3];
        for i in 0..3 {
            let via = next.perm[i] as usize;
            perm[i] = self.perm[via];
            negate[i] = next.negate[i] ^ self.negate[via];
        }
        Transform { perm, negate }
    }

    pub fn inverse(self) -> Transform {
        let mut perm = [0u8; 3];
        for i in 0..3 {
            perm[self.perm[i] as usize] = i as u8;
        }
        let mut negate = [false; 3];
        for j in 0..3 {
            negate[j] = self.negate[perm[j] as usize];
        }
        Transform { perm, negate }
    }

    /// Whether this transform preserves handedness (a pure rotation).
    pub fn is_rotation(self) -> bool {
        let [a, b, c] = self.perm;
        // Even permutations of three elements are the identity and the 3-cycles.
        let even = (a, b, c) == (0, 1, 2) || (a, b, c) == (1, 2, 0) || (a, b, c) == (2, 0, 1);
        let flips = self.negate.iter().filter(|&&n| n).count();
        even == (flips % 2 == 0)
    }

    /// Whether the vertical (Y) axis maps onto itself, keeping "up" up.
    pub fn preserves_up(self) -> bool {
        self.perm[1] == 1 && !self.negate[1]
    }

    /// Transform a direction vector.
    #[inline]
    pub fn apply_vector(self, v: [i32; 3]) -> [i32; 3] {
        let mut out = [0; 3];
        for i in 0..3 {
            let value = v[self.perm[i] as usize];
            out[i] = if self.negate[i] { -value } else { value };
        }
        out
    }

    /// Extents of a box after transformation.
    #[inline]
    pub fn apply_dims(self, dims: [usize; 3]) -> [usize; 3] {
        [
            dims[self.perm[0] as usize],
            dims[self.perm[1] as usize],
            dims[self.perm[2] as usize],
        ]
    }

    /// Cell position inside a box of `dims` after transformation.
    ///
    /// Negation mirrors about the box center, so the result lies inside
    /// `apply_dims(dims)`.
    #[inline]
    pub fn apply_position(self, pos: [usize; 3], dims: [usize; 3]) -> [usize; 3] {
        let mut out = [0; 3];
        for i in 0..3 {
            let src = self.perm[i] as usize;
            out[i] = if self.negate[i] {
                dims[src] - 1 - pos[src]
            } else {
                pos[src]
            };
        }
        out
    }
}
