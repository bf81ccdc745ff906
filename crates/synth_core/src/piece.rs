//! Fixed-size 3D tiles of block values.
//!
//! A `Piece` is a dense `size_x × size_y × size_z` array. Equality and hashing
//! are by content. All rotate/flip operations are pure and return a new piece;
//! 90° and 270° rotations swap the extents of the two axes they turn.
//!
//! Indexing follows `index = x + y * size_x + z * size_x * size_y`.

use crate::transform::{Angle, Axis, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete block value read from or written to a world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Block(pub u16);

impl Block {
    pub const AIR: Block = Block(0);

    pub fn is_air(self) -> bool {
        self == Block::AIR
    }
}

/// Errors raised by piece construction and cell access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PieceError {
    /// One of the extents was zero
    ZeroSize([usize; 3]),
    /// Cell access outside the piece
    OutOfRange { at: [usize; 3], dims: [usize; 3] },
    /// Content length does not match the requested extents
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for PieceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceError::ZeroSize(d) => {
                write!(f, "piece extents must be positive, got {}x{}x{}", d[0], d[1], d[2])
            }
            PieceError::OutOfRange { at, dims } => write!(
                f,
                "cell ({}, {}, {}) outside piece of size {}x{}x{}",
                at[0], at[1], at[2], dims[0], dims[1], dims[2]
            ),
            PieceError::SizeMismatch { expected, actual } => {
                write!(f, "expected {} cells, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for PieceError {}

/// A dense 3D tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    dims: [usize; 3],
    cells: Vec<Block>,
}

impl Piece {
    /// Create a piece of air.
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Result<Self, PieceError> {
        Self::filled([size_x, size_y, size_z], Block::AIR)
    }

    /// Create a cubic piece of air.
    pub fn cube(size: usize) -> Result<Self, PieceError> {
        Self::new(size, size, size)
    }

    /// Create a piece with every cell set to `block`.
    pub fn filled(dims: [usize; 3], block: Block) -> Result<Self, PieceError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(PieceError::ZeroSize(dims));
        }
        Ok(Self {
            dims,
            cells: vec![block; dims[0] * dims[1] * dims[2]],
        })
    }

    /// Create a piece from a flat cell vector in `x + y*sx + z*sx*sy` order.
    pub fn from_cells(dims: [usize; 3], cells: Vec<Block>) -> Result<Self, PieceError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(PieceError::ZeroSize(dims));
        }
        let expected = dims[0] * dims[1] * dims[2];
        if cells.len() != expected {
            return Err(PieceError::SizeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { dims, cells })
    }

    /// Create a piece by evaluating `f` at every cell.
    pub fn from_fn<F>(dims: [usize; 3], mut f: F) -> Result<Self, PieceError>
    where
        F: FnMut(usize, usize, usize) -> Block,
    {
        let mut piece = Self::filled(dims, Block::AIR)?;
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    let i = piece.index_unchecked(x, y, z);
                    piece.cells[i] = f(x, y, z);
                }
            }
        }
        Ok(piece)
    }

    pub fn size_x(&self) -> usize {
        self.dims[0]
    }

    pub fn size_y(&self) -> usize {
        self.dims[1]
    }

    pub fn size_z(&self) -> usize {
        self.dims[2]
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn is_cubic(&self) -> bool {
        self.dims[0] == self.dims[1] && self.dims[1] == self.dims[2]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Block] {
        &self.cells
    }

    #[inline]
    fn index_unchecked(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims[0] + z * self.dims[0] * self.dims[1]
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Result<usize, PieceError> {
        if x < self.dims[0] && y < self.dims[1] && z < self.dims[2] {
            Ok(self.index_unchecked(x, y, z))
        } else {
            Err(PieceError::OutOfRange {
                at: [x, y, z],
                dims: self.dims,
            })
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<Block, PieceError> {
        self.index(x, y, z).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) -> Result<(), PieceError> {
        let i = self.index(x, y, z)?;
        self.cells[i] = block;
        Ok(())
    }

    /// Replace every cell.
    pub fn fill(&mut self, block: Block) {
        self.cells.fill(block);
    }

    /// Count cells that are not air.
    pub fn count_solid(&self) -> usize {
        self.cells.iter().filter(|b| !b.is_air()).count()
    }

    /// Every cell with its local position, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = ([usize; 3], Block)> + '_ {
        let [sx, sy, _] = self.dims;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &b)| ([i % sx, (i / sx) % sy, i / (sx * sy)], b))
    }

    /// Apply an arbitrary cube symmetry.
    pub fn transformed(&self, t: Transform) -> Piece {
        if t == Transform::IDENTITY {
            return self.clone();
        }
        let dims = t.apply_dims(self.dims);
        let mut cells = vec![Block::AIR; self.cells.len()];
        for (pos, block) in self.iter() {
            let [x, y, z] = t.apply_position(pos, self.dims);
            cells[x + y * dims[0] + z * dims[0] * dims[1]] = block;
        }
        Piece { dims, cells }
    }

    pub fn rotate_x(&self, angle: Angle) -> Piece {
        self.transformed(Transform::rotation(Axis::X, angle))
    }

    pub fn rotate_y(&self, angle: Angle) -> Piece {
        self.transformed(Transform::rotation(Axis::Y, angle))
    }

    pub fn rotate_z(&self, angle: Angle) -> Piece {
        self.transformed(Transform::rotation(Axis::Z, angle))
    }

    pub fn flip_x(&self) -> Piece {
        self.transformed(Transform::flip(Axis::X))
    }

    pub fn flip_y(&self) -> Piece {
        self.transformed(Transform::flip(Axis::Y))
    }

    pub fn flip_z(&self) -> Piece {
        self.transformed(Transform::flip(Axis::Z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STONE: Block = Block(1);
    const DIRT: Block = Block(3);

    fn marked_2x3x1() -> Piece {
        let mut piece = Piece::new(2, 3, 1).unwrap();
        piece.set(1, 2, 0, STONE).unwrap();
        piece.set(0, 0, 0, DIRT).unwrap();
        piece
    }

    #[test]
    fn test_new_rejects_zero_size() {
        assert_eq!(Piece::new(2, 0, 1), Err(PieceError::ZeroSize([2, 0, 1])));
    }

    #[test]
    fn test_get_set_bounds_checked() {
        let mut piece = Piece::new(2, 2, 2).unwrap();
        assert!(piece.set(1, 1, 1, STONE).is_ok());
        assert_eq!(piece.get(1, 1, 1), Ok(STONE));
        assert_eq!(piece.get(0, 0, 0), Ok(Block::AIR));
        assert!(matches!(
            piece.get(2, 0, 0),
            Err(PieceError::OutOfRange { .. })
        ));
        assert!(piece.set(0, 0, 5, STONE).is_err());
    }

    #[test]
    fn test_fill() {
        let mut piece = Piece::cube(3).unwrap();
        piece.fill(DIRT);
        assert_eq!(piece.count_solid(), 27);
        assert!(piece.cells().iter().all(|&b| b == DIRT));
    }

    #[test]
    fn test_from_cells_validates_length() {
        let err = Piece::from_cells([2, 2, 1], vec![STONE; 3]);
        assert_eq!(
            err,
            Err(PieceError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_rotate_z_270_remaps_cells() {
        let piece = marked_2x3x1();
        let rotated = piece.rotate_z(Angle::Deg270);
        assert_eq!(rotated.dims(), [3, 2, 1]);
        assert_eq!(rotated.get(2, 0, 0), Ok(STONE));
        // (0, 0) -> (y, sx - 1 - x) = (0, 1)
        assert_eq!(rotated.get(0, 1, 0), Ok(DIRT));
        assert_eq!(rotated.count_solid(), 2);
    }

    #[test]
    fn test_rotate_z_270_then_90_is_identity() {
        let piece = marked_2x3x1();
        let back = piece.rotate_z(Angle::Deg270).rotate_z(Angle::Deg90);
        assert_eq!(back, piece);
    }

    #[test]
    fn test_rotations_do_not_mutate_receiver() {
        let piece = marked_2x3x1();
        let before = piece.clone();
        let _ = piece.rotate_x(Angle::Deg90);
        let _ = piece.flip_y();
        assert_eq!(piece, before);
    }

    #[test]
    fn test_rotation_composition_identity() {
        let piece = Piece::from_fn([2, 3, 4], |x, y, z| Block((x + 2 * y + 7 * z) as u16)).unwrap();
        let round = piece
            .rotate_x(Angle::Deg270)
            .rotate_y(Angle::Deg90)
            .rotate_z(Angle::Deg180)
            .rotate_x(Angle::Deg90)
            .rotate_y(Angle::Deg180)
            .rotate_z(Angle::Deg90);
        assert_eq!(round, piece);
    }

    #[test]
    fn test_flip_sequence_identity() {
        let piece = marked_2x3x1();
        let round = piece
            .flip_x()
            .flip_y()
            .flip_z()
            .flip_x()
            .flip_y()
            .flip_z();
        assert_eq!(round, piece);
        assert_ne!(piece.flip_x(), piece);
    }

    #[test]
    fn test_iter_positions() {
        let piece = marked_2x3x1();
        let solid: Vec<_> = piece.iter().filter(|(_, b)| !b.is_air()).collect();
        assert_eq!(solid, vec![([0, 0, 0], DIRT), ([1, 2, 0], STONE)]);
    }
}
