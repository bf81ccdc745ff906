//! Content-addressed interning of pieces.
//!
//! A `PiecePool` hands out one [`PieceId`] per distinct piece content. Two
//! pieces that compare equal, however they were built, intern to the same id,
//! so ids can be compared, hashed and stored in catalogs in place of whole
//! pieces. An interned piece is frozen: the pool only gives out shared
//! references to it.
//!
//! The pool is owned by whoever builds a catalog; it is not process-global.
//! Insertion needs `&mut self`, so a single canonical id per content holds by
//! construction.

use crate::piece::Piece;
use crate::transform::{Angle, Axis, Transform};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical identity of an interned ("locked") piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(u32);

impl PieceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An id that was not issued by this pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownPiece(pub PieceId);

impl fmt::Display for UnknownPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece {} is not in this pool", self.0)
    }
}

impl std::error::Error for UnknownPiece {}

/// Append-only interning pool keyed by content hash.
#[derive(Debug, Default, Clone)]
pub struct PiecePool {
    pieces: Vec<Piece>,
    /// content hash -> ids with that hash (collisions resolved by equality)
    by_hash: HashMap<u64, Vec<PieceId>>,
    /// memoized transforms of interned pieces
    transformed: HashMap<(PieceId, Transform), PieceId>,
}

fn content_hash(piece: &Piece) -> u64 {
    let mut hasher = DefaultHasher::new();
    piece.hash(&mut hasher);
    hasher.finish()
}

impl PiecePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Id of an already interned piece with this content, if any.
    pub fn lookup(&self, piece: &Piece) -> Option<PieceId> {
        self.lookup_hashed(piece, content_hash(piece))
    }

    fn lookup_hashed(&self, piece: &Piece, hash: u64) -> Option<PieceId> {
        self.by_hash
            .get(&hash)?
            .iter()
            .copied()
            .find(|id| &self.pieces[id.index()] == piece)
    }

    /// Canonicalize `piece`, taking ownership.
    pub fn intern(&mut self, piece: Piece) -> PieceId {
        let hash = content_hash(&piece);
        if let Some(id) = self.lookup_hashed(&piece, hash) {
            return id;
        }
        let id = PieceId(self.pieces.len() as u32);
        self.pieces.push(piece);
        self.by_hash.entry(hash).or_default().push(id);
        id
    }

    /// Canonicalize a borrowed piece, cloning it only when it is new.
    pub fn intern_ref(&mut self, piece: &Piece) -> PieceId {
        match self.lookup(piece) {
            Some(id) => id,
            None => self.intern(piece.clone()),
        }
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.index())
    }

    pub fn resolve(&self, id: PieceId) -> Result<&Piece, UnknownPiece> {
        self.get(id).ok_or(UnknownPiece(id))
    }

    /// Every interned piece with its id, in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (PieceId, &Piece)> + '_ {
        self.pieces
            .iter()
            .enumerate()
            .map(|(i, p)| (PieceId(i as u32), p))
    }

    /// Interned image of `id` under `t`.
    pub fn transformed(&mut self, id: PieceId, t: Transform) -> Result<PieceId, UnknownPiece> {
        if t == Transform::IDENTITY {
            self.resolve(id)?;
            return Ok(id);
        }
        if let Some(&cached) = self.transformed.get(&(id, t)) {
            return Ok(cached);
        }
        let image = self.resolve(id)?.transformed(t);
        let image_id = self.intern(image);
        self.transformed.insert((id, t), image_id);
        self.transformed.insert((image_id, t.inverse()), id);
        Ok(image_id)
    }

    pub fn rotate_x(&mut self, id: PieceId, angle: Angle) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::rotation(Axis::X, angle))
    }

    pub fn rotate_y(&mut self, id: PieceId, angle: Angle) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::rotation(Axis::Y, angle))
    }

    pub fn rotate_z(&mut self, id: PieceId, angle: Angle) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::rotation(Axis::Z, angle))
    }

    pub fn flip_x(&mut self, id: PieceId) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::flip(Axis::X))
    }

    pub fn flip_y(&mut self, id: PieceId) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::flip(Axis::Y))
    }

    pub fn flip_z(&mut self, id: PieceId) -> Result<PieceId, UnknownPiece> {
        self.transformed(id, Transform::flip(Axis::Z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Block;

    fn sample_piece() -> Piece {
        let mut piece = Piece::new(2, 3, 1).unwrap();
        piece.set(1, 2, 0, Block(1)).unwrap();
        piece
    }

    #[test]
    fn test_equal_content_interns_to_same_id() {
        let mut pool = PiecePool::new();
        let a = pool.intern(sample_piece());
        let b = pool.intern(sample_piece());
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);

        let other = pool.intern(Piece::new(2, 3, 1).unwrap());
        assert_ne!(a, other);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_lookup_without_inserting() {
        let mut pool = PiecePool::new();
        assert_eq!(pool.lookup(&sample_piece()), None);
        let id = pool.intern_ref(&sample_piece());
        assert_eq!(pool.lookup(&sample_piece()), Some(id));
        assert_eq!(pool.get(id), Some(&sample_piece()));
    }

    #[test]
    fn test_transforms_return_interned_results() {
        let mut pool = PiecePool::new();
        let id = pool.intern(sample_piece());
        let rotated = pool.rotate_z(id, Angle::Deg270).unwrap();
        assert_eq!(
            pool.get(rotated),
            Some(&sample_piece().rotate_z(Angle::Deg270))
        );

        // Building the rotated content independently lands on the same id.
        let independent = pool.intern(sample_piece().rotate_z(Angle::Deg270));
        assert_eq!(independent, rotated);

        let back = pool.rotate_z(rotated, Angle::Deg90).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut small = PiecePool::new();
        let mut big = PiecePool::new();
        big.intern(Piece::cube(1).unwrap());
        let foreign = big.intern(sample_piece());
        assert_eq!(small.resolve(foreign), Err(UnknownPiece(foreign)));
        assert!(small.flip_x(foreign).is_err());
    }
}
