//! Learned adjacency statistics.
//!
//! A [`PieceNeighbors`] records, for one center tile, which tiles were seen
//! next to it in each direction and how often. A [`Catalog`] keys those
//! records by center tile: adding a second record for a center that is
//! already present merges the per-face multisets instead of replacing them.
//!
//! The catalog owns the [`PiecePool`] its ids come from, so every `PieceId`
//! stored inside it resolves against that pool. All tiles in a catalog are
//! cubes of the same edge length.

use crate::face::Face;
use crate::multiset::WeightedMultiset;
use crate::piece::Piece;
use crate::pool::{PieceId, PiecePool, UnknownPiece};
use crate::rng::SynthRng;
use crate::transform::Transform;
use std::collections::BTreeMap;
use std::fmt;

/// Errors raised while building or querying a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog has no entries
    Empty,
    /// An id that does not belong to this catalog's pool
    UnknownPiece(PieceId),
    /// A piece that is not a cube of the catalog's tile size
    TileSizeMismatch { expected: usize, actual: [usize; 3] },
    /// Tile edge length of zero
    InvalidTileSize(u32),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "catalog is empty"),
            CatalogError::UnknownPiece(id) => write!(f, "piece {} is not in the catalog pool", id),
            CatalogError::TileSizeMismatch { expected, actual } => write!(
                f,
                "piece of size {}x{}x{} does not match tile size {}",
                actual[0], actual[1], actual[2], expected
            ),
            CatalogError::InvalidTileSize(size) => {
                write!(f, "tile size must be at least 1, got {}", size)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<UnknownPiece> for CatalogError {
    fn from(e: UnknownPiece) -> Self {
        CatalogError::UnknownPiece(e.0)
    }
}

/// Observed neighbor statistics for one center tile.
///
/// A face with no key has no recorded neighbor in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceNeighbors {
    center: PieceId,
    neighbors: BTreeMap<Face, WeightedMultiset<PieceId>>,
    /// How many times this center was observed
    occurrences: u64,
}

impl PieceNeighbors {
    /// A single observation of `center` with no neighbors yet.
    pub fn new(center: PieceId) -> Self {
        Self {
            center,
            neighbors: BTreeMap::new(),
            occurrences: 1,
        }
    }

    pub fn center(&self) -> PieceId {
        self.center
    }

    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    /// Record `neighbor` seen in direction `face` with the given weight.
    pub fn add_neighbor(&mut self, face: Face, neighbor: PieceId, weight: u64) {
        if weight == 0 {
            return;
        }
        self.neighbors.entry(face).or_default().add(neighbor, weight);
    }

    /// Neighbor options in direction `face`, if any were recorded.
    pub fn get(&self, face: Face) -> Option<&WeightedMultiset<PieceId>> {
        self.neighbors.get(&face)
    }

    /// Directions with recorded neighbors, in `Face` order.
    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        self.neighbors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, &WeightedMultiset<PieceId>)> + '_ {
        self.neighbors.iter().map(|(&f, m)| (f, m))
    }

    /// Whether `neighbor` was ever seen in direction `face`.
    pub fn admits(&self, face: Face, neighbor: PieceId) -> bool {
        self.neighbors
            .get(&face)
            .is_some_and(|options| options.contains(&neighbor))
    }

    /// Every piece id referenced, center first.
    pub fn pieces(&self) -> impl Iterator<Item = PieceId> + '_ {
        std::iter::once(self.center).chain(
            self.neighbors
                .values()
                .flat_map(|options| options.elements().copied()),
        )
    }

    /// Additively union `other`'s statistics into this record.
    ///
    /// The center of `other` is not checked; callers merge records for the
    /// same center.
    pub fn merge(&mut self, other: &PieceNeighbors) {
        for (&face, options) in &other.neighbors {
            self.neighbors.entry(face).or_default().merge(options, 1);
        }
        self.occurrences += other.occurrences;
    }

    /// Divide each face's weights by their GCD.
    pub fn simplify(&mut self) {
        for options in self.neighbors.values_mut() {
            options.simplify();
        }
    }

    /// The same observation seen through `t`: center, faces and neighbors
    /// all transformed together.
    pub fn transformed(
        &self,
        t: Transform,
        pool: &mut PiecePool,
    ) -> Result<PieceNeighbors, UnknownPiece> {
        let mut out = PieceNeighbors {
            center: pool.transformed(self.center, t)?,
            neighbors: BTreeMap::new(),
            occurrences: self.occurrences,
        };
        for (&face, options) in &self.neighbors {
            let slot = out.neighbors.entry(face.transformed(t)).or_default();
            for (&neighbor, weight) in options.iter() {
                slot.add(pool.transformed(neighbor, t)?, weight);
            }
        }
        Ok(out)
    }
}

/// Summary counts over a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    /// Distinct center tiles
    pub entries: usize,
    /// Distinct tiles in the pool
    pub distinct_pieces: usize,
    /// Sum of all neighbor weights over all entries and faces
    pub neighbor_weight: u64,
    /// Sum of entry occurrence counts
    pub occurrences: u64,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {} distinct pieces, {} neighbor observations, {} occurrences",
            self.entries, self.distinct_pieces, self.neighbor_weight, self.occurrences
        )
    }
}

/// Center tile -> neighbor statistics, plus the pool that owns the tiles.
#[derive(Debug, Clone)]
pub struct Catalog {
    tile_size: usize,
    pool: PiecePool,
    entries: BTreeMap<PieceId, PieceNeighbors>,
}

impl Catalog {
    /// Empty catalog for cubic tiles of edge `tile_size`.
    pub fn new(tile_size: u32) -> Result<Self, CatalogError> {
        if tile_size == 0 {
            return Err(CatalogError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            tile_size: tile_size as usize,
            pool: PiecePool::new(),
            entries: BTreeMap::new(),
        })
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn pool(&self) -> &PiecePool {
        &self.pool
    }

    /// Mutable access to the pool, for interning and transforming tiles.
    pub(crate) fn pool_mut(&mut self) -> &mut PiecePool {
        &mut self.pool
    }

    /// Intern a tile after checking it has the catalog's dimensions.
    pub fn intern(&mut self, piece: Piece) -> Result<PieceId, CatalogError> {
        let expected = [self.tile_size; 3];
        if piece.dims() != expected {
            return Err(CatalogError::TileSizeMismatch {
                expected: self.tile_size,
                actual: piece.dims(),
            });
        }
        Ok(self.pool.intern(piece))
    }

    /// Content of an interned tile.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pool.get(id)
    }

    /// Number of distinct center tiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, center: PieceId) -> Option<&PieceNeighbors> {
        self.entries.get(&center)
    }

    pub fn contains(&self, center: PieceId) -> bool {
        self.entries.contains_key(&center)
    }

    /// Entries in ascending center id order.
    pub fn iter(&self) -> impl Iterator<Item = &PieceNeighbors> + '_ {
        self.entries.values()
    }

    /// Add a record, merging with the existing one for the same center.
    ///
    /// Every id in the record must come from this catalog's pool and name a
    /// tile of the catalog's size.
    pub fn add(&mut self, neighbors: PieceNeighbors) -> Result<(), CatalogError> {
        for id in neighbors.pieces() {
            let piece = self.pool.get(id).ok_or(CatalogError::UnknownPiece(id))?;
            if piece.dims() != [self.tile_size; 3] {
                return Err(CatalogError::TileSizeMismatch {
                    expected: self.tile_size,
                    actual: piece.dims(),
                });
            }
        }
        match self.entries.get_mut(&neighbors.center) {
            Some(existing) => existing.merge(&neighbors),
            None => {
                self.entries.insert(neighbors.center, neighbors);
            }
        }
        Ok(())
    }

    /// An arbitrary entry (the lowest center id).
    pub fn get_any(&self) -> Option<&PieceNeighbors> {
        self.entries.values().next()
    }

    /// Entry drawn with probability proportional to its occurrence count.
    pub fn choose_random(&self, rng: &mut dyn SynthRng) -> Result<&PieceNeighbors, CatalogError> {
        let weights: WeightedMultiset<PieceId> = self
            .entries
            .values()
            .map(|entry| (entry.center, entry.occurrences))
            .collect();
        let center = weights
            .weighted_choose(rng)
            .map_err(|_| CatalogError::Empty)?;
        self.entries.get(center).ok_or(CatalogError::Empty)
    }

    /// Reduce the weights of every face of every entry by their GCD.
    pub fn simplify(&mut self) {
        for entry in self.entries.values_mut() {
            entry.simplify();
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            entries: self.entries.len(),
            distinct_pieces: self.pool.len(),
            ..Default::default()
        };
        for entry in self.entries.values() {
            stats.occurrences += entry.occurrences;
            stats.neighbor_weight += entry
                .neighbors
                .values()
                .map(|options| options.total_weight())
                .sum::<u64>();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Block;
    use crate::rng::StdRandom;
    use crate::transform::{Angle, Axis};

    fn tile(block: u16) -> Piece {
        Piece::filled([2, 2, 2], Block(block)).unwrap()
    }

    fn marked_tile() -> Piece {
        let mut piece = Piece::cube(2).unwrap();
        piece.set(1, 0, 0, Block(3)).unwrap();
        piece
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        assert_eq!(Catalog::new(0).err(), Some(CatalogError::InvalidTileSize(0)));
    }

    #[test]
    fn test_intern_checks_dimensions() {
        let mut catalog = Catalog::new(2).unwrap();
        assert!(catalog.intern(tile(1)).is_ok());
        let wrong = Piece::cube(3).unwrap();
        assert_eq!(
            catalog.intern(wrong),
            Err(CatalogError::TileSizeMismatch {
                expected: 2,
                actual: [3, 3, 3]
            })
        );
    }

    #[test]
    fn test_add_merges_same_center() {
        let mut catalog = Catalog::new(2).unwrap();
        let stone = catalog.intern(tile(1)).unwrap();
        let dirt = catalog.intern(tile(2)).unwrap();

        let mut first = PieceNeighbors::new(stone);
        first.add_neighbor(Face::TOP, dirt, 2);
        let mut second = PieceNeighbors::new(stone);
        second.add_neighbor(Face::TOP, dirt, 3);
        second.add_neighbor(Face::TOP, stone, 1);
        second.add_neighbor(Face::EAST, stone, 1);

        catalog.add(first).unwrap();
        catalog.add(second).unwrap();

        assert_eq!(catalog.len(), 1);
        let entry = catalog.get(stone).unwrap();
        assert_eq!(entry.occurrences(), 2);
        assert_eq!(entry.get(Face::TOP).unwrap().weight(&dirt), 5);
        assert_eq!(entry.get(Face::TOP).unwrap().weight(&stone), 1);
        assert!(entry.admits(Face::EAST, stone));
        assert!(entry.get(Face::WEST).is_none());
    }

    #[test]
    fn test_add_rejects_foreign_ids() {
        let mut other = PiecePool::new();
        other.intern(tile(1));
        let foreign = other.intern(tile(2));

        let mut catalog = Catalog::new(2).unwrap();
        let own = catalog.intern(tile(1)).unwrap();
        let mut record = PieceNeighbors::new(own);
        record.add_neighbor(Face::NORTH, foreign, 1);
        assert_eq!(catalog.add(record), Err(CatalogError::UnknownPiece(foreign)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_add_rejects_wrong_sized_tiles() {
        let mut catalog = Catalog::new(2).unwrap();
        let own = catalog.intern(tile(1)).unwrap();
        let flat = catalog
            .pool_mut()
            .intern(Piece::filled([2, 1, 2], Block(7)).unwrap());
        let mut record = PieceNeighbors::new(own);
        record.add_neighbor(Face::TOP, flat, 1);
        assert_eq!(
            catalog.add(record),
            Err(CatalogError::TileSizeMismatch {
                expected: 2,
                actual: [2, 1, 2]
            })
        );
        assert!(catalog.add(PieceNeighbors::new(flat)).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_choose_random_weighted_by_occurrences() {
        let mut catalog = Catalog::new(2).unwrap();
        let common = catalog.intern(tile(1)).unwrap();
        let rare = catalog.intern(tile(2)).unwrap();
        for _ in 0..3 {
            catalog.add(PieceNeighbors::new(common)).unwrap();
        }
        catalog.add(PieceNeighbors::new(rare)).unwrap();

        let mut rng = StdRandom::from_u64_seed(11);
        let trials = 10_000;
        let hits = (0..trials)
            .filter(|_| catalog.choose_random(&mut rng).unwrap().center() == common)
            .count();
        let ratio = hits as f64 / trials as f64;
        assert!((ratio - 0.75).abs() < 0.03, "ratio {}", ratio);
        assert_eq!(catalog.get_any().map(|e| e.center()), Some(common));
    }

    #[test]
    fn test_empty_catalog_choice_fails() {
        let catalog = Catalog::new(1).unwrap();
        let mut rng = StdRandom::from_u64_seed(0);
        assert_eq!(catalog.choose_random(&mut rng).err(), Some(CatalogError::Empty));
        assert!(catalog.get_any().is_none());
    }

    #[test]
    fn test_simplify_keeps_proportions() {
        let mut catalog = Catalog::new(2).unwrap();
        let a = catalog.intern(tile(1)).unwrap();
        let b = catalog.intern(tile(2)).unwrap();
        let mut record = PieceNeighbors::new(a);
        record.add_neighbor(Face::SOUTH, a, 4);
        record.add_neighbor(Face::SOUTH, b, 6);
        record.add_neighbor(Face::TOP, b, 7);
        catalog.add(record).unwrap();

        catalog.simplify();
        let entry = catalog.get(a).unwrap();
        assert_eq!(entry.get(Face::SOUTH).unwrap().weight(&a), 2);
        assert_eq!(entry.get(Face::SOUTH).unwrap().weight(&b), 3);
        assert_eq!(entry.get(Face::TOP).unwrap().weight(&b), 1);
    }

    #[test]
    fn test_transformed_record_moves_faces_and_tiles() {
        let mut catalog = Catalog::new(2).unwrap();
        let center = catalog.intern(marked_tile()).unwrap();
        let above = catalog.intern(tile(4)).unwrap();
        let mut record = PieceNeighbors::new(center);
        record.add_neighbor(Face::EAST, center, 1);
        record.add_neighbor(Face::TOP, above, 2);

        let t = Transform::rotation(Axis::Y, Angle::Deg90);
        let turned = record.transformed(t, catalog.pool_mut()).unwrap();
        let turned_center = catalog.pool_mut().rotate_y(center, Angle::Deg90).unwrap();

        assert_eq!(turned.center(), turned_center);
        // EAST turns to SOUTH; the uniform tile above is its own image.
        assert!(turned.admits(Face::SOUTH, turned_center));
        assert_eq!(turned.get(Face::TOP).unwrap().weight(&above), 2);
        assert!(turned.get(Face::EAST).is_none());
    }

    #[test]
    fn test_stats() {
        let mut catalog = Catalog::new(2).unwrap();
        let a = catalog.intern(tile(1)).unwrap();
        let b = catalog.intern(tile(2)).unwrap();
        let mut record = PieceNeighbors::new(a);
        record.add_neighbor(Face::TOP, b, 2);
        record.add_neighbor(Face::BOTTOM, a, 1);
        catalog.add(record).unwrap();
        catalog.add(PieceNeighbors::new(b)).unwrap();

        let stats = catalog.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.distinct_pieces, 2);
        assert_eq!(stats.neighbor_weight, 3);
        assert_eq!(stats.occurrences, 2);
    }
}
