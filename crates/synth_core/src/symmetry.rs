//! Symmetry groups and symmetry orbits of pieces.
//!
//! Two groups are used:
//! - `Horizontal`: rotations about the vertical Y axis plus X and Z mirrors.
//!   "Up" stays up, so terrain with a ground and a sky keeps its orientation.
//!   At most 8 elements.
//! - `Full`: additionally X/Z quarter rotations and the Y mirror, which close
//!   over the whole 48-element cube group (24 rotations + 24 rotoreflections).
//!
//! Groups are enumerated with a worklist and a seen-set over [`Transform`]s,
//! so the result does not depend on recursion depth or visiting order.
//! Orbits of a piece are deduplicated by content: a uniformly filled cube has
//! an orbit of one. Orbits of a neighbor observation transform the center,
//! the faces and the neighbor tiles together.

use crate::catalog::PieceNeighbors;
use crate::piece::Piece;
use crate::pool::{PieceId, PiecePool, UnknownPiece};
use crate::transform::{Angle, Axis, Transform};
use std::collections::{HashSet, VecDeque};

/// Predefined symmetry groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetryGroup {
    /// Identity only
    None,
    /// Y rotations with X/Z mirrors (8 elements)
    Horizontal,
    /// All 48 cube symmetries
    Full,
}

impl SymmetryGroup {
    /// Group matching the `allow_upside_down` training switch.
    pub fn for_upside_down(allow_upside_down: bool) -> Self {
        if allow_upside_down {
            SymmetryGroup::Full
        } else {
            SymmetryGroup::Horizontal
        }
    }

    /// Generators the group is closed over.
    pub fn generators(&self) -> Vec<Transform> {
        match self {
            SymmetryGroup::None => Vec::new(),
            SymmetryGroup::Horizontal => vec![
                Transform::rotation(Axis::Y, Angle::Deg90),
                Transform::flip(Axis::X),
                Transform::flip(Axis::Z),
            ],
            SymmetryGroup::Full => vec![
                Transform::rotation(Axis::Y, Angle::Deg90),
                Transform::flip(Axis::X),
                Transform::flip(Axis::Z),
                Transform::rotation(Axis::X, Angle::Deg90),
                Transform::rotation(Axis::X, Angle::Deg270),
                Transform::rotation(Axis::Z, Angle::Deg90),
                Transform::rotation(Axis::Z, Angle::Deg270),
                Transform::flip(Axis::Y),
            ],
        }
    }

    /// Every group element, identity first, in breadth-first discovery order.
    pub fn elements(&self) -> Vec<Transform> {
        let generators = self.generators();
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        seen.insert(Transform::IDENTITY);
        queue.push_back(Transform::IDENTITY);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &generator in &generators {
                let next = current.then(generator);
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }
}

/// Deduplicated symmetry orbit of `piece`.
///
/// With `allow_upside_down == false` only the horizontal group is used.
/// The first element is always `piece` itself.
pub fn generate_siblings(piece: &Piece, allow_upside_down: bool) -> Vec<Piece> {
    let group = SymmetryGroup::for_upside_down(allow_upside_down);
    let mut seen = HashSet::new();
    let mut siblings = Vec::new();
    for t in group.elements() {
        let image = piece.transformed(t);
        if seen.insert(image.clone()) {
            siblings.push(image);
        }
    }
    siblings
}

/// Interned symmetry orbit of an interned piece.
pub fn generate_sibling_ids(
    pool: &mut PiecePool,
    id: PieceId,
    allow_upside_down: bool,
) -> Result<Vec<PieceId>, UnknownPiece> {
    let group = SymmetryGroup::for_upside_down(allow_upside_down);
    let mut seen = HashSet::new();
    let mut siblings = Vec::new();
    for t in group.elements() {
        let image = pool.transformed(id, t)?;
        if seen.insert(image) {
            siblings.push(image);
        }
    }
    Ok(siblings)
}

/// Deduplicated orbit of a neighbor observation under `group`.
///
/// The observation itself comes first. Two images count as the same member
/// when center, faces and neighbor weights all match.
pub fn observation_orbit(
    observation: &PieceNeighbors,
    group: SymmetryGroup,
    pool: &mut PiecePool,
) -> Result<Vec<PieceNeighbors>, UnknownPiece> {
    let mut orbit: Vec<PieceNeighbors> = Vec::new();
    for t in group.elements() {
        let image = observation.transformed(t, pool)?;
        if !orbit.contains(&image) {
            orbit.push(image);
        }
    }
    Ok(orbit)
}
