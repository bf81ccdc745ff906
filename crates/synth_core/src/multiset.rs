//! Weighted multiset used to record and sample adjacency statistics.
//!
//! Each element carries a positive integer weight (its occurrence count).
//! Entries are kept in a `BTreeMap`, so iteration and therefore every
//! weighted draw depend only on the contents and the random stream, never on
//! insertion history.
//!
//! Invariant: a stored weight is never zero. Decrementing an entry to zero
//! removes it.

use crate::rng::SynthRng;
use std::collections::BTreeMap;
use std::fmt;

/// Error type for multiset sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultisetError {
    /// Draw requested from a multiset with no entries
    Empty,
}

impl fmt::Display for MultisetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultisetError::Empty => write!(f, "cannot choose from an empty multiset"),
        }
    }
}

impl std::error::Error for MultisetError {}

/// Mapping from element to positive weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedMultiset<E: Ord> {
    entries: BTreeMap<E, u64>,
    total: u64,
}

impl<E: Ord> Default for WeightedMultiset<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<E: Ord + Clone> WeightedMultiset<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiset holding a single element.
    pub fn singleton(element: E, weight: u64) -> Self {
        let mut set = Self::new();
        set.add(element, weight);
        set
    }

    /// Add `weight` to `element`, inserting it if absent.
    ///
    /// A weight of zero is ignored, so no zero entry is ever stored. Weights
    /// saturate: the total never exceeds `u64::MAX`, and whatever would push it
    /// past that is dropped.
    pub fn add(&mut self, element: E, weight: u64) {
        let weight = weight.min(u64::MAX - self.total);
        if weight == 0 {
            return;
        }
        *self.entries.entry(element).or_insert(0) += weight;
        self.total += weight;
    }

    /// Lower `element`'s weight by `by`, removing it when it reaches zero.
    ///
    /// Returns the remaining weight (0 if the entry is gone or was absent).
    pub fn decrement(&mut self, element: &E, by: u64) -> u64 {
        let Some(weight) = self.entries.get_mut(element) else {
            return 0;
        };
        let taken = by.min(*weight);
        *weight -= taken;
        self.total -= taken;
        let remaining = *weight;
        if remaining == 0 {
            self.entries.remove(element);
        }
        remaining
    }

    /// Delete the entry entirely, returning its weight.
    pub fn remove(&mut self, element: &E) -> Option<u64> {
        let weight = self.entries.remove(element)?;
        self.total -= weight;
        Some(weight)
    }

    /// Weight of `element`, 0 when absent.
    pub fn weight(&self, element: &E) -> u64 {
        self.entries.get(element).copied().unwrap_or(0)
    }

    pub fn contains(&self, element: &E) -> bool {
        self.entries.contains_key(element)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u64 {
        self.total
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Elements and weights in ascending element order.
    pub fn iter(&self) -> impl Iterator<Item = (&E, u64)> + '_ {
        self.entries.iter().map(|(e, &w)| (e, w))
    }

    pub fn elements(&self) -> impl Iterator<Item = &E> + '_ {
        self.entries.keys()
    }

    /// Draw an element with probability `weight / total_weight`.
    ///
    /// Single pass over the entries; nothing proportional to the total
    /// weight is allocated.
    pub fn weighted_choose(&self, rng: &mut dyn SynthRng) -> Result<&E, MultisetError> {
        if self.total == 0 {
            return Err(MultisetError::Empty);
        }
        let mut ticket = rng.next_u64_below(self.total);
        for (element, &weight) in &self.entries {
            if ticket < weight {
                return Ok(element);
            }
            ticket -= weight;
        }
        // Unreachable while `total` matches the entries.
        self.entries.keys().next_back().ok_or(MultisetError::Empty)
    }

    /// Prefix-sum sampler for repeated O(log n) draws.
    pub fn sampler(&self) -> WeightedSampler<E> {
        let mut elements = Vec::with_capacity(self.entries.len());
        let mut cumulative = Vec::with_capacity(self.entries.len());
        let mut running = 0u64;
        for (element, &weight) in &self.entries {
            running += weight;
            elements.push(element.clone());
            cumulative.push(running);
        }
        WeightedSampler {
            elements,
            cumulative,
        }
    }

    /// Add every entry of `other`, scaling its weights by `multiplier`.
    pub fn merge(&mut self, other: &WeightedMultiset<E>, multiplier: u64) {
        for (element, &weight) in &other.entries {
            self.add(element.clone(), weight.saturating_mul(multiplier));
        }
    }

    /// Map every element through `f`, keeping weights.
    ///
    /// Elements that map to the same value have their weights summed.
    pub fn remap<F, T>(&self, mut f: F) -> WeightedMultiset<T>
    where
        F: FnMut(&E) -> T,
        T: Ord + Clone,
    {
        let mut out = WeightedMultiset::new();
        for (element, &weight) in &self.entries {
            out.add(f(element), weight);
        }
        out
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&E, u64) -> bool,
    {
        let mut removed = 0u64;
        self.entries.retain(|e, w| {
            let keep_it = keep(e, *w);
            if !keep_it {
                removed += *w;
            }
            keep_it
        });
        self.total -= removed;
    }

    /// Divide every weight by their greatest common divisor.
    ///
    /// Proportions are unchanged. Returns the divisor (1 when nothing changed,
    /// 0 for an empty multiset).
    pub fn simplify(&mut self) -> u64 {
        let divisor = self.entries.values().fold(0u64, |acc, &w| gcd(acc, w));
        if divisor > 1 {
            for weight in self.entries.values_mut() {
                *weight /= divisor;
            }
            self.total /= divisor;
        }
        divisor
    }
}

impl<E: Ord + Clone> FromIterator<(E, u64)> for WeightedMultiset<E> {
    fn from_iter<I: IntoIterator<Item = (E, u64)>>(iter: I) -> Self {
        let mut set = WeightedMultiset::new();
        set.extend(iter);
        set
    }
}

impl<E: Ord + Clone> Extend<(E, u64)> for WeightedMultiset<E> {
    fn extend<I: IntoIterator<Item = (E, u64)>>(&mut self, iter: I) {
        for (element, weight) in iter {
            self.add(element, weight);
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Frozen cumulative-weight table built by [`WeightedMultiset::sampler`].
#[derive(Debug, Clone)]
pub struct WeightedSampler<E> {
    elements: Vec<E>,
    cumulative: Vec<u64>,
}

impl<E> WeightedSampler<E> {
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Binary-search draw, same distribution as `weighted_choose`.
    pub fn choose(&self, rng: &mut dyn SynthRng) -> Result<&E, MultisetError> {
        let total = self.total_weight();
        if total == 0 {
            return Err(MultisetError::Empty);
        }
        let ticket = rng.next_u64_below(total);
        let index = self.cumulative.partition_point(|&upper| upper <= ticket);
        self.elements.get(index).ok_or(MultisetError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdRandom;

    #[test]
    fn test_add_merges_weights() {
        let mut set = WeightedMultiset::new();
        set.add('a', 2);
        set.add('a', 3);
        set.add('b', 1);
        assert_eq!(set.weight(&'a'), 5);
        assert_eq!(set.total_weight(), 6);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_zero_weight_never_stored() {
        let mut set = WeightedMultiset::new();
        set.add('a', 0);
        assert!(set.is_empty());

        set.add('b', 3);
        assert_eq!(set.decrement(&'b', 1), 2);
        assert_eq!(set.decrement(&'b', 5), 0);
        assert!(!set.contains(&'b'));
        assert_eq!(set.total_weight(), 0);
    }

    #[test]
    fn test_remove_deletes_entry() {
        let mut set: WeightedMultiset<char> = [('a', 4), ('b', 1)].into_iter().collect();
        assert_eq!(set.remove(&'a'), Some(4));
        assert_eq!(set.remove(&'a'), None);
        assert_eq!(set.total_weight(), 1);
    }

    #[test]
    fn test_choose_empty_fails() {
        let set: WeightedMultiset<u32> = WeightedMultiset::new();
        let mut rng = StdRandom::from_u64_seed(1);
        assert_eq!(set.weighted_choose(&mut rng), Err(MultisetError::Empty));
        assert_eq!(set.sampler().choose(&mut rng).err(), Some(MultisetError::Empty));
    }

    #[test]
    fn test_weighted_choose_proportions() {
        let mut set = WeightedMultiset::new();
        set.add("stone", 2);
        set.add("stone", 3);
        set.add("dirt", 5);
        let mut rng = StdRandom::from_u64_seed(42);

        let trials = 20_000;
        let stone = (0..trials)
            .filter(|_| *set.weighted_choose(&mut rng).unwrap() == "stone")
            .count();
        let ratio = stone as f64 / trials as f64;
        assert!((ratio - 0.5).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_sampler_matches_distribution() {
        let set: WeightedMultiset<u8> = [(1, 1), (2, 3)].into_iter().collect();
        let sampler = set.sampler();
        assert_eq!(sampler.total_weight(), 4);
        let mut rng = StdRandom::from_u64_seed(7);
        let trials = 20_000;
        let twos = (0..trials)
            .filter(|_| *sampler.choose(&mut rng).unwrap() == 2)
            .count();
        let ratio = twos as f64 / trials as f64;
        assert!((ratio - 0.75).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_merge_with_multiplier() {
        let mut a: WeightedMultiset<char> = [('x', 1)].into_iter().collect();
        let b: WeightedMultiset<char> = [('x', 2), ('y', 1)].into_iter().collect();
        a.merge(&b, 3);
        assert_eq!(a.weight(&'x'), 7);
        assert_eq!(a.weight(&'y'), 3);
        assert_eq!(a.total_weight(), 10);
    }

    #[test]
    fn test_weights_saturate_at_total_limit() {
        let mut set = WeightedMultiset::new();
        set.add('x', u64::MAX - 5);
        set.add('x', 3);
        set.add('y', 10);
        set.add('z', 1);
        assert_eq!(set.total_weight(), u64::MAX);
        assert_eq!(set.weight(&'x'), u64::MAX - 2);
        assert_eq!(set.weight(&'y'), 2);
        assert_eq!(set.weight(&'z'), 0);
        assert_eq!(set.len(), 2);

        let mut merged: WeightedMultiset<char> = [('a', 1)].into_iter().collect();
        merged.merge(&set, u64::MAX);
        assert_eq!(merged.total_weight(), u64::MAX);
        assert_eq!(merged.weight(&'a'), 1);
    }

    #[test]
    fn test_remap_sums_collisions() {
        let set: WeightedMultiset<i32> = [(1, 2), (-1, 3), (4, 1)].into_iter().collect();
        let abs = set.remap(|v| v.abs());
        assert_eq!(abs.weight(&1), 5);
        assert_eq!(abs.weight(&4), 1);
        assert_eq!(abs.total_weight(), set.total_weight());
    }

    #[test]
    fn test_simplify_by_gcd() {
        let mut set: WeightedMultiset<char> = [('a', 4), ('b', 6), ('c', 10)].into_iter().collect();
        assert_eq!(set.simplify(), 2);
        assert_eq!(set.weight(&'a'), 2);
        assert_eq!(set.weight(&'b'), 3);
        assert_eq!(set.weight(&'c'), 5);
        assert_eq!(set.total_weight(), 10);
    }

    #[test]
    fn test_retain_updates_total() {
        let mut set: WeightedMultiset<u8> = [(1, 2), (2, 3), (3, 4)].into_iter().collect();
        set.retain(|&e, _| e != 2);
        assert_eq!(set.total_weight(), 6);
        assert!(!set.contains(&2));
    }

    #[test]
    fn test_draws_are_reproducible() {
        let set: WeightedMultiset<u8> = (0..10).map(|i| (i, i as u64 + 1)).collect();
        let draw = |seed| {
            let mut rng = StdRandom::from_u64_seed(seed);
            (0..32)
                .map(|_| *set.weighted_choose(&mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(9), draw(9));
    }
}
