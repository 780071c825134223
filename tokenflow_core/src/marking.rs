//! Markings: token counts per place, with the covering partial order.

use crate::net::PlaceId;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The token-count state of a net at one point in time.
///
/// Places absent from the map hold 0 tokens. Zero counts are never stored,
/// so derived equality is count equality over the union of places.
///
/// Markings are values: every firing produces a fresh copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Marking {
    counts: BTreeMap<PlaceId, u32>,
}

impl Marking {
    /// Creates an empty marking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, place: PlaceId, count: u32) -> Self {
        self.set(place, count);
        self
    }

    /// Returns the token count of `place` (0 if absent).
    pub fn get(&self, place: PlaceId) -> u32 {
        self.counts.get(&place).copied().unwrap_or(0)
    }

    /// Sets the token count of `place`; 0 removes the place.
    pub fn set(&mut self, place: PlaceId, count: u32) {
        if count == 0 {
            self.counts.remove(&place);
        } else {
            self.counts.insert(place, count);
        }
    }

    /// Adds `tokens` to `place`.
    pub fn add(&mut self, place: PlaceId, tokens: u32) {
        if tokens == 0 {
            return;
        }
        *self.counts.entry(place).or_insert(0) += tokens;
    }

    /// Removes up to `tokens` from `place`; the place disappears once it
    /// holds nothing.
    pub fn consume(&mut self, place: PlaceId, tokens: u32) {
        let remaining = self.get(place).saturating_sub(tokens);
        self.set(place, remaining);
    }

    /// Iterates over marked places in place order.
    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, u32)> + '_ {
        self.counts.iter().map(|(p, c)| (*p, *c))
    }

    /// Number of places holding at least one token.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if no place holds a token.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all tokens.
    pub fn total_tokens(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    /// `self <= other`: every place of `self` holds at most as many tokens
    /// in `other`.
    pub fn is_covered_by(&self, other: &Marking) -> bool {
        self.counts.iter().all(|(p, &c)| c <= other.get(*p))
    }
}

impl PartialOrd for Marking {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_covered_by(other), other.is_covered_by(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl FromIterator<(PlaceId, u32)> for Marking {
    fn from_iter<I: IntoIterator<Item = (PlaceId, u32)>>(iter: I) -> Self {
        let mut marking = Marking::new();
        for (place, count) in iter {
            marking.add(place, count);
        }
        marking
    }
}
