//! Routing states and their costs.

use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Result};

/// A candidate cable route.
///
/// `order` lists tile indices in visiting order and `connectors[tile]` is the
/// corner of `tile` hosting the joint. `segments` holds the lengths of the
/// contiguous runs of `order` wired independently.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingState {
    pub order: Vec<usize>,
    pub connectors: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub segments: Vec<usize>,
}

impl RoutingState {
    /// Creates a state routed as a single segment.
    pub fn new(order: Vec<usize>, connectors: Vec<usize>) -> Self {
        let segments = vec![order.len()];
        Self {
            order,
            connectors,
            segments,
        }
    }

    /// Number of tiles in the route.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(tile, connector)` pairs in visiting order.
    pub fn steps(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.order.iter().map(move |&t| (t, self.connectors[t]))
    }

    /// Ranges of `order` covered by each segment.
    pub fn segment_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.segments
            .iter()
            .map(|&len| {
                let range = start..start + len;
                start += len;
                range
            })
            .collect()
    }

    /// Tiles of each segment, in visiting order.
    pub fn segment_tiles(&self) -> Vec<&[usize]> {
        self.segment_ranges()
            .into_iter()
            .map(|r| &self.order[r])
            .collect()
    }

    /// Checks that the state routes exactly `tiles` tiles with corners below
    /// `corners`, and that the segments partition the order.
    pub fn check(&self, tiles: usize, corners: usize) -> Result<()> {
        if self.order.len() != tiles || self.connectors.len() != tiles {
            return Err(Error::Configuration(format!(
                "routing covers {} tiles with {} connectors, expected {}",
                self.order.len(),
                self.connectors.len(),
                tiles
            )));
        }
        let mut seen = vec![false; tiles];
        for &t in &self.order {
            if t >= tiles || seen[t] {
                return Err(Error::Configuration(format!(
                    "routing order is not a permutation (tile {})",
                    t
                )));
            }
            seen[t] = true;
        }
        if let Some((tile, &c)) = self
            .connectors
            .iter()
            .enumerate()
            .find(|(_, &c)| c >= corners)
        {
            return Err(Error::Configuration(format!(
                "connector {} of tile {} is out of range (tiles have {} corners)",
                c, tile, corners
            )));
        }
        if self.segments.iter().sum::<usize>() != tiles || self.segments.contains(&0) {
            return Err(Error::Configuration(format!(
                "segments {:?} do not partition {} tiles",
                self.segments, tiles
            )));
        }
        Ok(())
    }
}

/// Cost of a routing state. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingCost {
    /// Cable length summed over segments.
    pub wire_length: f64,
    /// Pairs of tiles whose connectors share a junction point.
    pub conflicts: usize,
    /// `conflicts` times the configured penalty.
    pub penalty: f64,
    /// `wire_length + penalty`.
    pub total: f64,
}

impl RoutingCost {
    pub fn new(wire_length: f64, conflicts: usize, conflict_penalty: f64) -> Self {
        let penalty = conflicts as f64 * conflict_penalty;
        Self {
            wire_length,
            conflicts,
            penalty,
            total: wire_length + penalty,
        }
    }

    pub fn is_conflict_free(&self) -> bool {
        self.conflicts == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ranges() {
        let state = RoutingState {
            order: vec![3, 1, 0, 2, 4],
            connectors: vec![0; 5],
            segments: vec![3, 2],
        };
        assert_eq!(state.segment_ranges(), vec![0..3, 3..5]);
        assert_eq!(state.segment_tiles(), vec![&[3, 1, 0][..], &[2, 4][..]]);
        assert!(state.check(5, 4).is_ok());
    }

    #[test]
    fn test_check_rejects_invalid_states() {
        let duplicated = RoutingState::new(vec![0, 0, 1], vec![0, 0, 0]);
        assert!(duplicated.check(3, 4).is_err());
        let short = RoutingState::new(vec![0, 1], vec![0, 0]);
        assert!(short.check(3, 4).is_err());
        let bad_corner = RoutingState::new(vec![0, 1, 2], vec![0, 4, 0]);
        assert!(bad_corner.check(3, 4).is_err());
    }

    #[test]
    fn test_cost_total() {
        let cost = RoutingCost::new(1.5, 2, 100.0);
        assert_eq!(cost.total, 201.5);
        assert!(!cost.is_conflict_free());
    }
}
