//! Configuration for the routing search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Result};

/// How the visiting order is split into independently wired segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmentation {
    /// A single cable from the first tile to the last.
    Single,
    /// A fixed number of segments.
    Segments(usize),
    /// As many segments as needed so that none exceeds this many tiles.
    TilesPerSegment(usize),
}

impl Segmentation {
    /// Number of segments for a tiling of `tiles` tiles.
    pub fn segment_count(&self, tiles: usize) -> usize {
        match *self {
            Segmentation::Single => 1,
            Segmentation::Segments(n) => n,
            Segmentation::TilesPerSegment(per) => tiles.div_ceil(per.max(1)),
        }
    }

    /// Lengths of the contiguous runs of the visiting order.
    ///
    /// Runs differ in length by at most one; earlier runs take the extra
    /// tiles.
    pub fn segment_sizes(&self, tiles: usize) -> Vec<usize> {
        let count = self.segment_count(tiles).clamp(1, tiles.max(1));
        let base = tiles / count;
        let extra = tiles % count;
        (0..count)
            .map(|i| if i < extra { base + 1 } else { base })
            .collect()
    }
}

/// Parameters of the restart/hill-climb routing search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingConfig {
    /// Fixed number of segments (exclusive with `tiles_per_segment`).
    pub segments: Option<usize>,

    /// Maximum tiles per segment (exclusive with `segments`).
    pub tiles_per_segment: Option<usize>,

    /// Number of candidates built and improved.
    pub max_iterations: usize,

    /// Consecutive non-improving mutation steps before a candidate is
    /// abandoned.
    pub attempts_per_improvement: usize,

    /// Probability of starting a candidate from scratch instead of from the
    /// current best.
    pub random_start_probability: f64,

    /// Largest order distance between two swapped tiles.
    pub max_swap_distance: usize,

    /// Sampled swap+vertex combinations per mutation step.
    pub mixed_mutations: usize,

    /// Cost added for every pair of tiles sharing a junction point.
    pub conflict_penalty: f64,

    /// Random seed for reproducibility (None = random).
    pub seed: Option<u64>,

    /// Time limit in milliseconds (0 = no limit).
    pub time_limit_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            segments: None,
            tiles_per_segment: None,
            max_iterations: 100,
            attempts_per_improvement: 100,
            random_start_probability: 0.9,
            max_swap_distance: 10,
            mixed_mutations: 10,
            conflict_penalty: 100.0,
            seed: None,
            time_limit_ms: 0,
        }
    }
}

impl RoutingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits the route into a fixed number of segments.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Bounds the number of tiles per segment.
    pub fn with_tiles_per_segment(mut self, tiles: usize) -> Self {
        self.tiles_per_segment = Some(tiles);
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_attempts_per_improvement(mut self, attempts: usize) -> Self {
        self.attempts_per_improvement = attempts;
        self
    }

    /// Sets the random start probability. Range checking happens in
    /// [`RoutingConfig::validate`].
    pub fn with_random_start_probability(mut self, probability: f64) -> Self {
        self.random_start_probability = probability;
        self
    }

    pub fn with_max_swap_distance(mut self, distance: usize) -> Self {
        self.max_swap_distance = distance.max(1);
        self
    }

    pub fn with_mixed_mutations(mut self, mutations: usize) -> Self {
        self.mixed_mutations = mutations;
        self
    }

    pub fn with_conflict_penalty(mut self, penalty: f64) -> Self {
        self.conflict_penalty = penalty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Checks option ranges and mutual exclusions.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_some() && self.tiles_per_segment.is_some() {
            return Err(Error::Configuration(
                "'segments' and 'tiles_per_segment' are mutually exclusive".into(),
            ));
        }
        if self.segments == Some(0) {
            return Err(Error::Configuration("'segments' must be at least 1".into()));
        }
        if self.tiles_per_segment == Some(0) {
            return Err(Error::Configuration(
                "'tiles_per_segment' must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.random_start_probability) {
            return Err(Error::Configuration(format!(
                "'random_start_probability' must be within [0, 1], got {}",
                self.random_start_probability
            )));
        }
        if !(self.conflict_penalty.is_finite() && self.conflict_penalty > 0.0) {
            return Err(Error::Configuration(format!(
                "'conflict_penalty' must be positive, got {}",
                self.conflict_penalty
            )));
        }
        Ok(())
    }

    /// Segmentation policy. Call [`RoutingConfig::validate`] first.
    pub fn segmentation(&self) -> Segmentation {
        match (self.segments, self.tiles_per_segment) {
            (Some(n), _) if n > 1 => Segmentation::Segments(n),
            (_, Some(per)) => Segmentation::TilesPerSegment(per),
            _ => Segmentation::Single,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.attempts_per_improvement, 100);
        assert_eq!(config.max_swap_distance, 10);
        assert_eq!(config.mixed_mutations, 10);
        assert_eq!(config.segmentation(), Segmentation::Single);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mutually_exclusive_segmentation() {
        let config = RoutingConfig::new()
            .with_segments(2)
            .with_tiles_per_segment(5);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_probability_range() {
        let config = RoutingConfig::new().with_random_start_probability(1.5);
        assert!(config.validate().is_err());
        let config = RoutingConfig::new().with_random_start_probability(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_segment_sizes() {
        assert_eq!(Segmentation::Segments(3).segment_sizes(10), vec![4, 3, 3]);
        assert_eq!(
            Segmentation::TilesPerSegment(4).segment_sizes(10),
            vec![4, 3, 3]
        );
        assert_eq!(Segmentation::TilesPerSegment(5).segment_sizes(10), vec![5, 5]);
        assert_eq!(Segmentation::Single.segment_sizes(7), vec![7]);
    }
}
