//! Routing problem: junction points, segmentation and cost evaluation.
//!
//! Each tile corner is resolved to a junction point shared by every tile
//! meeting at that corner. The cable visits one junction per tile; two tiles
//! using the same junction would need two joints in the same spot, which is
//! counted as a conflict.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use lumatile_core::geometry::point_distance;
use lumatile_core::{Error, Point2, Result, Tiling};

use crate::config::RoutingConfig;
use crate::state::{RoutingCost, RoutingState};

/// Immutable data needed to evaluate routes over one tiling.
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    points: Vec<Point2>,
    corners: Vec<Vec<usize>>,
    vertices_per_tile: usize,
    segment_sizes: Vec<usize>,
    /// `breaks[i]` is true when order position `i` ends a segment.
    breaks: Vec<bool>,
    conflict_penalty: f64,
}

impl RoutingProblem {
    /// Builds the problem for `tiling` under `config`.
    pub fn new(tiling: &Tiling, config: &RoutingConfig) -> Result<Self> {
        config.validate()?;

        let tiles = tiling.len();
        if let Some(segments) = config.segments {
            if segments > tiles {
                return Err(Error::Configuration(format!(
                    "'segments' must be between 1 and {} (number of tiles), got {}",
                    tiles, segments
                )));
            }
        }

        let junctions = tiling.junctions();
        let corners = (0..tiles)
            .map(|t| junctions.tile_corners(t).to_vec())
            .collect();
        let segment_sizes = config.segmentation().segment_sizes(tiles);

        let mut breaks = vec![false; tiles];
        let mut end = 0;
        for &len in &segment_sizes {
            end += len;
            breaks[end - 1] = true;
        }

        debug!(
            "Routing problem: {} tiles, {} junction points, segments {:?}",
            tiles,
            junctions.len(),
            segment_sizes
        );

        Ok(Self {
            points: junctions.points().to_vec(),
            corners,
            vertices_per_tile: tiling.vertices_per_tile(),
            segment_sizes,
            breaks,
            conflict_penalty: config.conflict_penalty,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.corners.len()
    }

    pub fn vertices_per_tile(&self) -> usize {
        self.vertices_per_tile
    }

    pub fn segment_sizes(&self) -> &[usize] {
        &self.segment_sizes
    }

    /// Number of distinct junction points.
    pub fn junction_count(&self) -> usize {
        self.points.len()
    }

    /// Junction point hosting corner `corner` of `tile`.
    pub fn connector_point(&self, tile: usize, corner: usize) -> Point2 {
        self.points[self.corners[tile][corner]]
    }

    /// Evaluates wire length and conflicts of a state.
    pub fn evaluate(&self, state: &RoutingState) -> RoutingCost {
        let mut wire_length = 0.0;
        for i in 0..state.order.len().saturating_sub(1) {
            if self.breaks[i] {
                continue;
            }
            let (a, b) = (state.order[i], state.order[i + 1]);
            wire_length += point_distance(
                self.connector_point(a, state.connectors[a]),
                self.connector_point(b, state.connectors[b]),
            );
        }

        let mut uses = vec![0usize; self.points.len()];
        for (tile, &corner) in state.connectors.iter().enumerate() {
            uses[self.corners[tile][corner]] += 1;
        }
        let conflicts = uses.iter().map(|&c| c * c.saturating_sub(1) / 2).sum();

        RoutingCost::new(wire_length, conflicts, self.conflict_penalty)
    }

    /// A uniformly random permutation with random connectors.
    pub fn random_state<R: Rng>(&self, rng: &mut R) -> RoutingState {
        let n = self.tile_count();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let connectors = (0..n)
            .map(|_| rng.gen_range(0..self.vertices_per_tile))
            .collect();
        RoutingState {
            order,
            connectors,
            segments: self.segment_sizes.clone(),
        }
    }

    /// Adopts a previously found state, re-segmented for this problem.
    ///
    /// Fails if the state does not route exactly these tiles.
    pub fn adopt(&self, state: &RoutingState) -> Result<RoutingState> {
        let adopted = RoutingState {
            order: state.order.clone(),
            connectors: state.connectors.clone(),
            segments: self.segment_sizes.clone(),
        };
        adopted.check(self.tile_count(), self.vertices_per_tile)?;
        Ok(adopted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumatile_core::{TileShape, TileSpec};

    fn row_of_squares(n: usize) -> Tiling {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 1.0, 0.0).unwrap();
        Tiling::full(spec, 1, n).unwrap()
    }

    #[test]
    fn test_wire_length_and_conflicts() {
        let tiling = row_of_squares(3);
        let problem = RoutingProblem::new(&tiling, &RoutingConfig::default()).unwrap();
        assert_eq!(problem.junction_count(), 8);

        // Bottom-left corners of each square: no shared junction, unit steps.
        let state = RoutingState::new(vec![0, 1, 2], vec![2, 2, 2]);
        let cost = problem.evaluate(&state);
        assert_relative_eq!(cost.wire_length, 2.0, epsilon = 1e-9);
        assert_eq!(cost.conflicts, 0);

        // Top-right of tile 0 coincides with top-left of tile 1.
        let state = RoutingState::new(vec![0, 1, 2], vec![0, 1, 2]);
        let cost = problem.evaluate(&state);
        assert_eq!(cost.conflicts, 1);
        assert_relative_eq!(cost.total, cost.wire_length + 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_segment_boundary_adds_no_wire() {
        let tiling = row_of_squares(4);
        let config = RoutingConfig::new().with_segments(2);
        let problem = RoutingProblem::new(&tiling, &config).unwrap();
        assert_eq!(problem.segment_sizes(), &[2, 2]);
        let state = problem.adopt(&RoutingState::new(vec![0, 1, 2, 3], vec![2; 4])).unwrap();
        // Edge 1 -> 2 crosses the segment boundary.
        assert_relative_eq!(problem.evaluate(&state).wire_length, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_too_many_segments() {
        let tiling = row_of_squares(3);
        let config = RoutingConfig::new().with_segments(4);
        assert!(matches!(
            RoutingProblem::new(&tiling, &config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_random_state_is_valid() {
        use rand::SeedableRng;
        let tiling = row_of_squares(6);
        let problem = RoutingProblem::new(&tiling, &RoutingConfig::default()).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let state = problem.random_state(&mut rng);
        assert!(state.check(6, 4).is_ok());
    }
}
