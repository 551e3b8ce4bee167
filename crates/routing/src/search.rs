//! Restart/hill-climb search for cable routes.
//!
//! # Algorithm
//!
//! 1. Start from a warm-start state (if compatible) or a random one.
//! 2. For each iteration, build a candidate: a fresh random state with
//!    probability `random_start_probability`, otherwise a copy of the best.
//! 3. Improve the candidate greedily. Each step picks a random order
//!    position and evaluates every connector change of that tile, every swap
//!    with a tile at most `max_swap_distance` positions away, and
//!    `mixed_mutations` sampled swap+connector combinations. The cheapest
//!    move is applied only if it strictly lowers the cost. The candidate is
//!    abandoned after `attempts_per_improvement` consecutive failed steps.
//! 4. A candidate replaces the best only if strictly cheaper, so equal-cost
//!    candidates never displace the earlier best.
//!
//! There is no uphill acceptance. Cancellation and the time limit are checked
//! between mutation steps; the best state found so far is always returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rand::prelude::*;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Result, Tiling};

use crate::config::RoutingConfig;
use crate::problem::RoutingProblem;
use crate::state::{RoutingCost, RoutingState};

/// Minimum cost decrease counted as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-10;

/// Progress information reported after every candidate.
#[derive(Debug, Clone)]
pub struct RoutingProgress {
    /// Candidate index (0-based).
    pub iteration: usize,
    /// Best total cost so far.
    pub best_cost: f64,
    /// Total cost of the candidate after improvement.
    pub candidate_cost: f64,
    /// Whether the candidate started from a random state.
    pub random_start: bool,
    /// Number of times the best state was replaced.
    pub improvements: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Result of a routing search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingResult {
    /// Best state found.
    pub state: RoutingState,
    /// Cost of `state`.
    pub cost: RoutingCost,
    /// Candidates built.
    pub iterations: usize,
    /// Number of times the best state was replaced.
    pub improvements: usize,
    /// Total time elapsed in milliseconds.
    pub elapsed_ms: u64,
    /// True if the search stopped on a cancellation request.
    pub cancelled: bool,
    /// Best total cost after each candidate.
    pub history: Vec<f64>,
}

/// A single move on a routing state, expressed so that applying it returns
/// its inverse.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    /// Swap two order positions.
    Swap(usize, usize),
    /// Set the connector of a tile.
    Connector { tile: usize, corner: usize },
    /// Change a connector, then swap two positions.
    Mixed {
        tile: usize,
        corner: usize,
        a: usize,
        b: usize,
    },
}

impl Mutation {
    /// Applies the move and returns the move that undoes it.
    fn apply(self, state: &mut RoutingState) -> Mutation {
        match self {
            Mutation::Swap(a, b) => {
                state.order.swap(a, b);
                Mutation::Swap(a, b)
            }
            Mutation::Connector { tile, corner } => {
                let previous = std::mem::replace(&mut state.connectors[tile], corner);
                Mutation::Connector {
                    tile,
                    corner: previous,
                }
            }
            Mutation::Mixed { tile, corner, a, b } => {
                let previous = std::mem::replace(&mut state.connectors[tile], corner);
                state.order.swap(a, b);
                Mutation::Mixed {
                    tile,
                    corner: previous,
                    a,
                    b,
                }
            }
        }
    }
}

/// Restart/hill-climb routing optimizer.
pub struct RoutingOptimizer {
    config: RoutingConfig,
    cancelled: Arc<AtomicBool>,
}

impl RoutingOptimizer {
    /// Creates a new optimizer with the given configuration.
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Returns a handle to cancel the search. Setting it makes the running
    /// search return its best state at the next mutation step. The flag is
    /// cleared when that search returns, so a later run starts normally.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Runs the search on `tiling`, optionally warm-started.
    pub fn run(&self, tiling: &Tiling, warm_start: Option<&RoutingState>) -> Result<RoutingResult> {
        self.run_with_progress(tiling, warm_start, |_| {})
    }

    /// Runs the search, reporting progress after every candidate.
    pub fn run_with_progress<F>(
        &self,
        tiling: &Tiling,
        warm_start: Option<&RoutingState>,
        progress_callback: F,
    ) -> Result<RoutingResult>
    where
        F: FnMut(&RoutingProgress),
    {
        let problem = RoutingProblem::new(tiling, &self.config)?;
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let result = self.search(&problem, warm_start, rng, progress_callback);
        self.cancelled.store(false, Ordering::Relaxed);
        Ok(result)
    }

    /// Runs one independent search per seed in parallel and keeps the
    /// cheapest result. Ties go to the earlier seed.
    pub fn run_many(
        &self,
        tiling: &Tiling,
        warm_start: Option<&RoutingState>,
        seeds: &[u64],
    ) -> Result<RoutingResult> {
        let problem = RoutingProblem::new(tiling, &self.config)?;

        let results: Vec<RoutingResult> = seeds
            .par_iter()
            .map(|&seed| self.search(&problem, warm_start, StdRng::seed_from_u64(seed), |_| {}))
            .collect();
        self.cancelled.store(false, Ordering::Relaxed);

        results
            .into_iter()
            .reduce(|best, result| {
                if result.cost.total < best.cost.total - IMPROVEMENT_EPSILON {
                    result
                } else {
                    best
                }
            })
            .ok_or_else(|| Error::Configuration("at least one seed is required".into()))
    }

    fn search<F>(
        &self,
        problem: &RoutingProblem,
        warm_start: Option<&RoutingState>,
        mut rng: StdRng,
        mut progress_callback: F,
    ) -> RoutingResult
    where
        F: FnMut(&RoutingProgress),
    {
        let start_time = Instant::now();

        let mut best = match warm_start.map(|s| problem.adopt(s)) {
            Some(Ok(state)) => {
                debug!("Starting routing from cached state");
                state
            }
            Some(Err(e)) => {
                info!("Ignoring cached routing ({}); starting from a random state", e);
                problem.random_state(&mut rng)
            }
            None => problem.random_state(&mut rng),
        };
        let mut best_cost = problem.evaluate(&best);
        debug!(
            "Initial routing cost: {:.4} ({} conflicts)",
            best_cost.total, best_cost.conflicts
        );

        let mut history = Vec::with_capacity(self.config.max_iterations.min(4096));
        let mut iterations = 0;
        let mut improvements = 0;
        let mut cancelled = false;

        while iterations < self.config.max_iterations {
            if let Some(by_user) = self.should_stop(start_time) {
                cancelled = by_user;
                break;
            }

            let random_start = rng.gen::<f64>() < self.config.random_start_probability;
            let mut candidate = if random_start {
                problem.random_state(&mut rng)
            } else {
                best.clone()
            };
            let mut candidate_cost = problem.evaluate(&candidate);
            let interrupted = self.improve(
                problem,
                &mut candidate,
                &mut candidate_cost,
                &mut rng,
                start_time,
            );

            if candidate_cost.total < best_cost.total - IMPROVEMENT_EPSILON {
                best = candidate;
                best_cost = candidate_cost;
                improvements += 1;
                debug!(
                    "Routing iteration {}: new best cost {:.4} ({} conflicts)",
                    iterations, best_cost.total, best_cost.conflicts
                );
            }

            history.push(best_cost.total);
            progress_callback(&RoutingProgress {
                iteration: iterations,
                best_cost: best_cost.total,
                candidate_cost: candidate_cost.total,
                random_start,
                improvements,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            });
            iterations += 1;

            if let Some(by_user) = interrupted {
                cancelled = by_user;
                break;
            }
        }

        if cancelled {
            info!("Routing interrupted after {} iterations", iterations);
        }

        RoutingResult {
            state: best,
            cost: best_cost,
            iterations,
            improvements,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            cancelled,
            history,
        }
    }

    /// `Some(true)` on cancellation, `Some(false)` when the time limit is
    /// reached, `None` to keep going.
    fn should_stop(&self, start_time: Instant) -> Option<bool> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(true);
        }
        if self.config.time_limit_ms > 0
            && start_time.elapsed().as_millis() as u64 >= self.config.time_limit_ms
        {
            return Some(false);
        }
        None
    }

    /// Greedy improvement of one candidate. Returns the stop reason if the
    /// search was interrupted.
    fn improve(
        &self,
        problem: &RoutingProblem,
        state: &mut RoutingState,
        cost: &mut RoutingCost,
        rng: &mut StdRng,
        start_time: Instant,
    ) -> Option<bool> {
        let n = problem.tile_count();
        let corners = problem.vertices_per_tile();
        let max_distance = self.config.max_swap_distance.clamp(1, n.saturating_sub(1).max(1));

        let mut failures = 0;
        let mut moves = Vec::new();
        while failures < self.config.attempts_per_improvement {
            if let Some(reason) = self.should_stop(start_time) {
                return Some(reason);
            }

            let position = rng.gen_range(0..n);
            let tile = state.order[position];
            let current = state.connectors[tile];

            moves.clear();
            for increment in 1..corners {
                moves.push(Mutation::Connector {
                    tile,
                    corner: (current + increment) % corners,
                });
            }
            if n > 1 {
                for distance in 1..=max_distance {
                    if position + distance < n {
                        moves.push(Mutation::Swap(position, position + distance));
                    }
                    if position >= distance {
                        moves.push(Mutation::Swap(position, position - distance));
                    }
                }
                if corners > 1 {
                    for _ in 0..self.config.mixed_mutations {
                        let corner = (current + rng.gen_range(1..corners)) % corners;
                        let distance = rng.gen_range(1..=max_distance);
                        let partner = swap_partner(position, distance, n, rng);
                        moves.push(Mutation::Mixed {
                            tile,
                            corner,
                            a: position,
                            b: partner,
                        });
                    }
                }
            }

            let mut best_move: Option<(Mutation, RoutingCost)> = None;
            for &m in &moves {
                let undo = m.apply(state);
                let trial = problem.evaluate(state);
                undo.apply(state);
                if best_move.map_or(true, |(_, c)| trial.total < c.total) {
                    best_move = Some((m, trial));
                }
            }

            match best_move {
                Some((m, trial)) if trial.total < cost.total - IMPROVEMENT_EPSILON => {
                    m.apply(state);
                    *cost = trial;
                    failures = 0;
                }
                _ => failures += 1,
            }
        }
        None
    }
}

/// Position `distance` steps away from `position`, in a random direction
/// when both are available.
fn swap_partner(position: usize, distance: usize, n: usize, rng: &mut StdRng) -> usize {
    let forward = position + distance;
    let backward = position.checked_sub(distance);
    match (forward < n, backward) {
        (true, Some(b)) => {
            if rng.gen_bool(0.5) {
                forward
            } else {
                b
            }
        }
        (true, None) => forward,
        (false, Some(b)) => b,
        // Distance exceeds both ends; fall back to the nearest valid index.
        (false, None) => {
            if position + 1 < n {
                n - 1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumatile_core::{TileShape, TileSpec};

    fn squares(rows: usize, cols: usize) -> Tiling {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 0.1, 0.01).unwrap();
        Tiling::full(spec, rows, cols).unwrap()
    }

    fn quick_config() -> RoutingConfig {
        RoutingConfig::new()
            .with_max_iterations(30)
            .with_attempts_per_improvement(20)
            .with_seed(42)
    }

    #[test]
    fn test_result_is_a_permutation() {
        let tiling = squares(3, 4);
        let result = RoutingOptimizer::new(quick_config()).run(&tiling, None).unwrap();
        let mut order = result.state.order.clone();
        order.sort_unstable();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
        assert!(result.state.check(12, 4).is_ok());
        assert_eq!(result.iterations, 30);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_history_is_non_increasing() {
        let tiling = squares(3, 3);
        let result = RoutingOptimizer::new(quick_config()).run(&tiling, None).unwrap();
        assert_eq!(result.history.len(), result.iterations);
        for pair in result.history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(*result.history.last().unwrap(), result.cost.total);
    }

    #[test]
    fn test_same_seed_same_result() {
        let tiling = squares(3, 3);
        let a = RoutingOptimizer::new(quick_config()).run(&tiling, None).unwrap();
        let b = RoutingOptimizer::new(quick_config()).run(&tiling, None).unwrap();
        assert_eq!(a.state, b.state);
        assert_eq!(a.cost.total.to_bits(), b.cost.total.to_bits());
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_cancel_before_run_returns_valid_state() {
        let tiling = squares(2, 3);
        let optimizer = RoutingOptimizer::new(quick_config());
        optimizer.cancel_handle().store(true, Ordering::Relaxed);
        let result = optimizer.run(&tiling, None).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        assert!(result.state.check(6, 4).is_ok());
    }

    #[test]
    fn test_cancel_from_progress_callback() {
        let tiling = squares(3, 3);
        let optimizer = RoutingOptimizer::new(quick_config().with_max_iterations(1000));
        let handle = optimizer.cancel_handle();
        let result = optimizer
            .run_with_progress(&tiling, None, |p| {
                if p.iteration == 4 {
                    handle.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 5);
    }

    #[test]
    fn test_cancellation_does_not_outlive_the_run() {
        let tiling = squares(2, 3);
        let optimizer = RoutingOptimizer::new(quick_config());
        optimizer.cancel_handle().store(true, Ordering::Relaxed);
        assert!(optimizer.run(&tiling, None).unwrap().cancelled);

        let next = optimizer.run(&tiling, None).unwrap();
        assert!(!next.cancelled);
        assert_eq!(next.iterations, quick_config().max_iterations);

        optimizer.cancel_handle().store(true, Ordering::Relaxed);
        assert!(optimizer.run_many(&tiling, None, &[1, 2]).unwrap().cancelled);
        assert!(!optimizer.run_many(&tiling, None, &[1, 2]).unwrap().cancelled);
    }

    #[test]
    fn test_warm_start_never_worsens() {
        let tiling = squares(3, 3);
        let first = RoutingOptimizer::new(quick_config()).run(&tiling, None).unwrap();
        let resumed = RoutingOptimizer::new(quick_config().with_seed(7))
            .run(&tiling, Some(&first.state))
            .unwrap();
        assert!(resumed.cost.total <= first.cost.total);
    }

    #[test]
    fn test_incompatible_warm_start_falls_back() {
        let tiling = squares(2, 2);
        let stale = RoutingState::new(vec![0, 1, 2], vec![0, 0, 0]);
        let result = RoutingOptimizer::new(quick_config())
            .run(&tiling, Some(&stale))
            .unwrap();
        assert!(result.state.check(4, 4).is_ok());
    }

    #[test]
    fn test_segments_respected() {
        let tiling = squares(3, 3);
        let config = quick_config().with_tiles_per_segment(4);
        let result = RoutingOptimizer::new(config).run(&tiling, None).unwrap();
        assert_eq!(result.state.segments, vec![3, 3, 3]);
    }

    #[test]
    fn test_run_many_keeps_cheapest() {
        let tiling = squares(2, 3);
        let optimizer = RoutingOptimizer::new(quick_config());
        let best = optimizer.run_many(&tiling, None, &[1, 2, 3]).unwrap();
        for seed in [1, 2, 3] {
            let single = RoutingOptimizer::new(quick_config().with_seed(seed))
                .run(&tiling, None)
                .unwrap();
            assert!(best.cost.total <= single.cost.total);
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_search() {
        let tiling = squares(2, 2);
        let config = quick_config().with_segments(2).with_tiles_per_segment(2);
        assert!(RoutingOptimizer::new(config).run(&tiling, None).is_err());
    }
}
