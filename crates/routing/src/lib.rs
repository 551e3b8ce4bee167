//! Cable routing for LED tile mosaics.
//!
//! Every tile carries a strip of LEDs fed through a joint placed at one of
//! its corners. A route fixes the order in which tiles are chained and the
//! corner hosting each joint. This crate searches for routes that minimize
//! cable length while never placing two joints on the same junction point.
//!
//! # Algorithm
//!
//! 1. **Junction resolution**: corners of neighboring tiles that coincide are
//!    merged into shared junction points
//! 2. **Restart/hill-climb search**: candidates start from random routes or
//!    from the best one so far, then improve through swaps, connector changes
//!    and mixed moves; only strict improvements are accepted
//! 3. **Segmentation**: long routes are split into independently wired
//!    segments whose boundaries add no cable
//! 4. **LED addressing**: each LED gets a global index along the final route
//!
//! # Example
//!
//! ```
//! use lumatile_core::{TileShape, TileSpec, Tiling};
//! use lumatile_routing::{RoutingConfig, RoutingOptimizer};
//!
//! let spec = TileSpec::new(TileShape::Hexagon, 0, 0.1, 0.01).unwrap();
//! let tiling = Tiling::full(spec, 2, 3).unwrap();
//! let config = RoutingConfig::new().with_max_iterations(10).with_seed(1);
//! let result = RoutingOptimizer::new(config).run(&tiling, None).unwrap();
//! assert_eq!(result.state.len(), 6);
//! ```

pub mod config;
pub mod leds;
pub mod problem;
pub mod search;
pub mod state;

pub use config::{RoutingConfig, Segmentation};
pub use leds::{LedAddressing, LedLayout, LedPoint, DEFAULT_COMPONENT_SIZE};
pub use problem::RoutingProblem;
pub use search::{RoutingOptimizer, RoutingProgress, RoutingResult};
pub use state::{RoutingCost, RoutingState};
