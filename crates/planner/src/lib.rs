//! Project pipeline of the lumatile mosaic planner.
//!
//! Loads a project file, routes the LED cable, lays the tile faces out on
//! sheet stock, picks the materials to buy and exports the LED layout.
//!
//! ```no_run
//! use lumatile_planner::{Planner, ProjectConfig};
//!
//! let project = ProjectConfig::from_file("mosaic.toml").unwrap();
//! let report = Planner::new(project).run().unwrap();
//! report.write_outputs("output").unwrap();
//! println!("total cost: {:.2}", report.bom.total_cost);
//! ```

pub mod pipeline;
pub mod project;

pub use pipeline::{load_cached_route, Planner, Report};
pub use project::{
    AssemblySection, LayoutConfig, MaterialsSection, PanelsConfig, ProjectConfig, ProjectError,
    Result,
};
