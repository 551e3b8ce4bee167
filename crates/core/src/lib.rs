//! # lumatile core
//!
//! Shared substrate for the lumatile LED-mosaic planner.
//!
//! This crate provides the tile geometry and tiling topology used by the
//! routing optimizer and the sheet packer, the material catalog consumed by
//! the assembly optimizer, and the error type shared by every crate.
//!
//! ## Core Components
//!
//! - **Tiles**: [`TileShape`], [`TileSpec`], [`Tile`]
//! - **Tilings**: [`Tiling`], [`GridCell`], [`Junctions`], [`WallCount`]
//! - **Materials**: [`MaterialCatalog`], [`SheetMaterial`], [`LedStripMaterial`], [`AssemblyGroup`]
//! - **Geometry helpers**: [`geometry`]
//!
//! ## Example
//!
//! ```rust
//! use lumatile_core::{TileShape, TileSpec, Tiling};
//!
//! let spec = TileSpec::new(TileShape::Hexagon, 0, 0.05, 0.004).unwrap();
//! let tiling = Tiling::full(spec, 3, 4).unwrap();
//! assert_eq!(tiling.len(), 12);
//! assert!(!tiling.neighbors(0).is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod catalog;
pub mod error;
pub mod geometry;
pub mod tile;
pub mod tiling;

// Re-exports
pub use catalog::{AssemblyGroup, LedStripMaterial, MaterialCatalog, SheetMaterial};
pub use error::{Error, Result};
pub use geometry::{Point2, AABB2D};
pub use tile::{Tile, TileShape, TileSpec};
pub use tiling::{GridCell, Junctions, Tiling, WallCount};
