//! # Lumatile Packing
//!
//! Lays out the faces of a tile mosaic on purchasable sheet stock.
//!
//! ## Strategies
//!
//! - **Shelf**: bounding boxes on horizontal shelves, largest first, each
//!   piece tried upright and turned by 90 degrees
//! - **Lattice**: the tile family's own tessellation laid over the sheet,
//!   best variant kept
//! - **Auto**: both, keeping the layout with fewer sheets, then more tiles
//!   per sheet, then less length
//!
//! Unbounded stock (a sheet without height) yields a single layout and the
//! length of stock it consumes.
//!
//! ## Quick Start
//!
//! ```rust
//! use lumatile_core::{SheetMaterial, TileShape, TileSpec, Tiling};
//! use lumatile_packing::{PackingConfig, SheetPacker, SheetQuantity};
//!
//! let spec = TileSpec::new(TileShape::Hexagon, 0, 5.0, 0.5).unwrap();
//! let tiling = Tiling::full(spec, 3, 3).unwrap();
//! let sheet = SheetMaterial::new("plywood 60x40", 60.0, 40.0);
//!
//! let packer = SheetPacker::new(PackingConfig::new().with_spacing(0.2));
//! let result = packer.pack(&tiling, &sheet).unwrap();
//! assert!(result.validate(tiling.len(), 1e-6).is_ok());
//! assert_eq!(result.quantity, SheetQuantity::Sheets(result.sheet_count()));
//! ```

pub mod config;
mod lattice;
pub mod packer;
pub mod result;
mod shelf;

pub use config::{PackingConfig, PackingStrategy};
pub use packer::SheetPacker;
pub use result::{PackingResult, SheetLayout, SheetQuantity, TilePlacement};
