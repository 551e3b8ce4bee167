//! # Lumatile Assembly
//!
//! Decides how much material to buy for a tile mosaic.
//!
//! - [`quantity`]: exact minimum-cost covering of a demand by discrete units,
//!   with continuous stock as the fallback
//! - [`leds`]: LEDs per tile and strip length of a tiling
//! - [`bom`]: bill of materials built group by group
//!
//! ## Example
//!
//! ```rust
//! use lumatile_assembly::{optimize, AssemblyOption};
//!
//! let options = vec![
//!     AssemblyOption::discrete("1m strip", 1.0, 10.0),
//!     AssemblyOption::discrete("5m strip", 5.0, 20.0),
//! ];
//! let selection = optimize("leds-0", 4.2, &options).unwrap();
//! assert_eq!(selection.total_cost, 20.0);
//! assert!(selection.capacity >= 4.2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod bom;
pub mod leds;
pub mod quantity;

pub use bom::{BillItem, BillOfMaterials, BillQuantity, BomBuilder, GroupFailure};
pub use leds::LedDemand;
pub use quantity::{optimize, Amount, AssemblyOption, SelectedItem, Selection};
