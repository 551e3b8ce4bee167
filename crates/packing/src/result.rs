//! Packing result representation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::geometry::{convex_polygons_overlap, polygon_area};
use lumatile_core::{Error, Point2, Result, AABB2D};

use crate::config::PackingStrategy;

/// A tile face cut from a sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilePlacement {
    /// Index of the tile in the tiling.
    pub tile: usize,
    /// Center of the piece on the sheet.
    pub position: Point2,
    /// Rotation from the tile's orientation in the mosaic, in radians.
    pub rotation: f64,
    /// Absolute outline on the sheet.
    pub outline: Vec<Point2>,
}

/// Pieces cut from one sheet instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetLayout {
    pub index: usize,
    pub placements: Vec<TilePlacement>,
}

/// Amount of material to buy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SheetQuantity {
    /// Whole fixed-size sheets.
    Sheets(usize),
    /// Length of unbounded stock.
    Length(f64),
}

/// Layout of every tile of a tiling on one sheet material.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingResult {
    /// Name of the sheet material.
    pub material: String,

    /// Strategy that produced this layout.
    pub strategy: PackingStrategy,

    /// Tile variant used by a lattice layout.
    pub variant: Option<usize>,

    pub sheet_width: f64,

    /// `None` for unbounded stock.
    pub sheet_height: Option<f64>,

    /// One entry per sheet instance. Unbounded stock uses a single layout.
    pub sheets: Vec<SheetLayout>,

    /// Tiles that fit on one full sheet, capped at the number of tiles.
    pub capacity_per_sheet: usize,

    pub quantity: SheetQuantity,

    /// Length of unbounded stock consumed, margin included.
    pub required_length: Option<f64>,

    /// Ratio of tile area to consumed sheet area (0.0 - 1.0).
    pub utilization: f64,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,
}

impl PackingResult {
    /// Number of sheet instances used.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Total number of placed pieces.
    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    /// All placements, sheet by sheet.
    pub fn placements(&self) -> impl Iterator<Item = &TilePlacement> {
        self.sheets.iter().flat_map(|s| s.placements.iter())
    }

    /// Returns utilization as a percentage string.
    pub fn utilization_percent(&self) -> String {
        format!("{:.1}%", self.utilization * 100.0)
    }

    /// Usable extent of one sheet instance.
    pub fn sheet_bounds(&self) -> AABB2D {
        let height = self
            .sheet_height
            .or(self.required_length)
            .unwrap_or(f64::INFINITY);
        AABB2D::new(0.0, 0.0, self.sheet_width, height)
    }

    /// Fills in quantity and utilization from the placed sheets.
    pub(crate) fn finish(&mut self) {
        let tile_area: f64 = self.placements().map(|p| polygon_area(&p.outline)).sum();
        let (quantity, consumed) = match (self.sheet_height, self.required_length) {
            (Some(h), _) => (
                SheetQuantity::Sheets(self.sheets.len()),
                self.sheet_width * h * self.sheets.len() as f64,
            ),
            (None, length) => {
                let length = length.unwrap_or(0.0);
                (SheetQuantity::Length(length), self.sheet_width * length)
            }
        };
        self.quantity = quantity;
        self.utilization = if consumed > 0.0 {
            tile_area / consumed
        } else {
            0.0
        };
    }

    /// Checks that each of `tiles` tiles is placed exactly once, inside its
    /// sheet, without overlapping any other piece.
    pub fn validate(&self, tiles: usize, tolerance: f64) -> Result<()> {
        let mut seen = vec![false; tiles];
        for placement in self.placements() {
            if placement.tile >= tiles || seen[placement.tile] {
                return Err(Error::Configuration(format!(
                    "layout on '{}' places tile {} more than once or out of range",
                    self.material, placement.tile
                )));
            }
            seen[placement.tile] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(Error::Configuration(format!(
                "layout on '{}' does not place tile {}",
                self.material, missing
            )));
        }

        let bounds = self.sheet_bounds();
        for sheet in &self.sheets {
            let boxes: Vec<AABB2D> = sheet
                .placements
                .iter()
                .map(|p| AABB2D::from_points(&p.outline).unwrap_or(bounds))
                .collect();
            for (i, a) in sheet.placements.iter().enumerate() {
                if !bounds.contains(&boxes[i], tolerance) {
                    return Err(Error::Configuration(format!(
                        "tile {} leaves sheet {} of '{}'",
                        a.tile, sheet.index, self.material
                    )));
                }
                for (j, b) in sheet.placements.iter().enumerate().skip(i + 1) {
                    if boxes[i].intersects(&boxes[j], tolerance)
                        && convex_polygons_overlap(&a.outline, &b.outline, tolerance)
                    {
                        return Err(Error::Configuration(format!(
                            "tiles {} and {} overlap on sheet {} of '{}'",
                            a.tile, b.tile, sheet.index, self.material
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64) -> Vec<Point2> {
        vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0)]
    }

    fn result_with(placements: Vec<TilePlacement>) -> PackingResult {
        let mut result = PackingResult {
            material: "test".into(),
            strategy: PackingStrategy::Shelf,
            variant: None,
            sheet_width: 2.0,
            sheet_height: Some(2.0),
            sheets: vec![SheetLayout {
                index: 0,
                placements,
            }],
            capacity_per_sheet: 4,
            quantity: SheetQuantity::Sheets(0),
            required_length: None,
            utilization: 0.0,
            computation_time_ms: 0,
        };
        result.finish();
        result
    }

    fn piece(tile: usize, x: f64, y: f64) -> TilePlacement {
        TilePlacement {
            tile,
            position: (x + 0.5, y + 0.5),
            rotation: 0.0,
            outline: square(x, y),
        }
    }

    #[test]
    fn test_touching_pieces_are_valid() {
        let result = result_with(vec![piece(0, 0.0, 0.0), piece(1, 1.0, 0.0)]);
        assert!(result.validate(2, 1e-9).is_ok());
        assert_eq!(result.quantity, SheetQuantity::Sheets(1));
        assert_relative_eq!(result.utilization, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_overlap_detected() {
        let result = result_with(vec![piece(0, 0.0, 0.0), piece(1, 0.5, 0.5)]);
        assert!(result.validate(2, 1e-9).is_err());
    }

    #[test]
    fn test_missing_and_duplicate_tiles() {
        let result = result_with(vec![piece(0, 0.0, 0.0)]);
        assert!(result.validate(2, 1e-9).is_err());
        let result = result_with(vec![piece(0, 0.0, 0.0), piece(0, 1.0, 1.0)]);
        assert!(result.validate(2, 1e-9).is_err());
    }

    #[test]
    fn test_out_of_sheet_detected() {
        let result = result_with(vec![piece(0, 1.5, 0.0)]);
        assert!(result.validate(1, 1e-9).is_err());
    }
}
