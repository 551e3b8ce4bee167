//! Sheet packer: lays out every tile of a tiling on one sheet material.

use std::cmp::Ordering;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use lumatile_core::geometry::translate;
use lumatile_core::{Error, MaterialCatalog, Point2, Result, SheetMaterial, Tiling, AABB2D};

use crate::config::{PackingConfig, PackingStrategy};
use crate::lattice::{self, LatticeFill};
use crate::result::{PackingResult, SheetLayout, SheetQuantity, TilePlacement};
use crate::shelf::ShelfPacker;

/// A tile face with its outline relative to the tile center.
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub tile: usize,
    pub outline: Vec<Point2>,
    /// Angle of the first corner in the mosaic.
    pub orientation: f64,
}

impl Piece {
    fn from_tiling(tiling: &Tiling) -> Vec<Piece> {
        tiling
            .tiles()
            .iter()
            .enumerate()
            .map(|(tile, t)| {
                let c = t.center();
                Piece {
                    tile,
                    outline: translate(&t.outline(), -c.0, -c.1),
                    orientation: t.orientation(),
                }
            })
            .collect()
    }
}

/// Packs tile faces onto sheet materials.
pub struct SheetPacker {
    config: PackingConfig,
}

impl SheetPacker {
    /// Creates a new packer with the given configuration.
    pub fn new(config: PackingConfig) -> Self {
        Self { config }
    }

    /// Creates a packer with default configuration.
    pub fn default_config() -> Self {
        Self::new(PackingConfig::default())
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    /// Lays out every tile of `tiling` on `sheet`.
    ///
    /// Fails with [`Error::SheetTooSmall`] if a single tile does not fit an
    /// empty sheet.
    pub fn pack(&self, tiling: &Tiling, sheet: &SheetMaterial) -> Result<PackingResult> {
        self.config.validate()?;
        sheet.validate()?;
        let start = Instant::now();

        let region = self.usable_region(sheet)?;
        let pieces = Piece::from_tiling(tiling);

        let mut result = match self.config.strategy {
            PackingStrategy::Shelf => self.shelf(tiling, sheet, &region, &pieces),
            PackingStrategy::Lattice => self.lattice(tiling, sheet, &region, &pieces),
            PackingStrategy::Auto => {
                let shelf = self.shelf(tiling, sheet, &region, &pieces);
                let lattice = self.lattice(tiling, sheet, &region, &pieces);
                match (shelf, lattice) {
                    (Ok(s), Ok(l)) => {
                        if compare(&l, &s) == Ordering::Less {
                            Ok(l)
                        } else {
                            Ok(s)
                        }
                    }
                    (Ok(s), Err(_)) => Ok(s),
                    (Err(_), Ok(l)) => Ok(l),
                    (Err(e), Err(_)) => Err(e),
                }
            }
        }?;

        result.computation_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Packed {} tiles on '{}' ({:?}): {} sheets, {} per sheet, utilization {}",
            tiling.len(),
            sheet.name,
            result.strategy,
            result.sheet_count(),
            result.capacity_per_sheet,
            result.utilization_percent()
        );
        Ok(result)
    }

    /// Packs the tiling on every sheet of the catalog in parallel.
    ///
    /// Materials that cannot hold a tile are skipped with a warning; other
    /// errors abort.
    pub fn pack_catalog(&self, tiling: &Tiling, catalog: &MaterialCatalog) -> Result<Vec<PackingResult>> {
        let sheets: Vec<&SheetMaterial> = catalog.sheets().collect();
        let results: Vec<Result<PackingResult>> = sheets
            .par_iter()
            .map(|sheet| self.pack(tiling, sheet))
            .collect();

        let mut packings = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(packing) => packings.push(packing),
                Err(Error::SheetTooSmall { material }) => {
                    warn!("Skipping sheet '{}': no tile fits on it", material);
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            "Computed layouts for {} of {} sheet materials",
            packings.len(),
            sheets.len()
        );
        Ok(packings)
    }

    fn usable_region(&self, sheet: &SheetMaterial) -> Result<AABB2D> {
        let m = self.config.margin;
        let max_y = sheet.height.map_or(f64::INFINITY, |h| h - m);
        if sheet.width - 2.0 * m <= 0.0 || max_y - m <= 0.0 {
            return Err(Error::SheetTooSmall {
                material: sheet.name.clone(),
            });
        }
        Ok(AABB2D::new(m, m, sheet.width - m, max_y))
    }

    fn empty_result(&self, sheet: &SheetMaterial, strategy: PackingStrategy) -> PackingResult {
        PackingResult {
            material: sheet.name.clone(),
            strategy,
            variant: None,
            sheet_width: sheet.width,
            sheet_height: sheet.height,
            sheets: Vec::new(),
            capacity_per_sheet: 0,
            quantity: SheetQuantity::Sheets(0),
            required_length: None,
            utilization: 0.0,
            computation_time_ms: 0,
        }
    }

    fn shelf(
        &self,
        tiling: &Tiling,
        sheet: &SheetMaterial,
        region: &AABB2D,
        pieces: &[Piece],
    ) -> Result<PackingResult> {
        let tolerance = tiling.spec().tolerance();
        let packer = ShelfPacker::new(region, self.config.spacing, self.config.allow_rotation, tolerance);
        let sheets = packer.pack(pieces).ok_or_else(|| Error::SheetTooSmall {
            material: sheet.name.clone(),
        })?;

        let mut result = self.empty_result(sheet, PackingStrategy::Shelf);
        result.capacity_per_sheet = sheets.first().map_or(0, |s| s.placements.len());
        if sheet.is_unbounded() {
            result.required_length = Some(reach(&sheets) + self.config.margin);
        }
        result.sheets = sheets;
        result.finish();
        Ok(result)
    }

    fn lattice(
        &self,
        tiling: &Tiling,
        sheet: &SheetMaterial,
        region: &AABB2D,
        pieces: &[Piece],
    ) -> Result<PackingResult> {
        let n = pieces.len();
        let spec = tiling.spec();
        let mut best: Option<LatticeFill> = None;
        for &variant in spec.shape.variants() {
            let fill = lattice::fill(spec, variant, self.config.spacing, region, n)?;
            if fill.slots.is_empty() || (sheet.is_unbounded() && fill.slots.len() < n) {
                continue;
            }
            let better = match &best {
                None => true,
                Some(b) if sheet.is_unbounded() => fill.length() < b.length() - spec.tolerance(),
                Some(b) => match fill.slots.len().cmp(&b.slots.len()) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => extent_area(&fill) < extent_area(b) - spec.tolerance(),
                },
            };
            if better {
                best = Some(fill);
            }
        }
        let fill = best.ok_or_else(|| Error::SheetTooSmall {
            material: sheet.name.clone(),
        })?;

        // Repeat the layout on as many sheets as needed.
        let capacity = fill.slots.len();
        let mut sheets: Vec<SheetLayout> = Vec::new();
        for (k, piece) in pieces.iter().enumerate() {
            let index = k / capacity;
            if sheets.len() <= index {
                sheets.push(SheetLayout {
                    index,
                    placements: Vec::with_capacity(capacity),
                });
            }
            let slot = &fill.slots[k % capacity];
            sheets[index].placements.push(TilePlacement {
                tile: piece.tile,
                position: slot.center,
                rotation: lattice::relative_rotation(piece.orientation, slot.orientation),
                outline: slot.outline.clone(),
            });
        }

        let mut result = self.empty_result(sheet, PackingStrategy::Lattice);
        result.variant = Some(fill.variant);
        result.capacity_per_sheet = capacity;
        if sheet.is_unbounded() {
            result.required_length = Some(fill.length() + self.config.margin);
        }
        result.sheets = sheets;
        result.finish();
        Ok(result)
    }
}

/// Orders layouts: fewer sheets, then more tiles per sheet, then less length.
fn compare(a: &PackingResult, b: &PackingResult) -> Ordering {
    a.sheet_count()
        .cmp(&b.sheet_count())
        .then(b.capacity_per_sheet.cmp(&a.capacity_per_sheet))
        .then(
            a.required_length
                .unwrap_or(0.0)
                .partial_cmp(&b.required_length.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        )
}

fn reach(sheets: &[SheetLayout]) -> f64 {
    sheets
        .iter()
        .flat_map(|s| s.placements.iter())
        .flat_map(|p| p.outline.iter())
        .map(|p| p.1)
        .fold(0.0, f64::max)
}

fn extent_area(fill: &LatticeFill) -> f64 {
    fill.extent().map_or(0.0, |e| e.area())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumatile_core::{TileShape, TileSpec};

    fn squares(rows: usize, cols: usize) -> Tiling {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 10.0, 1.0).unwrap();
        Tiling::full(spec, rows, cols).unwrap()
    }

    #[test]
    fn test_squares_on_fixed_sheet() {
        let tiling = squares(2, 3);
        let sheet = SheetMaterial::new("board", 20.0, 20.0);
        let result = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
        assert_eq!(result.capacity_per_sheet, 4);
        assert_eq!(result.quantity, SheetQuantity::Sheets(2));
        assert!(result.validate(6, 1e-6).is_ok());
    }

    #[test]
    fn test_unbounded_strip_length() {
        let tiling = squares(2, 3);
        let sheet = SheetMaterial::unbounded("roll", 20.0);
        let result = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
        assert_eq!(result.sheet_count(), 1);
        let length = result.required_length.unwrap();
        assert_relative_eq!(length, 30.0, epsilon = 1e-6);
        assert_eq!(result.quantity, SheetQuantity::Length(length));
        assert!(result.validate(6, 1e-6).is_ok());
    }

    #[test]
    fn test_margin_and_spacing_reduce_capacity() {
        let tiling = squares(2, 2);
        let sheet = SheetMaterial::new("board", 20.0, 20.0);
        let config = PackingConfig::new().with_spacing(0.5).with_margin(1.0);
        let result = SheetPacker::new(config).pack(&tiling, &sheet).unwrap();
        assert_eq!(result.capacity_per_sheet, 1);
        assert_eq!(result.sheet_count(), 4);
    }

    #[test]
    fn test_sheet_too_small() {
        let tiling = squares(1, 1);
        let sheet = SheetMaterial::new("offcut", 5.0, 50.0);
        let err = SheetPacker::default_config().pack(&tiling, &sheet).unwrap_err();
        assert!(matches!(err, Error::SheetTooSmall { material } if material == "offcut"));
    }

    #[test]
    fn test_catalog_skips_small_sheets() {
        let tiling = squares(1, 2);
        let catalog = MaterialCatalog::new()
            .with_sheet(SheetMaterial::new("offcut", 5.0, 5.0))
            .with_sheet(SheetMaterial::new("board", 30.0, 30.0));
        let packings = SheetPacker::default_config()
            .pack_catalog(&tiling, &catalog)
            .unwrap();
        assert_eq!(packings.len(), 1);
        assert_eq!(packings[0].material, "board");
    }
}
