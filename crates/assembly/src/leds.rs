//! LED strip demand of a tiling.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{AssemblyGroup, Error, LedStripMaterial, MaterialCatalog, Result, Tiling};

use crate::quantity::AssemblyOption;

/// Distance from an integer under which a fractional LED count is treated
/// as rounding noise.
const ROUNDING_TOLERANCE: f64 = 1e-6;

/// Strip length needed to line every tile with LEDs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedDemand {
    pub leds_per_tile: usize,
    /// LEDs per meter shared by the group's strips.
    pub density: f64,
    pub tiles: usize,
    /// Meters of strip, `tiles * leds_per_tile / density`.
    pub required_length: f64,
}

impl LedDemand {
    /// Demand for `tiles` tiles of the given perimeter (in meters).
    pub fn new(tile_perimeter: f64, density: f64, tiles: usize) -> Self {
        let raw = tile_perimeter * density;
        let leds_per_tile = if (raw.round() - raw).abs() < ROUNDING_TOLERANCE {
            raw.round()
        } else {
            raw.floor()
        }
        .max(0.0) as usize;
        Self {
            leds_per_tile,
            density,
            tiles,
            required_length: tiles as f64 * leds_per_tile as f64 / density,
        }
    }

    /// Demand of `tiling` for the strips listed by `group`.
    ///
    /// All strips of a group must share one LED density.
    pub fn for_group(tiling: &Tiling, group: &AssemblyGroup, catalog: &MaterialCatalog) -> Result<Self> {
        let strips = group_strips(group, catalog)?;
        let density = strips[0].leds_per_meter;
        if let Some(other) = strips
            .iter()
            .find(|s| (s.leds_per_meter - density).abs() > 1e-9 * density)
        {
            return Err(Error::Configuration(format!(
                "LED strips '{}' and '{}' in group '{}' have different densities ({} and {} LEDs/m)",
                strips[0].name, other.name, group.name, density, other.leds_per_meter
            )));
        }

        let perimeter = tiling.perimeter(0);
        let demand = Self::new(perimeter, density, tiling.len());
        debug!(
            "Group '{}': {} LEDs per tile (raw {:.4}), {:.3} m of strip",
            group.name,
            demand.leds_per_tile,
            perimeter * density,
            demand.required_length
        );
        if demand.leds_per_tile == 0 {
            return Err(Error::InsufficientCatalog {
                group: group.name.clone(),
                reason: format!(
                    "a tile perimeter of {:.3} m holds no LED at {} LEDs/m",
                    perimeter, density
                ),
            });
        }
        Ok(demand)
    }

    pub fn total_leds(&self) -> usize {
        self.tiles * self.leds_per_tile
    }
}

/// Strips of a group, in group order.
pub fn group_strips<'c>(group: &AssemblyGroup, catalog: &'c MaterialCatalog) -> Result<Vec<&'c LedStripMaterial>> {
    group.validate()?;
    group
        .materials
        .iter()
        .map(|name| catalog.led_strip(name))
        .collect()
}

/// Optimizer options for the strips of a group: one unit covers its length.
pub fn led_options(strips: &[&LedStripMaterial]) -> Vec<AssemblyOption> {
    strips
        .iter()
        .map(|s| AssemblyOption::discrete(s.name.clone(), s.length(), s.unit_cost()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumatile_core::{TileShape, TileSpec};

    #[test]
    fn test_leds_per_tile_rounding() {
        // 0.4 m * 30 LEDs/m is 12 up to floating noise.
        let demand = LedDemand::new(0.1 + 0.1 + 0.1 + 0.1, 30.0, 10);
        assert_eq!(demand.leds_per_tile, 12);
        assert_relative_eq!(demand.required_length, 4.0, epsilon = 1e-12);

        let demand = LedDemand::new(0.43, 30.0, 10);
        assert_eq!(demand.leds_per_tile, 12);
        assert_eq!(demand.total_leds(), 120);
    }

    #[test]
    fn test_group_density_must_match() {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 0.1, 0.0).unwrap();
        let tiling = Tiling::full(spec, 2, 2).unwrap();
        let catalog = MaterialCatalog::new()
            .with_led_strip(LedStripMaterial::new("a", 150, 30.0).with_cost(10.0))
            .with_led_strip(LedStripMaterial::new("b", 300, 60.0).with_cost(15.0));

        let group = AssemblyGroup::new("leds-0", ["a", "b"]);
        assert!(matches!(
            LedDemand::for_group(&tiling, &group, &catalog),
            Err(Error::Configuration(_))
        ));

        let group = AssemblyGroup::new("leds-0", ["a"]);
        let demand = LedDemand::for_group(&tiling, &group, &catalog).unwrap();
        assert_eq!(demand.leds_per_tile, 12);
        assert_relative_eq!(demand.required_length, 1.6, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_strip() {
        let catalog = MaterialCatalog::new();
        let group = AssemblyGroup::new("leds-0", ["missing"]);
        assert!(group_strips(&group, &catalog).is_err());
    }
}
