//! Per-LED addressing of a routed mosaic.
//!
//! Once the number of LEDs per tile is known, every LED gets a global index
//! following the cable: segment by segment, tile by tile, starting right after
//! the connector corner of each tile.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumatile_core::{Error, Point2, Result, Tiling};

use crate::state::RoutingState;

/// Inset of the LED strip from the tile outline.
const STRIP_BORDER: f64 = -1.0;

/// Default largest dimension of an exported layout.
pub const DEFAULT_COMPONENT_SIZE: f64 = 20.0;

/// One addressable LED.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedPoint {
    /// Global index along the cable.
    pub index: usize,
    /// Tile hosting the LED.
    pub tile: usize,
    pub position: Point2,
}

/// LEDs of a routed tiling, grouped by segment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedAddressing {
    pub leds_per_tile: usize,
    pub segments: Vec<Vec<LedPoint>>,
}

impl LedAddressing {
    /// Samples `leds_per_tile` LEDs along each routed tile.
    pub fn build(tiling: &Tiling, state: &RoutingState, leds_per_tile: usize) -> Result<Self> {
        state.check(tiling.len(), tiling.vertices_per_tile())?;
        if leds_per_tile == 0 {
            return Err(Error::Configuration(
                "at least one LED per tile is required".into(),
            ));
        }

        let mut index = 0;
        let segments = state
            .segment_tiles()
            .into_iter()
            .map(|tiles| {
                let mut leds = Vec::with_capacity(tiles.len() * leds_per_tile);
                for &tile in tiles {
                    let points = tiling.tile(tile).sample_perimeter(
                        leds_per_tile,
                        state.connectors[tile],
                        STRIP_BORDER,
                    );
                    for position in points {
                        leds.push(LedPoint {
                            index,
                            tile,
                            position,
                        });
                        index += 1;
                    }
                }
                leds
            })
            .collect();

        Ok(Self {
            leds_per_tile,
            segments,
        })
    }

    /// Total number of LEDs.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All LEDs in cable order.
    pub fn iter(&self) -> impl Iterator<Item = &LedPoint> {
        self.segments.iter().flatten()
    }
}

/// Custom device layout for desktop lighting software.
///
/// Coordinates are scaled so the larger side of the mosaic measures
/// `component_size`, with the y axis pointing down.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct LedLayout {
    pub product_name: String,
    pub display_name: String,
    pub brand: String,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub kind: String,
    pub led_count: usize,
    pub width: u32,
    pub height: u32,
    pub led_mapping: Vec<usize>,
    pub led_coordinates: Vec<[f64; 2]>,
    pub led_names: Vec<String>,
}

impl LedLayout {
    /// Layout with every LED at its sampled position.
    pub fn detailed(
        name: &str,
        tiling: &Tiling,
        leds: &LedAddressing,
        component_size: f64,
    ) -> Self {
        let frame = Frame::new(tiling, component_size);
        let coordinates = leds.iter().map(|led| frame.map(led.position)).collect();
        Self::assemble(name.to_string(), leds, &frame, coordinates)
    }

    /// Layout with all LEDs of a tile collapsed onto its center.
    pub fn centered(
        name: &str,
        tiling: &Tiling,
        leds: &LedAddressing,
        component_size: f64,
    ) -> Self {
        let frame = Frame::new(tiling, component_size);
        let coordinates = leds
            .iter()
            .map(|led| frame.map(tiling.tile(led.tile).center()))
            .collect();
        Self::assemble(format!("{} centered", name), leds, &frame, coordinates)
    }

    fn assemble(
        name: String,
        leds: &LedAddressing,
        frame: &Frame,
        led_coordinates: Vec<[f64; 2]>,
    ) -> Self {
        let per_tile = leds.leds_per_tile.max(1);
        let led_count = leds.len();
        Self {
            product_name: name.clone(),
            display_name: name,
            brand: "Lumatile".to_string(),
            kind: "custom".to_string(),
            led_count,
            width: frame.width.round() as u32,
            height: frame.height.round() as u32,
            led_mapping: (0..led_count).collect(),
            led_coordinates,
            led_names: (0..led_count)
                .map(|i| format!("Led {} (tile {})", i, i / per_tile))
                .collect(),
        }
    }
}

/// Maps mosaic coordinates into layout space.
struct Frame {
    origin: Point2,
    scale: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn new(tiling: &Tiling, component_size: f64) -> Self {
        let bounds = tiling.bounding_box(0.0);
        let extent = bounds.width().max(bounds.height());
        let scale = if extent > 0.0 {
            component_size / extent
        } else {
            1.0
        };
        Self {
            origin: (bounds.min_x, bounds.min_y),
            scale,
            width: bounds.width() * scale,
            height: bounds.height() * scale,
        }
    }

    fn map(&self, p: Point2) -> [f64; 2] {
        let x = (p.0 - self.origin.0) * self.scale;
        let y = (p.1 - self.origin.1) * self.scale;
        [x, self.height - y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumatile_core::{TileShape, TileSpec};

    fn routed_squares() -> (Tiling, RoutingState) {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 10.0, 0.0).unwrap();
        let tiling = Tiling::full(spec, 1, 3).unwrap();
        let state = RoutingState {
            order: vec![2, 0, 1],
            connectors: vec![1, 2, 3],
            segments: vec![2, 1],
        };
        (tiling, state)
    }

    #[test]
    fn test_addressing_follows_route() {
        let (tiling, state) = routed_squares();
        let leds = LedAddressing::build(&tiling, &state, 4).unwrap();
        assert_eq!(leds.segments.len(), 2);
        assert_eq!(leds.segments[0].len(), 8);
        assert_eq!(leds.segments[1].len(), 4);
        assert_eq!(leds.len(), 12);

        let tiles: Vec<usize> = leds.iter().map(|l| l.tile).collect();
        assert_eq!(tiles, vec![2, 2, 2, 2, 0, 0, 0, 0, 1, 1, 1, 1]);
        for (i, led) in leds.iter().enumerate() {
            assert_eq!(led.index, i);
            assert!(tiling.tile(led.tile).contains(led.position));
        }
    }

    #[test]
    fn test_zero_leds_rejected() {
        let (tiling, state) = routed_squares();
        assert!(LedAddressing::build(&tiling, &state, 0).is_err());
    }

    #[test]
    fn test_layout_scaling_and_names() {
        let (tiling, state) = routed_squares();
        let leds = LedAddressing::build(&tiling, &state, 4).unwrap();
        let layout = LedLayout::detailed("Desk", &tiling, &leds, 30.0);
        assert_eq!(layout.width, 30);
        assert_eq!(layout.height, 10);
        assert_eq!(layout.led_count, 12);
        assert_eq!(layout.led_names[5], "Led 5 (tile 1)");
        for c in &layout.led_coordinates {
            assert!(c[0] > -1e-9 && c[0] < 30.0 + 1e-9);
            assert!(c[1] > -1e-9 && c[1] < 10.0 + 1e-9);
        }

        let centered = LedLayout::centered("Desk", &tiling, &leds, 30.0);
        assert_eq!(centered.display_name, "Desk centered");
        // First routed tile is the rightmost one.
        assert_relative_eq!(centered.led_coordinates[0][0], 25.0, epsilon = 1e-9);
        assert_relative_eq!(centered.led_coordinates[0][1], 5.0, epsilon = 1e-9);
    }
}
