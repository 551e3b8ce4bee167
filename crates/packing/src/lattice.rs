//! Lattice layouts: tile faces cut in their own tessellation.
//!
//! Regular tiles pack best the way they tile the plane. The lattice of a tile
//! family is laid over the usable region with the kerf as spacing, and every
//! slot fully inside the region becomes a cut position.

use std::cmp::Ordering;
use std::f64::consts::TAU;

use lumatile_core::geometry::translate;
use lumatile_core::{Point2, Result, TileSpec, AABB2D};

/// A cut position produced by a lattice.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub center: Point2,
    /// Angle of the first corner, in radians.
    pub orientation: f64,
    pub outline: Vec<Point2>,
    pub aabb: AABB2D,
}

/// Slots of one lattice variant inside a region.
#[derive(Debug, Clone)]
pub(crate) struct LatticeFill {
    pub variant: usize,
    pub slots: Vec<Slot>,
}

impl LatticeFill {
    /// Bounding box of the used slots.
    pub fn extent(&self) -> Option<AABB2D> {
        self.slots
            .iter()
            .map(|s| s.aabb)
            .reduce(|a, b| a.union(&b))
    }

    /// Highest point reached by the used slots.
    pub fn length(&self) -> f64 {
        self.extent().map_or(0.0, |e| e.max_y)
    }
}

/// Fills `region` with the lattice of `spec`'s shape and `variant`, keeping
/// at most `limit` slots, lowest first.
///
/// An unbounded region (infinite `max_y`) is cut off once `limit` slots are
/// certainly available.
pub(crate) fn fill(
    spec: &TileSpec,
    variant: usize,
    spacing: f64,
    region: &AABB2D,
    limit: usize,
) -> Result<LatticeFill> {
    let lattice = TileSpec::new(spec.shape, variant, spec.side_length, spacing)?;
    let tolerance = lattice.tolerance();
    let pitch = 2.0 * lattice.circumradius(0.0) + spacing;

    let mut bounded = *region;
    if !bounded.max_y.is_finite() {
        let per_line = ((region.width() + spacing) / pitch).floor().max(1.0);
        let lines = 2.0 * (limit as f64 / per_line).ceil() + 2.0;
        bounded.max_y = region.min_y + lines * pitch;
    }

    // Align the lattice's lower-left extent with the region corner.
    let base = [(0, 0), (0, 1), (1, 0), (1, 1)]
        .iter()
        .map(|&(r, c)| lattice.tile(r, c).aabb(0.0))
        .reduce(|a, b| a.union(&b))
        .unwrap_or(AABB2D::new(0.0, 0.0, 0.0, 0.0));
    let dx = region.min_x - base.min_x;
    let dy = region.min_y - base.min_y;

    let beyond = |aabb: &AABB2D| {
        aabb.min_x > bounded.max_x + tolerance || aabb.min_y > bounded.max_y + tolerance
    };

    let mut slots = Vec::new();
    for row in 0.. {
        let mut row_in_region = false;
        // Even columns, then odd columns.
        for parity in 0..2 {
            let mut col = parity;
            loop {
                let tile = lattice.tile(row, col);
                let outline = translate(&tile.outline(), dx, dy);
                let aabb = match AABB2D::from_points(&outline) {
                    Some(b) => b,
                    None => break,
                };
                if beyond(&aabb) {
                    break;
                }
                row_in_region = true;
                if bounded.contains(&aabb, tolerance) {
                    let center = tile.center();
                    slots.push(Slot {
                        center: (center.0 + dx, center.1 + dy),
                        orientation: tile.orientation(),
                        outline,
                        aabb,
                    });
                }
                col += 2;
            }
        }
        if !row_in_region {
            break;
        }
    }

    slots.sort_by(|a, b| {
        a.aabb
            .max_y
            .partial_cmp(&b.aabb.max_y)
            .unwrap_or(Ordering::Equal)
            .then(a.aabb.min_x.partial_cmp(&b.aabb.min_x).unwrap_or(Ordering::Equal))
    });
    slots.truncate(limit);

    Ok(LatticeFill { variant, slots })
}

/// Rotation taking a tile with first corner at `from` onto one at `to`.
pub(crate) fn relative_rotation(from: f64, to: f64) -> f64 {
    let r = (to - from).rem_euclid(TAU);
    if (TAU - r).abs() < 1e-12 {
        0.0
    } else {
        r
    }
}
