//! Tile shapes and placed tiles.
//!
//! Every supported tile is a regular polygon laid out on a `(row, col)`
//! lattice. A [`TileSpec`] fixes the shape family, its lattice variant, the
//! side length of the panel and the spacing left between neighbouring panels.
//! Placing a spec on a grid cell yields a [`Tile`].
//!
//! # Borders
//!
//! Outlines are parameterized by a `border` fraction of the spacing:
//!
//! - `0.0`: the panel itself;
//! - `0.5`: the junction outline, halfway into the spacing. Junction outlines
//!   of neighbouring tiles share edges and corners exactly;
//! - `1.0`: the panel plus the full spacing;
//! - negative values shrink the panel (used to inset LED positions).

use std::f64::consts::{FRAC_PI_6, FRAC_PI_8, PI, SQRT_2, TAU};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::{
    polygon_area, polygon_perimeter, sample_closed_ring, Point2, AABB2D, COORD_EPSILON,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Family of regular polygons a mosaic can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TileShape {
    Triangle,
    Rectangle,
    Hexagon,
    Octagon,
}

impl TileShape {
    /// All shape families.
    pub const ALL: [TileShape; 4] = [
        TileShape::Triangle,
        TileShape::Rectangle,
        TileShape::Hexagon,
        TileShape::Octagon,
    ];

    /// Parses a shape name (case-insensitive). `"square"` is accepted as an
    /// alias of `"rectangle"`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "triangle" => Ok(TileShape::Triangle),
            "rectangle" | "square" => Ok(TileShape::Rectangle),
            "hexagon" => Ok(TileShape::Hexagon),
            "octagon" => Ok(TileShape::Octagon),
            other => Err(Error::InvalidShape(format!(
                "unknown tile kind '{}' (expected one of: triangle, rectangle, hexagon, octagon)",
                other
            ))),
        }
    }

    /// Lowercase name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            TileShape::Triangle => "triangle",
            TileShape::Rectangle => "rectangle",
            TileShape::Hexagon => "hexagon",
            TileShape::Octagon => "octagon",
        }
    }

    /// Lattice variants available for this shape.
    pub fn variants(&self) -> &'static [usize] {
        match self {
            TileShape::Rectangle => &[0],
            TileShape::Triangle | TileShape::Hexagon | TileShape::Octagon => &[0, 1],
        }
    }

    /// Number of corners (and walls) of one tile.
    pub fn vertex_count(&self) -> usize {
        match self {
            TileShape::Triangle => 3,
            TileShape::Rectangle => 4,
            TileShape::Hexagon => 6,
            TileShape::Octagon => 8,
        }
    }
}

impl fmt::Display for TileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TileShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Shape, lattice variant and dimensions shared by all tiles of a design.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileSpec {
    /// Shape family.
    pub shape: TileShape,
    /// Lattice variant, see [`TileShape::variants`].
    pub variant: usize,
    /// Side length of one panel.
    pub side_length: f64,
    /// Gap between neighbouring panels.
    pub spacing: f64,
}

impl TileSpec {
    /// Creates a validated tile spec.
    pub fn new(shape: TileShape, variant: usize, side_length: f64, spacing: f64) -> Result<Self> {
        let spec = Self {
            shape,
            variant,
            side_length,
            spacing,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks variant and dimensions.
    pub fn validate(&self) -> Result<()> {
        if !self.shape.variants().contains(&self.variant) {
            return Err(Error::InvalidShape(format!(
                "{} has no variant {} (available: {:?})",
                self.shape,
                self.variant,
                self.shape.variants()
            )));
        }
        if !(self.side_length.is_finite() && self.side_length > 0.0) {
            return Err(Error::InvalidShape(format!(
                "side length must be positive, got {}",
                self.side_length
            )));
        }
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(Error::InvalidShape(format!(
                "spacing must be non-negative, got {}",
                self.spacing
            )));
        }
        Ok(())
    }

    /// Same spec with another lattice variant.
    pub fn with_variant(self, variant: usize) -> Result<Self> {
        Self::new(self.shape, variant, self.side_length, self.spacing)
    }

    /// Same spec with another spacing (clamped to be non-negative).
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing.max(0.0);
        self
    }

    /// Places this spec on a grid cell.
    pub fn tile(&self, row: usize, col: usize) -> Tile {
        Tile::new(*self, row, col)
    }

    /// Center of the tile on `(row, col)`.
    pub fn center(&self, row: usize, col: usize) -> Point2 {
        let s = self.side_length;
        let p = self.spacing;
        let (r, c) = (row as f64, col as f64);
        match self.shape {
            TileShape::Rectangle => ((s + p) * c + p + s / 2.0, (s + p) * r + p + s / 2.0),
            TileShape::Hexagon => {
                let (r, c, odd) = self.swapped(row, col);
                let x = c * (3.0 * s + SQRT_3 * p) / 2.0 + s + p * 2.0 / SQRT_3;
                let shift = if odd { 0.5 } else { 0.0 };
                let y = (r + shift) * (SQRT_3 * s + p) + s * SQRT_3 / 2.0 + p;
                self.unswap(x, y)
            }
            TileShape::Triangle => {
                let (r, c, _) = self.swapped(row, col);
                let parity = ((row + col) % 2) as f64;
                let d = p + s / SQRT_3;
                let x = c * (s + SQRT_3 * p) / 2.0 + s / 2.0 + p * 2.0 / SQRT_3;
                let y = (3.0 * r + parity) * d / 2.0 + s * SQRT_3 / 6.0 + p;
                self.unswap(x, y)
            }
            TileShape::Octagon => {
                let size = (1.0 + SQRT_2) * s;
                if self.variant == 0 {
                    ((size + p) * c + p + size / 2.0, (size + p) * r + p + size / 2.0)
                } else {
                    let dist = (size + p) / SQRT_2;
                    let shift = if col % 2 == 0 { dist } else { 0.0 };
                    (c * dist, r * 2.0 * dist + shift)
                }
            }
        }
    }

    /// Lattice coordinates as `(row, col, column_is_odd)`, with row and
    /// column exchanged for variant 1 of the staggered families.
    fn swapped(&self, row: usize, col: usize) -> (f64, f64, bool) {
        if self.variant == 1 {
            (col as f64, row as f64, row % 2 == 1)
        } else {
            (row as f64, col as f64, col % 2 == 1)
        }
    }

    fn unswap(&self, x: f64, y: f64) -> Point2 {
        if self.variant == 1 {
            (y, x)
        } else {
            (x, y)
        }
    }

    /// Distance from the center to each corner at the given border.
    pub fn circumradius(&self, border: f64) -> f64 {
        let s = self.side_length;
        let p = self.spacing;
        match self.shape {
            TileShape::Rectangle => SQRT_2 * (s / 2.0 + border * p),
            TileShape::Hexagon => s + border * p * 2.0 / SQRT_3,
            TileShape::Triangle => s / SQRT_3 + border * 2.0 * p,
            TileShape::Octagon => {
                let r = s * (1.0 + 1.0 / SQRT_2).sqrt();
                r + border * r * 2.0 * p / ((1.0 + SQRT_2) * s)
            }
        }
    }

    /// Angle of the first corner of the tile on `(row, col)`, in radians.
    pub fn orientation(&self, row: usize, col: usize) -> f64 {
        let variant = self.variant as f64;
        match self.shape {
            TileShape::Rectangle => PI / 4.0,
            TileShape::Hexagon => variant * FRAC_PI_6,
            TileShape::Triangle => {
                let flip = ((row + col) % 2) as f64 * PI;
                -(1.0 - variant) * FRAC_PI_6 + flip
            }
            TileShape::Octagon => FRAC_PI_8,
        }
    }

    /// Area of a single panel.
    pub fn panel_area(&self) -> f64 {
        polygon_area(&self.tile(0, 0).outline())
    }

    /// Perimeter of a single panel.
    pub fn panel_perimeter(&self) -> f64 {
        polygon_perimeter(&self.tile(0, 0).outline())
    }

    /// Tolerance for coordinate comparisons at this scale.
    pub fn tolerance(&self) -> f64 {
        (self.side_length * 1e-6).max(COORD_EPSILON)
    }

    /// Angle between two corners of the junction between walls, in degrees.
    pub fn junction_angle(&self) -> f64 {
        180.0 / self.shape.vertex_count() as f64
    }
}

/// A tile placed on a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    spec: TileSpec,
    row: usize,
    col: usize,
    center: Point2,
}

impl Tile {
    /// Places `spec` on `(row, col)`.
    pub fn new(spec: TileSpec, row: usize, col: usize) -> Self {
        Self {
            spec,
            row,
            col,
            center: spec.center(row, col),
        }
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    /// Number of corners.
    pub fn vertex_count(&self) -> usize {
        self.spec.shape.vertex_count()
    }

    /// Corners in counter-clockwise order at the given border fraction.
    pub fn vertices(&self, border: f64) -> Vec<Point2> {
        let n = self.vertex_count();
        let radius = self.spec.circumradius(border);
        let offset = self.orientation();
        (0..n)
            .map(|k| {
                let angle = offset + TAU * k as f64 / n as f64;
                (
                    self.center.0 + radius * angle.cos(),
                    self.center.1 + radius * angle.sin(),
                )
            })
            .collect()
    }

    /// Outline of the panel itself.
    pub fn outline(&self) -> Vec<Point2> {
        self.vertices(0.0)
    }

    /// Outline halfway into the spacing, shared exactly with neighbours.
    pub fn junction_outline(&self) -> Vec<Point2> {
        self.vertices(0.5)
    }

    /// Angle of the first corner, in radians.
    pub fn orientation(&self) -> f64 {
        self.spec.orientation(self.row, self.col)
    }

    /// Perimeter at the given border fraction.
    pub fn perimeter(&self, border: f64) -> f64 {
        polygon_perimeter(&self.vertices(border))
    }

    /// Panel area.
    pub fn area(&self) -> f64 {
        polygon_area(&self.outline())
    }

    /// Bounding box at the given border fraction.
    pub fn aabb(&self, border: f64) -> AABB2D {
        let r = self.spec.circumradius(border);
        AABB2D::from_points(&self.vertices(border)).unwrap_or_else(|| {
            AABB2D::new(
                self.center.0 - r,
                self.center.1 - r,
                self.center.0 + r,
                self.center.1 + r,
            )
        })
    }

    /// Returns true if the point lies inside the panel (border excluded).
    pub fn contains(&self, point: Point2) -> bool {
        let verts = self.outline();
        let n = verts.len();
        (0..n).all(|i| {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            (b.0 - a.0) * (point.1 - a.1) - (b.1 - a.1) * (point.0 - a.0) >= -COORD_EPSILON
        })
    }

    /// Returns true if the outline at `border` lies inside `region`.
    pub fn within(&self, region: &AABB2D, border: f64, tolerance: f64) -> bool {
        region.contains(&self.aabb(border), tolerance)
    }

    /// Evenly spaced points along the perimeter, starting right after
    /// `first_corner` and proceeding counter-clockwise.
    pub fn sample_perimeter(&self, samples: usize, first_corner: usize, border: f64) -> Vec<Point2> {
        let mut verts = self.vertices(border);
        if !verts.is_empty() {
            let shift = first_corner % verts.len();
            verts.rotate_left(shift);
        }
        sample_closed_ring(&verts, samples)
    }

    /// Direction from the center to the given corner, in radians.
    pub fn corner_angle(&self, corner: usize) -> f64 {
        let n = self.vertex_count();
        self.orientation() + TAU * (corner % n) as f64 / n as f64
    }

    /// Returns true if the tile points "down" in a triangle lattice.
    pub fn is_flipped(&self) -> bool {
        self.spec.shape == TileShape::Triangle && (self.row + self.col) % 2 == 1
    }
}
