//! Tilings: sets of occupied grid cells and their adjacency graph.
//!
//! A [`Tiling`] is immutable. Adjacency is derived once at construction from
//! the junction outlines (two tiles are adjacent iff they share a junction
//! edge within tolerance) and stored as a symmetric neighbour list.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{Error, Result};
use crate::geometry::{points_coincide, segments_coincide, Point2, AABB2D};
use crate::tile::{Tile, TileSpec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `(row, col)` position on the design lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for GridCell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Number of printed walls needed to frame a tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallCount {
    /// Walls on the border of the design.
    pub outer: usize,
    /// Walls shared by two adjacent tiles.
    pub inner: usize,
}

/// Unique junction points of a tiling.
///
/// Corners of neighbouring tiles that meet at the same junction point map to
/// the same index.
#[derive(Debug, Clone)]
pub struct Junctions {
    points: Vec<Point2>,
    corners: Vec<Vec<usize>>,
}

impl Junctions {
    /// Coordinates of every junction point.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Junction index of corner `vertex` of tile `tile`.
    pub fn corner(&self, tile: usize, vertex: usize) -> usize {
        self.corners[tile][vertex]
    }

    /// Junction indices of all corners of a tile.
    pub fn tile_corners(&self, tile: usize) -> &[usize] {
        &self.corners[tile]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// An immutable set of tiles placed on a `rows × cols` lattice.
#[derive(Debug, Clone)]
pub struct Tiling {
    spec: TileSpec,
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    index: HashMap<GridCell, usize>,
    neighbors: Vec<Vec<usize>>,
}

impl Tiling {
    /// Builds a tiling from the occupied cells, in the given order.
    ///
    /// Fails if the tile geometry is invalid, if the set is empty, or if a cell is
    /// outside the lattice or repeated.
    pub fn new<I>(spec: TileSpec, rows: usize, cols: usize, cells: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<GridCell>,
    {
        spec.validate()?;

        let mut tiles = Vec::new();
        let mut index = HashMap::new();
        for cell in cells.into_iter().map(Into::into) {
            if cell.row >= rows || cell.col >= cols {
                return Err(Error::InvalidTiling(format!(
                    "cell ({}, {}) is outside the {}x{} lattice",
                    cell.row, cell.col, rows, cols
                )));
            }
            if index.insert(cell, tiles.len()).is_some() {
                return Err(Error::InvalidTiling(format!(
                    "cell ({}, {}) appears more than once",
                    cell.row, cell.col
                )));
            }
            tiles.push(spec.tile(cell.row, cell.col));
        }

        if tiles.is_empty() {
            return Err(Error::InvalidTiling("the tiling has no tiles".into()));
        }

        let neighbors = compute_adjacency(&spec, &tiles);
        let tiling = Self {
            spec,
            rows,
            cols,
            tiles,
            index,
            neighbors,
        };
        debug!(
            "Built {} tiling with {} tiles and {} adjacent pairs",
            spec.shape,
            tiling.len(),
            tiling.adjacent_pairs().count()
        );
        Ok(tiling)
    }

    /// Builds a tiling with every cell of the lattice occupied, row by row.
    pub fn full(spec: TileSpec, rows: usize, cols: usize) -> Result<Self> {
        let cells = (0..rows).flat_map(|row| (0..cols).map(move |col| GridCell::new(row, col)));
        Self::new(spec, rows, cols, cells)
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false: construction rejects empty tilings.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    /// Grid cells in tile order.
    pub fn cells(&self) -> Vec<GridCell> {
        self.tiles
            .iter()
            .map(|t| GridCell::new(t.row(), t.col()))
            .collect()
    }

    /// Index of the tile on `cell`, if occupied.
    pub fn index_of(&self, cell: GridCell) -> Option<usize> {
        self.index.get(&cell).copied()
    }

    /// Tiles sharing an edge with `tile`, in ascending index order.
    pub fn neighbors(&self, tile: usize) -> &[usize] {
        &self.neighbors[tile]
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Every adjacent pair once, as `(a, b)` with `a < b`.
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(a, ns)| ns.iter().filter(move |&&b| b > a).map(move |&b| (a, b)))
    }

    /// Panel corners of `tile` in absolute coordinates, counter-clockwise.
    pub fn vertices(&self, tile: usize) -> Vec<Point2> {
        self.tiles[tile].outline()
    }

    /// Panel perimeter of `tile`.
    pub fn perimeter(&self, tile: usize) -> f64 {
        self.tiles[tile].perimeter(0.0)
    }

    /// Number of corners shared by every tile.
    pub fn vertices_per_tile(&self) -> usize {
        self.spec.shape.vertex_count()
    }

    /// Bounding box of all tiles at the given border fraction.
    pub fn bounding_box(&self, border: f64) -> AABB2D {
        let mut boxes = self.tiles.iter().map(|t| t.aabb(border));
        let first = boxes
            .next()
            .unwrap_or_else(|| AABB2D::new(0.0, 0.0, 0.0, 0.0));
        boxes.fold(first, |acc, b| acc.union(&b))
    }

    /// Printed walls needed to frame the design.
    pub fn walls(&self) -> WallCount {
        let inner = self.adjacent_pairs().count();
        let total = self.len() * self.vertices_per_tile();
        WallCount {
            outer: total - 2 * inner,
            inner,
        }
    }

    /// Unique junction points and the corner-to-junction map.
    pub fn junctions(&self) -> Junctions {
        let tolerance = self.spec.tolerance();
        let bucket = self.spec.side_length / 4.0;
        let key = |p: Point2| ((p.0 / bucket).floor() as i64, (p.1 / bucket).floor() as i64);

        let mut points: Vec<Point2> = Vec::new();
        let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        let mut corners = Vec::with_capacity(self.len());

        for tile in &self.tiles {
            let mut tile_corners = Vec::with_capacity(tile.vertex_count());
            for p in tile.junction_outline() {
                let (kx, ky) = key(p);
                let existing = (kx - 1..=kx + 1)
                    .flat_map(|x| (ky - 1..=ky + 1).map(move |y| (x, y)))
                    .filter_map(|k| buckets.get(&k))
                    .flatten()
                    .copied()
                    .find(|&j| points_coincide(points[j], p, tolerance));
                let id = match existing {
                    Some(j) => j,
                    None => {
                        points.push(p);
                        buckets.entry((kx, ky)).or_default().push(points.len() - 1);
                        points.len() - 1
                    }
                };
                tile_corners.push(id);
            }
            corners.push(tile_corners);
        }

        Junctions { points, corners }
    }
}

fn compute_adjacency(spec: &TileSpec, tiles: &[Tile]) -> Vec<Vec<usize>> {
    let tolerance = spec.tolerance();
    let reach = 2.0 * spec.circumradius(0.5) + tolerance;
    let outlines: Vec<Vec<Point2>> = tiles.iter().map(|t| t.junction_outline()).collect();

    let mut neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); tiles.len()];
    for i in 0..tiles.len() {
        for j in (i + 1)..tiles.len() {
            let (ci, cj) = (tiles[i].center(), tiles[j].center());
            if (ci.0 - cj.0).abs() > reach || (ci.1 - cj.1).abs() > reach {
                continue;
            }
            if share_edge(&outlines[i], &outlines[j], tolerance) {
                neighbors[i].insert(j);
                neighbors[j].insert(i);
            }
        }
    }

    neighbors
        .into_iter()
        .map(|set| {
            let mut list: Vec<usize> = set.into_iter().collect();
            list.sort_unstable();
            list
        })
        .collect()
}

fn share_edge(a: &[Point2], b: &[Point2], tolerance: f64) -> bool {
    let (na, nb) = (a.len(), b.len());
    (0..na).any(|i| {
        (0..nb).any(|j| {
            segments_coincide(a[i], a[(i + 1) % na], b[j], b[(j + 1) % nb], tolerance)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileShape;

    fn spec(shape: TileShape, variant: usize) -> TileSpec {
        TileSpec::new(shape, variant, 0.1, 0.005).unwrap()
    }

    #[test]
    fn test_rectangle_grid_adjacency() {
        let tiling = Tiling::full(spec(TileShape::Rectangle, 0), 3, 3).unwrap();
        assert_eq!(tiling.len(), 9);
        assert_eq!(tiling.adjacent_pairs().count(), 12);
        // Center tile touches four others, corners touch two.
        assert_eq!(tiling.neighbors(4), &[1, 3, 5, 7]);
        assert_eq!(tiling.neighbors(0), &[1, 3]);
        // Diagonal tiles only share a corner.
        assert!(!tiling.are_adjacent(0, 4));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for shape in TileShape::ALL {
            for &variant in shape.variants() {
                let tiling = Tiling::full(spec(shape, variant), 4, 5).unwrap();
                for a in 0..tiling.len() {
                    for &b in tiling.neighbors(a) {
                        assert!(tiling.are_adjacent(b, a), "{} v{}", shape, variant);
                        assert_ne!(a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn test_hexagon_interior_has_six_neighbours() {
        let tiling = Tiling::full(spec(TileShape::Hexagon, 0), 5, 5).unwrap();
        let center = tiling.index_of(GridCell::new(2, 2)).unwrap();
        assert_eq!(tiling.neighbors(center).len(), 6);
    }

    #[test]
    fn test_triangle_interior_has_three_neighbours() {
        let tiling = Tiling::full(spec(TileShape::Triangle, 0), 4, 6).unwrap();
        let center = tiling.index_of(GridCell::new(1, 2)).unwrap();
        assert_eq!(tiling.neighbors(center).len(), 3);
    }

    #[test]
    fn test_octagon_variants() {
        let square = Tiling::full(spec(TileShape::Octagon, 0), 3, 3).unwrap();
        assert_eq!(square.adjacent_pairs().count(), 12);
        let diagonal = Tiling::full(spec(TileShape::Octagon, 1), 3, 3).unwrap();
        let center = diagonal.index_of(GridCell::new(1, 1)).unwrap();
        assert_eq!(diagonal.neighbors(center).len(), 4);
    }

    #[test]
    fn test_invalid_cells() {
        let s = spec(TileShape::Rectangle, 0);
        assert!(matches!(
            Tiling::new(s, 2, 2, [(0, 0), (2, 0)]),
            Err(Error::InvalidTiling(_))
        ));
        assert!(matches!(
            Tiling::new(s, 2, 2, [(0, 0), (0, 0)]),
            Err(Error::InvalidTiling(_))
        ));
        assert!(matches!(
            Tiling::new(s, 2, 2, Vec::<GridCell>::new()),
            Err(Error::InvalidTiling(_))
        ));
    }

    #[test]
    fn test_walls() {
        let tiling = Tiling::full(spec(TileShape::Rectangle, 0), 2, 2).unwrap();
        let walls = tiling.walls();
        assert_eq!(walls.inner, 4);
        assert_eq!(walls.outer, 8);
    }

    #[test]
    fn test_junctions_shared_between_neighbours() {
        let tiling = Tiling::full(spec(TileShape::Rectangle, 0), 3, 3).unwrap();
        let junctions = tiling.junctions();
        assert_eq!(junctions.len(), 16);
        // Top-right corner of tile 0 is the top-left corner of tile 1.
        assert_eq!(junctions.corner(0, 0), junctions.corner(1, 1));
        let hexes = Tiling::full(spec(TileShape::Hexagon, 0), 3, 3).unwrap();
        let hj = hexes.junctions();
        assert!(hj.len() < hexes.len() * 6);
    }
}
