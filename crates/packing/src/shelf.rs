//! Shelf packing of tile bounding boxes.
//!
//! Pieces are sorted by footprint, largest first, and placed left to right
//! on horizontal shelves. A piece goes into the first open shelf with room
//! (first fit over sheets, then shelves, then orientations), otherwise onto
//! a new shelf of the first sheet with enough height left, otherwise onto a
//! new sheet.

use std::cmp::Ordering;
use std::f64::consts::FRAC_PI_2;

use log::trace;

use lumatile_core::geometry::{rotate_about, translate};
use lumatile_core::{Point2, AABB2D};

use crate::packer::Piece;
use crate::result::{SheetLayout, TilePlacement};

/// A piece turned to one of its allowed orientations.
#[derive(Debug, Clone)]
struct Orientation {
    rotation: f64,
    /// Outline relative to the piece center.
    outline: Vec<Point2>,
    min: Point2,
    width: f64,
    height: f64,
}

impl Orientation {
    fn new(outline: &[Point2], rotation: f64) -> Self {
        let outline = if rotation == 0.0 {
            outline.to_vec()
        } else {
            rotate_about(outline, (0.0, 0.0), rotation)
        };
        let aabb = AABB2D::from_points(&outline).unwrap_or(AABB2D::new(0.0, 0.0, 0.0, 0.0));
        Self {
            rotation,
            outline,
            min: (aabb.min_x, aabb.min_y),
            width: aabb.width(),
            height: aabb.height(),
        }
    }
}

#[derive(Debug)]
struct Shelf {
    y: f64,
    height: f64,
    cursor: f64,
}

#[derive(Debug, Default)]
struct OpenSheet {
    shelves: Vec<Shelf>,
    next_y: f64,
    placements: Vec<TilePlacement>,
}

/// Shelf packer over a usable region of each sheet.
pub(crate) struct ShelfPacker<'a> {
    region: &'a AABB2D,
    spacing: f64,
    allow_rotation: bool,
    tolerance: f64,
}

impl<'a> ShelfPacker<'a> {
    pub(crate) fn new(region: &'a AABB2D, spacing: f64, allow_rotation: bool, tolerance: f64) -> Self {
        Self {
            region,
            spacing,
            allow_rotation,
            tolerance,
        }
    }

    fn orientations(&self, piece: &Piece) -> Vec<Orientation> {
        let upright = Orientation::new(&piece.outline, 0.0);
        let mut result = vec![upright];
        if self.allow_rotation {
            let turned = Orientation::new(&piece.outline, FRAC_PI_2);
            if (turned.width - result[0].width).abs() > self.tolerance {
                result.push(turned);
            }
        }
        result
    }

    fn fits_empty(&self, o: &Orientation) -> bool {
        o.width <= self.region.width() + self.tolerance
            && o.height <= self.region.height() + self.tolerance
    }

    /// Packs `pieces`, or returns `None` if some piece fits no empty sheet.
    pub(crate) fn pack(&self, pieces: &[Piece]) -> Option<Vec<SheetLayout>> {
        let mut order: Vec<(usize, Vec<Orientation>)> = pieces
            .iter()
            .enumerate()
            .map(|(i, p)| (i, self.orientations(p)))
            .collect();
        if order
            .iter()
            .any(|(_, os)| !os.iter().any(|o| self.fits_empty(o)))
        {
            return None;
        }
        // Stable: equal footprints keep tile order.
        order.sort_by(|a, b| {
            let fa = a.1[0].width * a.1[0].height;
            let fb = b.1[0].width * b.1[0].height;
            fb.partial_cmp(&fa).unwrap_or(Ordering::Equal)
        });

        let mut sheets: Vec<OpenSheet> = Vec::new();
        for (index, orientations) in &order {
            let piece = &pieces[*index];
            if !self.place_on_shelf(&mut sheets, piece, orientations)
                && !self.place_on_new_shelf(&mut sheets, piece, orientations)
            {
                let mut sheet = OpenSheet {
                    next_y: self.region.min_y,
                    ..Default::default()
                };
                // Some orientation fits an empty sheet, checked above.
                if let Some(o) = lowest(orientations.iter().filter(|o| self.fits_empty(o))) {
                    self.open_shelf(&mut sheet, piece, o);
                }
                sheets.push(sheet);
                trace!("Opened sheet {} for tile {}", sheets.len() - 1, piece.tile);
            }
        }

        Some(
            sheets
                .into_iter()
                .enumerate()
                .map(|(index, s)| SheetLayout {
                    index,
                    placements: s.placements,
                })
                .collect(),
        )
    }

    fn place_on_shelf(&self, sheets: &mut [OpenSheet], piece: &Piece, orientations: &[Orientation]) -> bool {
        for sheet in sheets.iter_mut() {
            for s in 0..sheet.shelves.len() {
                let shelf = &sheet.shelves[s];
                let fit = orientations.iter().find(|o| {
                    o.height <= shelf.height + self.tolerance
                        && shelf.cursor + o.width <= self.region.max_x + self.tolerance
                });
                if let Some(o) = fit {
                    let (x, y) = (shelf.cursor, shelf.y);
                    sheet.placements.push(self.placement(piece, o, x, y));
                    sheet.shelves[s].cursor = x + o.width + self.spacing;
                    return true;
                }
            }
        }
        false
    }

    fn place_on_new_shelf(&self, sheets: &mut [OpenSheet], piece: &Piece, orientations: &[Orientation]) -> bool {
        for sheet in sheets.iter_mut() {
            let candidates = orientations.iter().filter(|o| {
                o.width <= self.region.width() + self.tolerance
                    && sheet.next_y + o.height <= self.region.max_y + self.tolerance
            });
            if let Some(o) = lowest(candidates) {
                self.open_shelf(sheet, piece, o);
                return true;
            }
        }
        false
    }

    fn open_shelf(&self, sheet: &mut OpenSheet, piece: &Piece, o: &Orientation) {
        let (x, y) = (self.region.min_x, sheet.next_y);
        sheet.placements.push(self.placement(piece, o, x, y));
        sheet.shelves.push(Shelf {
            y,
            height: o.height,
            cursor: x + o.width + self.spacing,
        });
        sheet.next_y = y + o.height + self.spacing;
    }

    /// Places the bounding box of `o` with its lower-left corner at `(x, y)`.
    fn placement(&self, piece: &Piece, o: &Orientation, x: f64, y: f64) -> TilePlacement {
        let center = (x - o.min.0, y - o.min.1);
        TilePlacement {
            tile: piece.tile,
            position: center,
            rotation: o.rotation,
            outline: translate(&o.outline, center.0, center.1),
        }
    }
}

/// Orientation with the smallest height.
fn lowest<'o>(orientations: impl Iterator<Item = &'o Orientation>) -> Option<&'o Orientation> {
    orientations.min_by(|a, b| a.height.partial_cmp(&b.height).unwrap_or(Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_piece(tile: usize, w: f64, h: f64) -> Piece {
        Piece {
            tile,
            outline: vec![
                (-w / 2.0, -h / 2.0),
                (w / 2.0, -h / 2.0),
                (w / 2.0, h / 2.0),
                (-w / 2.0, h / 2.0),
            ],
            orientation: 0.0,
        }
    }

    #[test]
    fn test_fills_shelves_then_sheets() {
        let region = AABB2D::new(0.0, 0.0, 2.0, 2.0);
        let pieces: Vec<Piece> = (0..5).map(|i| rect_piece(i, 1.0, 1.0)).collect();
        let sheets = ShelfPacker::new(&region, 0.0, true, 1e-9)
            .pack(&pieces)
            .unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].placements.len(), 4);
        assert_eq!(sheets[1].placements.len(), 1);
        assert_eq!(sheets[0].placements[3].position, (1.5, 1.5));
    }

    #[test]
    fn test_rotation_used_when_needed() {
        let region = AABB2D::new(0.0, 0.0, 1.0, 3.0);
        let pieces = vec![rect_piece(0, 2.0, 1.0)];
        let sheets = ShelfPacker::new(&region, 0.0, true, 1e-9)
            .pack(&pieces)
            .unwrap();
        assert_eq!(sheets[0].placements[0].rotation, FRAC_PI_2);

        assert!(ShelfPacker::new(&region, 0.0, false, 1e-9)
            .pack(&pieces)
            .is_none());
    }

    #[test]
    fn test_spacing_between_pieces() {
        let region = AABB2D::new(0.0, 0.0, 2.5, 1.0);
        let pieces: Vec<Piece> = (0..2).map(|i| rect_piece(i, 1.0, 1.0)).collect();
        let sheets = ShelfPacker::new(&region, 0.5, false, 1e-9)
            .pack(&pieces)
            .unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].placements[1].position, (2.0, 0.5));
    }
}
