//! Quantization of unit-square points into hierarchical cells and back.

use crate::config::SpatialGrid;
use crate::hilbert::{d2xy, xy2d};
use crate::projection::{project, unproject};
use crate::types::{Point2D, SpatialCell, SpatialPoint};

fn quantize(v: f64, g: u32) -> u32 {
    let h = (v * g as f64).floor();
    if !(h >= 0.0) {
        0
    } else if h >= (g - 1) as f64 {
        g - 1
    } else {
        h as u32
    }
}

/// Leaf cell of a unit-square point.
///
/// Each level multiplies the remaining fraction by its grid size, takes the
/// integer part as the level's `(x, y)` and stores its Hilbert distance as the
/// digit. Coordinates outside `[0,1)` clamp to the border cells.
pub fn globe_to_cell(p: &Point2D, grid: &SpatialGrid) -> SpatialCell {
    let mut digits = [0u8; 4];
    let (mut x, mut y) = (p.x, p.y);
    for (i, digit) in digits.iter_mut().enumerate() {
        let g = grid.size(i);
        let hx = quantize(x, g);
        let hy = quantize(y, g);
        x = g as f64 * x - hx as f64;
        y = g as f64 * y - hy as f64;
        *digit = xy2d(g, hx, hy) as u8;
    }
    SpatialCell::from_code(u32::from_be_bytes(digits))
}

/// Leaf cell of a globe position.
///
/// # Examples
///
/// ```
/// use geocell::addressing::{cell_to_spatial, make_cell};
/// use geocell::{SpatialGrid, SpatialPoint};
///
/// let grid = SpatialGrid::default();
/// let p = SpatialPoint::new(48.8566, 2.3522);
/// let cell = make_cell(&p, &grid);
/// assert!(cell.is_leaf());
///
/// // The leaf corner is a few hundred meters away at most.
/// let corner = cell_to_spatial(&cell, &grid);
/// assert!((corner.latitude - p.latitude).abs() < 0.01);
/// ```
pub fn make_cell(p: &SpatialPoint, grid: &SpatialGrid) -> SpatialCell {
    globe_to_cell(&project(p), grid)
}

/// Integer leaf pixel holding a unit-square point, clamped into the grid.
pub fn point_to_pixel(p: &Point2D, grid: &SpatialGrid) -> (u32, u32) {
    let max_id = grid.max_id();
    (quantize(p.x, max_id), quantize(p.y, max_id))
}

/// Leaf cell of an integer pixel, `x, y < grid.max_id()`.
pub fn make_cell_xy(x: u32, y: u32, grid: &SpatialGrid) -> SpatialCell {
    debug_assert!(x < grid.max_id() && y < grid.max_id());
    let mut digits = [0u8; 4];
    for (i, digit) in digits.iter_mut().enumerate() {
        let g = grid.size(i);
        let block = grid.block(i);
        *digit = xy2d(g, (x / block) % g, (y / block) % g) as u8;
    }
    SpatialCell::from_code(u32::from_be_bytes(digits))
}

/// Lower-left leaf pixel of a cell.
pub fn cell_to_pixel(cell: &SpatialCell, grid: &SpatialGrid) -> (u32, u32) {
    let (mut x, mut y) = (0, 0);
    for i in 0..cell.depth() as usize {
        let (dx, dy) = d2xy(grid.size(i), cell.digit(i) as u32);
        x += dx * grid.block(i);
        y += dy * grid.block(i);
    }
    (x, y)
}

/// Side of a cell of the given depth, in leaf pixels.
pub fn cell_width(depth: u8, grid: &SpatialGrid) -> u32 {
    debug_assert!((1..=SpatialCell::SIZE).contains(&depth));
    grid.block(depth as usize - 1)
}

/// Lower-left corner of a cell on the unit square.
pub fn cell_to_point(cell: &SpatialCell, grid: &SpatialGrid) -> Point2D {
    let (x, y) = cell_to_pixel(cell, grid);
    let max_id = grid.max_id() as f64;
    Point2D::new(x as f64 / max_id, y as f64 / max_id)
}

/// Center of a cell on the unit square.
pub fn cell_center(cell: &SpatialCell, grid: &SpatialGrid) -> Point2D {
    let (x, y) = cell_to_pixel(cell, grid);
    let half = cell_width(cell.depth(), grid) as f64 / 2.0;
    let max_id = grid.max_id() as f64;
    Point2D::new((x as f64 + half) / max_id, (y as f64 + half) / max_id)
}

/// Globe position of a cell's lower-left corner.
pub fn cell_to_spatial(cell: &SpatialCell, grid: &SpatialGrid) -> SpatialPoint {
    unproject(&cell_to_point(cell, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSize;

    #[test]
    fn test_corners_of_square() {
        let grid = SpatialGrid::default();
        assert_eq!(globe_to_cell(&Point2D::new(0.0, 0.0), &grid), SpatialCell::min());
        // Hilbert curve ends at the lower-right corner.
        assert_eq!(globe_to_cell(&Point2D::new(1.0, 0.0), &grid), SpatialCell::max());
        let top_left = globe_to_cell(&Point2D::new(0.0, 1.0), &grid);
        assert_eq!(top_left.digit(0), xy2d(16, 0, 15) as u8);
    }

    #[test]
    fn test_float_and_pixel_paths_agree() {
        let grid = SpatialGrid::default();
        for (x, y) in [(0.1, 0.2), (0.5, 0.75), (0.999, 0.001), (0.3333, 0.6666)] {
            let p = Point2D::new(x, y);
            let (px, py) = point_to_pixel(&p, &grid);
            assert_eq!(globe_to_cell(&p, &grid), make_cell_xy(px, py, &grid));
            assert_eq!(cell_to_pixel(&make_cell_xy(px, py, &grid), &grid), (px, py));
        }
    }

    #[test]
    fn test_cell_to_point_within_leaf() {
        let grid = SpatialGrid::default();
        let leaf = 1.0 / grid.max_id() as f64;
        let p = Point2D::new(0.123_456, 0.654_321);
        let c = cell_to_point(&globe_to_cell(&p, &grid), &grid);
        assert!(c.x <= p.x && p.x - c.x < leaf);
        assert!(c.y <= p.y && p.y - c.y < leaf);
    }

    #[test]
    fn test_coarse_cell_geometry() {
        let grid = SpatialGrid::default();
        let leaf = make_cell_xy(5000, 40000, &grid);
        let coarse = leaf.with_depth(2).unwrap();
        assert_eq!(cell_width(2, &grid), 256);
        let (x, y) = cell_to_pixel(&coarse, &grid);
        assert_eq!((x, y), (5000 / 256 * 256, 40000 / 256 * 256));
        let center = cell_center(&coarse, &grid);
        assert!((center.x - (x as f64 + 128.0) / 65536.0).abs() < 1e-15);
    }

    #[test]
    fn test_mixed_grid() {
        let grid = SpatialGrid::new([GridSize::Low, GridSize::Medium, GridSize::High, GridSize::Low]);
        let max_id = grid.max_id();
        for (x, y) in [(0, 0), (max_id - 1, 0), (100, 1000), (max_id - 1, max_id - 1)] {
            let cell = make_cell_xy(x, y, &grid);
            assert!(cell.digit(0) < 16);
            assert!(cell.digit(1) < 64);
            assert!(cell.digit(3) < 16);
            assert_eq!(cell_to_pixel(&cell, &grid), (x, y));
        }
    }

    #[test]
    fn test_make_cell_round_trip() {
        let grid = SpatialGrid::default();
        let p = SpatialPoint::new(-33.8688, 151.2093);
        let cell = make_cell(&p, &grid);
        let back = cell_to_spatial(&cell, &grid);
        assert!((back.latitude - p.latitude).abs() < 0.01);
        assert!((back.longitude - p.longitude).abs() < 0.01);
    }
}
