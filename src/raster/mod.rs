//! Cell coverings of rectangles, circles and projected outlines.
//!
//! A region is tessellated into outlines on the unit square, the outlines
//! are scan-converted into covered leaf pixel spans, and the spans are
//! emitted as the coarsest aligned cells that tile them. Every leaf pixel
//! touched by the region's projected outline is part of the covering.

pub mod emit;
pub mod scan;
pub mod sink;
pub mod tessellate;

use crate::addressing::make_cell;
use crate::config::Config;
use crate::error::{GeocellError, Result};
use crate::projection::Hemisphere;
use crate::types::{Point2D, SpatialPoint, SpatialRect};
use std::ops::ControlFlow;

pub use emit::EmitStats;
pub use scan::ScanTable;
pub use sink::{CellSink, FnSink, LeafSink, SortedBuffer};
pub use tessellate::Piece;

/// Area to cover.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Latitude/longitude box; `min_lon > max_lon` wraps the antimeridian.
    Rect(SpatialRect),
    /// Points within `radius` meters of `center`.
    Circle { center: SpatialPoint, radius: f64 },
    /// Closed ring already on the unit square.
    Outline(Vec<Point2D>),
}

impl Region {
    pub fn circle(center: SpatialPoint, radius: f64) -> Self {
        Region::Circle { center, radius }
    }
}

/// Rows of the leaf grid a piece may touch.
fn row_clip(hemisphere: Option<Hemisphere>, max_id: u32) -> (u32, u32) {
    let half = max_id / 2;
    match hemisphere {
        Some(Hemisphere::North) => (half, max_id - 1),
        Some(Hemisphere::South) => (0, half - 1),
        None => (0, max_id - 1),
    }
}

/// Scan-convert tessellated pieces into one table.
pub fn build_table(pieces: &[Piece], max_id: u32) -> ScanTable {
    let mut table = ScanTable::new(max_id);
    let scale = max_id as f64;
    for piece in pieces {
        match piece {
            Piece::Outline { rings, hemisphere } => {
                let scaled: Vec<Vec<Point2D>> = rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| *p * scale).collect())
                    .collect();
                table.add_outline(&scaled, row_clip(*hemisphere, max_id));
            }
            Piece::Hemisphere(h) => {
                let (first, last) = row_clip(Some(*h), max_id);
                table.add_rows(first, last);
            }
        }
    }
    table
}

/// Tessellate a region; `Ok(None)` when it covers nothing.
fn region_pieces(region: &Region, config: &Config) -> Result<Option<Vec<Piece>>> {
    match region {
        Region::Rect(rc) => {
            if !rc.is_valid() {
                return Err(GeocellError::invalid(format!(
                    "rectangle ({}, {}) - ({}, {}) out of range",
                    rc.min_lat, rc.min_lon, rc.max_lat, rc.max_lon
                )));
            }
            if rc.is_null() {
                return Ok(None);
            }
            Ok(Some(tessellate::rect_pieces(rc, config)))
        }
        Region::Circle { center, radius } => {
            tessellate::circle_pieces(center, *radius, config).map(Some)
        }
        Region::Outline(ring) => {
            if ring.len() < 3 || ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                return Err(GeocellError::invalid(format!(
                    "outline needs at least 3 finite points, got {}",
                    ring.len()
                )));
            }
            Ok(Some(vec![Piece::Outline {
                rings: vec![ring.clone()],
                hemisphere: None,
            }]))
        }
    }
}

/// Feed the cells covering `region` to `sink`, coarse cells first in ascending order.
///
/// A circle with non-positive radius yields the single leaf of its center.
/// The sink's `finish` runs unless the enumeration was stopped.
pub fn cells_covering<S: CellSink + ?Sized>(
    region: &Region,
    config: &Config,
    sink: &mut S,
) -> Result<ControlFlow<()>> {
    if let Region::Circle { center, radius } = region {
        if *radius <= 0.0 {
            if !center.is_valid() {
                return Err(GeocellError::invalid(format!(
                    "circle center ({}, {}) out of range",
                    center.latitude, center.longitude
                )));
            }
            if sink.push(make_cell(center, &config.grid)).is_break() {
                return Ok(ControlFlow::Break(()));
            }
            return Ok(sink.finish());
        }
    }
    let Some(pieces) = region_pieces(region, config)? else {
        return Ok(sink.finish());
    };
    let table = build_table(&pieces, config.grid.max_id());
    let (flow, stats) = emit::emit(&table, &config.grid, sink);
    log::debug!(
        "covering: {} pieces, {} rows, {} spans, {} cells by depth {:?}, {} refined blocks",
        pieces.len(),
        table.row_count(),
        table.span_count(),
        stats.total(),
        stats.cells,
        stats.partial_blocks
    );
    if flow.is_break() {
        return Ok(flow);
    }
    Ok(sink.finish())
}

/// Cells covering a rectangle.
pub fn cell_rect<S: CellSink + ?Sized>(
    rc: &SpatialRect,
    config: &Config,
    sink: &mut S,
) -> Result<ControlFlow<()>> {
    cells_covering(&Region::Rect(*rc), config, sink)
}

/// Cells covering a circle of `radius` meters.
pub fn cell_range<S: CellSink + ?Sized>(
    center: &SpatialPoint,
    radius: f64,
    config: &Config,
    sink: &mut S,
) -> Result<ControlFlow<()>> {
    cells_covering(&Region::circle(*center, radius), config, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IntervalCellSet;
    use crate::sphere::destination;
    use crate::types::SpatialCell;

    fn cover(region: &Region) -> Vec<SpatialCell> {
        let mut out = Vec::new();
        let flow = cells_covering(region, &Config::default(), &mut out).unwrap();
        assert!(flow.is_continue());
        out
    }

    #[test]
    fn test_zero_radius_is_one_leaf() {
        let center = SpatialPoint::new(48.8566, 2.3522);
        let cells = cover(&Region::circle(center, 0.0));
        assert_eq!(cells, vec![make_cell(&center, &Config::default().grid)]);
    }

    #[test]
    fn test_globe_is_top_level_cells() {
        let cells = cover(&Region::Rect(SpatialRect::globe()));
        assert_eq!(cells.len(), 256);
        assert!(cells.iter().all(|c| c.depth() == 1));
        let cells = cover(&Region::circle(SpatialPoint::new(10.0, 10.0), 3.0e7));
        assert_eq!(cells.len(), 256);
    }

    #[test]
    fn test_null_and_invalid_rect() {
        assert!(cover(&Region::Rect(SpatialRect::new(10.0, 10.0, 10.0, 20.0))).is_empty());
        assert!(cover(&Region::Rect(SpatialRect::new(-10.0, 180.0, 10.0, -180.0))).is_empty());
        let mut out: Vec<SpatialCell> = Vec::new();
        let bad = Region::Rect(SpatialRect::new(10.0, 10.0, 95.0, 20.0));
        assert!(matches!(
            cells_covering(&bad, &Config::default(), &mut out),
            Err(GeocellError::InvalidArgument(_))
        ));
        let nan = Region::circle(SpatialPoint::new(0.0, 0.0), f64::NAN);
        assert!(cells_covering(&nan, &Config::default(), &mut out).is_err());
    }

    #[test]
    fn test_rect_covers_its_points() {
        let rc = SpatialRect::new(40.0, -10.0, 50.0, 10.0);
        let cells = cover(&Region::Rect(rc));
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
        let set: IntervalCellSet = cells.iter().copied().collect();
        let grid = Config::default().grid;
        for i in 0..=10 {
            for j in 0..=10 {
                let p = SpatialPoint::new(40.1 + 0.98 * i as f64, -9.9 + 1.98 * j as f64);
                assert!(set.contains(&make_cell(&p, &grid)), "{:?}", p);
            }
        }
        assert!(!set.contains(&make_cell(&SpatialPoint::new(30.0, 0.0), &grid)));
        assert!(!set.contains(&make_cell(&SpatialPoint::new(45.0, 30.0), &grid)));
    }

    #[test]
    fn test_circle_covers_center_and_boundary() {
        let center = SpatialPoint::new(-33.86, 151.2);
        let radius = 50_000.0;
        let mut set = IntervalCellSet::new();
        cells_covering(&Region::circle(center, radius), &Config::default(), &mut set).unwrap();
        let grid = Config::default().grid;
        assert!(set.contains(&make_cell(&center, &grid)));
        for bearing in (0..360).step_by(15) {
            let inside = destination(&center, radius * 0.95, bearing as f64);
            assert!(set.contains(&make_cell(&inside, &grid)), "bearing {}", bearing);
        }
        let far = destination(&center, radius * 1.5, 45.0);
        assert!(!set.contains(&make_cell(&far, &grid)));
    }

    #[test]
    fn test_covering_stops_on_break() {
        let mut seen = 0;
        let mut sink = FnSink(|_: SpatialCell| {
            seen += 1;
            ControlFlow::Break(())
        });
        let rc = SpatialRect::new(0.0, 0.0, 10.0, 10.0);
        let flow = cell_rect(&rc, &Config::default(), &mut sink).unwrap();
        assert!(flow.is_break());
        drop(sink);
        assert_eq!(seen, 1);
    }
}
