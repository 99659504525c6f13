//! Multi-resolution cell emission from a scan table.

use super::scan::{Coverage, ScanTable};
use super::sink::CellSink;
use crate::config::SpatialGrid;
use crate::hilbert::d2xy;
use crate::types::SpatialCell;
use std::ops::ControlFlow;

/// Counters gathered while emitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Cells handed to the sink, per depth (index 0 is depth 1).
    pub cells: [u64; 4],
    /// Blocks that had to be refined.
    pub partial_blocks: u64,
}

impl EmitStats {
    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }
}

struct Emitter<'a, S: ?Sized> {
    table: &'a ScanTable,
    grid: &'a SpatialGrid,
    sink: &'a mut S,
    stats: EmitStats,
}

impl<S: CellSink + ?Sized> Emitter<'_, S> {
    fn walk(&mut self, level: usize, digits: &mut [u8; 4], ox: u32, oy: u32) -> ControlFlow<()> {
        let g = self.grid.size(level);
        let w = self.grid.block(level);
        for d in 0..g * g {
            let (cx, cy) = d2xy(g, d);
            let (x0, y0) = (ox + cx * w, oy + cy * w);
            digits[level] = d as u8;
            match self.table.classify(x0, y0, w) {
                Coverage::Empty => {}
                Coverage::Full => {
                    let depth = level as u8 + 1;
                    if let Some(cell) = SpatialCell::new(*digits, depth) {
                        self.stats.cells[level] += 1;
                        self.sink.push(cell)?;
                    }
                }
                Coverage::Partial => {
                    debug_assert!(level + 1 < SpatialCell::SIZE as usize);
                    self.stats.partial_blocks += 1;
                    self.walk(level + 1, digits, x0, y0)?;
                }
            }
        }
        digits[level] = 0;
        ControlFlow::Continue(())
    }
}

/// Emit the coarsest cells tiling the covered pixels, in ascending cell order.
///
/// Aligned blocks that are fully covered become one cell of their depth,
/// partially covered blocks are refined and empty blocks are skipped.
pub fn emit<S: CellSink + ?Sized>(
    table: &ScanTable,
    grid: &SpatialGrid,
    sink: &mut S,
) -> (ControlFlow<()>, EmitStats) {
    let mut emitter = Emitter {
        table,
        grid,
        sink,
        stats: EmitStats::default(),
    };
    let flow = if table.is_empty() {
        ControlFlow::Continue(())
    } else {
        emitter.walk(0, &mut [0u8; 4], 0, 0)
    };
    (flow, emitter.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::cell_to_pixel;
    use crate::raster::sink::FnSink;
    use crate::types::Point2D;

    #[test]
    fn test_full_table_is_top_level() {
        let grid = SpatialGrid::default();
        let mut table = ScanTable::new(grid.max_id());
        table.add_rows(0, grid.max_id() - 1);
        let mut out: Vec<SpatialCell> = Vec::new();
        let (flow, stats) = emit(&table, &grid, &mut out);
        assert!(flow.is_continue());
        assert_eq!(out.len(), 256);
        assert_eq!(stats.cells[0], 256);
        assert!(out.iter().all(|c| c.depth() == 1));
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_pixel() {
        let grid = SpatialGrid::default();
        let mut table = ScanTable::new(grid.max_id());
        let (x, y) = (12345u32, 54321u32);
        let square = vec![
            Point2D::new(x as f64 + 0.4, y as f64 + 0.4),
            Point2D::new(x as f64 + 0.6, y as f64 + 0.4),
            Point2D::new(x as f64 + 0.6, y as f64 + 0.6),
        ];
        table.add_outline(&[square], (0, grid.max_id() - 1));
        let mut out: Vec<SpatialCell> = Vec::new();
        let (_, stats) = emit(&table, &grid, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_leaf());
        assert_eq!(cell_to_pixel(&out[0], &grid), (x, y));
        assert_eq!(stats.partial_blocks, 3);
    }

    #[test]
    fn test_break_stops_emission() {
        let grid = SpatialGrid::default();
        let mut table = ScanTable::new(grid.max_id());
        table.add_rows(0, grid.max_id() - 1);
        let mut count = 0;
        let mut sink = FnSink(|_: SpatialCell| {
            count += 1;
            if count == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let (flow, stats) = emit(&table, &grid, &mut sink);
        assert!(flow.is_break());
        assert_eq!(stats.total(), 3);
    }
}
