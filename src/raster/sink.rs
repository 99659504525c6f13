//! Receivers for covering cells.

use crate::config::SpatialGrid;
use crate::interval::IntervalCellSet;
use crate::types::SpatialCell;
use std::ops::ControlFlow;

/// Consumer of cells emitted by the rasterizer.
///
/// Returning `ControlFlow::Break` from `push` stops the enumeration.
pub trait CellSink {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()>;

    /// Called once after the last cell.
    fn finish(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<S: CellSink + ?Sized> CellSink for &mut S {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        (**self).push(cell)
    }

    fn finish(&mut self) -> ControlFlow<()> {
        (**self).finish()
    }
}

impl CellSink for Vec<SpatialCell> {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        Vec::push(self, cell);
        ControlFlow::Continue(())
    }
}

/// Coarse cells become leaf ranges.
impl CellSink for IntervalCellSet {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        self.insert(cell);
        ControlFlow::Continue(())
    }
}

/// Closure sink; cells arrive exactly as emitted, coarse ones included.
pub struct FnSink<F>(pub F);

impl<F> CellSink for FnSink<F>
where
    F: FnMut(SpatialCell) -> ControlFlow<()>,
{
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        (self.0)(cell)
    }
}

/// Expands every coarse cell into its leaves, in Hilbert order.
pub struct LeafSink<S> {
    inner: S,
    grid: SpatialGrid,
}

impl<S: CellSink> LeafSink<S> {
    pub fn new(inner: S, grid: SpatialGrid) -> Self {
        Self { inner, grid }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn expand(&mut self, digits: [u8; 4], depth: usize) -> ControlFlow<()> {
        if depth == SpatialCell::SIZE as usize {
            return self.inner.push(SpatialCell::from_code(u32::from_be_bytes(digits)));
        }
        let g = self.grid.size(depth);
        for d in 0..g * g {
            let mut next = digits;
            next[depth] = d as u8;
            self.expand(next, depth + 1)?;
        }
        ControlFlow::Continue(())
    }
}

impl<S: CellSink> CellSink for LeafSink<S> {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        self.expand(cell.digits(), cell.depth() as usize)
    }

    fn finish(&mut self) -> ControlFlow<()> {
        self.inner.finish()
    }
}

/// Collects cells, and forwards each full buffer sorted and without duplicates.
pub struct SortedBuffer<S> {
    inner: S,
    buffer: Vec<SpatialCell>,
    capacity: usize,
}

impl<S: CellSink> SortedBuffer<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Forward the buffered cells.
    pub fn flush(&mut self) -> ControlFlow<()> {
        self.buffer.sort_unstable();
        self.buffer.dedup();
        let result = self
            .buffer
            .iter()
            .try_for_each(|&cell| self.inner.push(cell));
        self.buffer.clear();
        result
    }
}

impl<S: CellSink> CellSink for SortedBuffer<S> {
    fn push(&mut self, cell: SpatialCell) -> ControlFlow<()> {
        self.buffer.push(cell);
        if self.buffer.len() >= self.capacity {
            self.flush()
        } else {
            ControlFlow::Continue(())
        }
    }

    fn finish(&mut self) -> ControlFlow<()> {
        self.flush()?;
        self.inner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSize;

    fn cell(code: u32, depth: u8) -> SpatialCell {
        SpatialCell::from_code(code).with_depth(depth).unwrap()
    }

    #[test]
    fn test_leaf_sink_expands() {
        let mut leaves = LeafSink::new(Vec::<SpatialCell>::new(), SpatialGrid::default());
        assert!(leaves.push(cell(0x0102_0300, 3)).is_continue());
        let out = leaves.into_inner();
        assert_eq!(out.len(), 256);
        assert_eq!(out[0], SpatialCell::from_code(0x0102_0300));
        assert_eq!(out[255], SpatialCell::from_code(0x0102_03FF));
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_leaf_sink_respects_grid() {
        let grid = SpatialGrid::new([GridSize::High, GridSize::High, GridSize::High, GridSize::Low]);
        let mut leaves = LeafSink::new(Vec::<SpatialCell>::new(), grid);
        let _ = leaves.push(cell(0x0102_0300, 3));
        assert_eq!(leaves.into_inner().len(), 16);
    }

    #[test]
    fn test_sorted_buffer() {
        let mut sink = SortedBuffer::new(Vec::<SpatialCell>::new(), 4);
        for code in [5, 3, 5, 1, 9, 2, 2] {
            let _ = sink.push(SpatialCell::from_code(code));
        }
        let _ = sink.finish();
        let codes: Vec<u32> = sink.into_inner().iter().map(|c| c.code()).collect();
        // First buffer [5,3,5,1] then [9,2,2].
        assert_eq!(codes, vec![1, 3, 5, 2, 9]);
    }

    #[test]
    fn test_fn_sink_stops() {
        let mut seen = 0;
        let mut sink = FnSink(|_: SpatialCell| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(sink.push(SpatialCell::min()).is_continue());
        assert!(sink.push(SpatialCell::max()).is_break());
        drop(sink);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_interval_set_sink() {
        let mut set = IntervalCellSet::new();
        let _ = CellSink::push(&mut set, cell(0x0100_0000, 1));
        assert_eq!(set.len(), 1 << 24);
        assert_eq!(set.run_count(), 1);
    }
}
