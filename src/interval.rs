//! Run-length compressed set of leaf cells.
//!
//! Leaf codes are kept as inclusive `[start, end]` runs in a `BTreeMap`.
//! Runs never overlap and never touch: `prev.end + 1 < next.start` always
//! holds, so every run is maximal and the representation is canonical.

use crate::error::{GeocellError, Result};
use crate::types::SpatialCell;
use std::collections::BTreeMap;
use std::ops::ControlFlow;

/// Ordered set of leaf cells stored as maximal runs.
///
/// # Examples
///
/// ```
/// use geocell::{IntervalCellSet, SpatialCell};
///
/// let mut set = IntervalCellSet::new();
/// set.insert(SpatialCell::from_code(10));
/// set.insert(SpatialCell::from_code(12));
/// set.insert(SpatialCell::from_code(11));
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.run_count(), 1);
/// assert!(set.contains(&SpatialCell::from_code(11)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalCellSet {
    runs: BTreeMap<u32, u32>,
    count: u64,
}

impl IntervalCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every leaf code in `lo..=hi`. Returns false when nothing changed.
    fn insert_codes(&mut self, lo: u32, hi: u32) -> bool {
        debug_assert!(lo <= hi);
        let mut start = lo;
        let mut end = hi;
        if let Some((&s, &e)) = self.runs.range(..=lo).next_back() {
            if e >= hi {
                return false;
            }
            if e as u64 + 1 >= lo as u64 {
                start = s;
            }
        }
        let upper = hi.saturating_add(1);
        let mut removed = 0u64;
        while let Some((&s, &e)) = self.runs.range(start..=upper).next() {
            self.runs.remove(&s);
            removed += e as u64 - s as u64 + 1;
            end = end.max(e);
        }
        self.runs.insert(start, end);
        self.count = self.count - removed + (end as u64 - start as u64 + 1);
        true
    }

    /// Add a cell. A coarse cell adds every leaf under it.
    pub fn insert(&mut self, cell: SpatialCell) -> bool {
        self.insert_codes(cell.lower().code(), cell.upper().code())
    }

    /// Add the closed run of leaves `lo..=hi`.
    pub fn insert_range(&mut self, lo: SpatialCell, hi: SpatialCell) -> Result<bool> {
        if !lo.is_leaf() || !hi.is_leaf() {
            return Err(GeocellError::invalid(format!(
                "interval endpoints must be leaf cells, got depth {} and {}",
                lo.depth(),
                hi.depth()
            )));
        }
        if lo >= hi {
            return Err(GeocellError::invalid(format!(
                "interval start {} must precede end {}",
                lo, hi
            )));
        }
        Ok(self.insert_codes(lo.code(), hi.code()))
    }

    /// True when every leaf of `cell` is in the set.
    pub fn contains(&self, cell: &SpatialCell) -> bool {
        let lo = cell.lower().code();
        let hi = cell.upper().code();
        match self.runs.range(..=lo).next_back() {
            Some((_, &e)) => e >= hi,
            None => false,
        }
    }

    pub fn find(&self, cell: &SpatialCell) -> bool {
        self.contains(cell)
    }

    /// Number of leaf cells represented.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn size(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of stored runs, singletons included.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.count = 0;
    }

    /// Stored runs as `(first, last)` leaves in ascending order.
    pub fn runs(&self) -> impl Iterator<Item = (SpatialCell, SpatialCell)> + '_ {
        self.runs
            .iter()
            .map(|(&s, &e)| (SpatialCell::from_code(s), SpatialCell::from_code(e)))
    }

    /// Visit every leaf in ascending order.
    pub fn for_each<F>(&self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(SpatialCell) -> ControlFlow<()>,
    {
        for (&s, &e) in &self.runs {
            for code in s..=e {
                f(SpatialCell::from_code(code))?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Visit singletons with `cell_fn` and runs with `interval_fn`, without expanding.
    pub fn for_each_interval<C, I>(&self, mut cell_fn: C, mut interval_fn: I) -> ControlFlow<()>
    where
        C: FnMut(SpatialCell) -> ControlFlow<()>,
        I: FnMut(SpatialCell, SpatialCell) -> ControlFlow<()>,
    {
        for (&s, &e) in &self.runs {
            if s == e {
                cell_fn(SpatialCell::from_code(s))?;
            } else {
                interval_fn(SpatialCell::from_code(s), SpatialCell::from_code(e))?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Visit the fewest aligned cells of any depth that tile the set, ascending.
    pub fn for_each_merged<F>(&self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(SpatialCell) -> ControlFlow<()>,
    {
        for (&s, &e) in &self.runs {
            let end = e as u64;
            let mut pos = s as u64;
            while pos <= end {
                let cell = largest_aligned(pos, end);
                f(cell)?;
                pos += SpatialCell::leaf_span(cell.depth());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Coarsest cell starting at leaf `pos` that ends at or before `end`.
fn largest_aligned(pos: u64, end: u64) -> SpatialCell {
    let leaf = SpatialCell::from_code(pos as u32);
    for depth in 1..SpatialCell::SIZE {
        let span = SpatialCell::leaf_span(depth);
        if pos % span == 0 && pos + span - 1 <= end {
            if let Some(cell) = leaf.with_depth(depth) {
                return cell;
            }
        }
    }
    leaf
}

impl Extend<SpatialCell> for IntervalCellSet {
    fn extend<T: IntoIterator<Item = SpatialCell>>(&mut self, iter: T) {
        for cell in iter {
            self.insert(cell);
        }
    }
}

impl FromIterator<SpatialCell> for IntervalCellSet {
    fn from_iter<T: IntoIterator<Item = SpatialCell>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
