//! Query façade over the cell index of a `geography` column.
//!
//! [`SpatialEngine`] bundles a validated [`Config`] with the addressing,
//! covering and predicate operations. [`SpatialTree`] drives an external
//! cell-keyed index: it turns a circle or rectangle into leaf ranges, scans
//! the index once per range, drops rows already seen under another cell and
//! optionally re-checks each candidate against its exact geometry.

use crate::addressing;
use crate::config::Config;
use crate::error::{GeocellError, Result};
use crate::geometry::GeoValue;
use crate::interval::IntervalCellSet;
use crate::raster::{self, CellSink, Region, SortedBuffer};
use crate::sphere::{self, INFINITY};
use crate::types::{Point2D, SpatialCell, SpatialPoint, SpatialRect};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::hash::Hash;
use std::ops::ControlFlow;

/// Entry point for cell addressing, coverings and predicates under one configuration.
#[derive(Debug, Clone)]
pub struct SpatialEngine {
    config: Config,
}

impl SpatialEngine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(GeocellError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Leaf cell holding `p`.
    pub fn make_cell(&self, p: &SpatialPoint) -> SpatialCell {
        addressing::make_cell(p, &self.config.grid)
    }

    /// Lower-left corner of `cell` on the unit square.
    pub fn cell_to_point(&self, cell: &SpatialCell) -> Point2D {
        addressing::cell_to_point(cell, &self.config.grid)
    }

    /// Lower-left corner of `cell` unprojected onto the sphere.
    pub fn cell_to_spatial(&self, cell: &SpatialCell) -> SpatialPoint {
        addressing::cell_to_spatial(cell, &self.config.grid)
    }

    /// Feed the cells covering `region` to `sink` in ascending order.
    pub fn cells_covering<S: CellSink + ?Sized>(
        &self,
        region: &Region,
        sink: &mut S,
    ) -> Result<ControlFlow<()>> {
        raster::cells_covering(region, &self.config, sink)
    }

    /// Wrap `inner` in a sort-and-dedupe buffer of the configured capacity.
    pub fn sorted_sink<S: CellSink>(&self, inner: S) -> SortedBuffer<S> {
        SortedBuffer::new(inner, self.config.sink_buffer_size)
    }

    /// Covering of `region` as leaf ranges.
    pub fn cover(&self, region: &Region) -> Result<IntervalCellSet> {
        let mut set = IntervalCellSet::new();
        // Inserting into a set never breaks.
        let _ = self.cells_covering(region, &mut set)?;
        Ok(set)
    }

    /// Great-circle distance under the configured earth model.
    pub fn distance(&self, p1: &SpatialPoint, p2: &SpatialPoint) -> f64 {
        sphere::distance(p1, p2, self.config.earth)
    }

    pub fn st_contains(&self, value: &GeoValue<'_>, p: &SpatialPoint) -> bool {
        value.st_contains(p)
    }

    pub fn st_distance(&self, value: &GeoValue<'_>, p: &SpatialPoint) -> f64 {
        value.st_distance(p)
    }

    pub fn st_intersects(&self, value: &GeoValue<'_>, rc: &SpatialRect) -> bool {
        value.st_intersects(rc)
    }

    pub fn st_length(&self, value: &GeoValue<'_>) -> f64 {
        value.st_length()
    }
}

impl Default for SpatialEngine {
    fn default() -> Self {
        Self {
            config: Config::default(),
        }
    }
}

/// Trait for cell-keyed index implementations
///
/// An index maps every row to one or more cells. A row may appear under
/// several cells; the tree deduplicates by primary key.
pub trait CellKeyIndex {
    /// Row handle handed to callbacks
    type Row;

    /// Primary key identifying a row across index entries
    type Key: Eq + Hash;

    /// Visit every row whose key cell overlaps the leaf range `first..=last`,
    /// stopping as soon as `row_fn` breaks
    fn scan(
        &self,
        first: SpatialCell,
        last: SpatialCell,
        row_fn: &mut dyn FnMut(&Self::Row) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>>;

    /// Get the primary key of a row
    fn primary_key(&self, row: &Self::Row) -> Self::Key;
}

/// Trait for reading the geometry column of a row
pub trait GeometrySource<R> {
    /// Serialized geometry of `row`, split into one or more fragments
    fn geometry_bytes<'a>(&'a self, row: &'a R) -> Result<SmallVec<[&'a [u8]; 2]>>;
}

fn load<'a, R, G>(source: &'a G, row: &'a R) -> Result<GeoValue<'a>>
where
    G: GeometrySource<R> + ?Sized,
{
    let fragments = source.geometry_bytes(row)?;
    match fragments.as_slice() {
        [single] => GeoValue::parse(*single),
        many => GeoValue::from_fragments(many),
    }
}

/// Candidate and exact spatial lookups over a [`CellKeyIndex`].
pub struct SpatialTree<'e, I> {
    engine: &'e SpatialEngine,
    index: I,
}

impl<'e, I: CellKeyIndex> SpatialTree<'e, I> {
    pub fn new(engine: &'e SpatialEngine, index: I) -> Self {
        Self { engine, index }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn into_index(self) -> I {
        self.index
    }

    /// Rows indexed under cells overlapping `cell`.
    pub fn for_cell<F>(&self, cell: SpatialCell, mut row_fn: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let mut seen = FxHashSet::default();
        self.scan_dedup(cell.lower(), cell.upper(), &mut seen, &mut row_fn)
    }

    /// Every indexed row once.
    pub fn full_globe<F>(&self, mut row_fn: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let mut seen = FxHashSet::default();
        self.scan_dedup(SpatialCell::min(), SpatialCell::max(), &mut seen, &mut row_fn)
    }

    /// Candidate rows near the circle of `radius` meters around `center`.
    ///
    /// Candidates are rows indexed under the circle's covering; they may lie
    /// outside the circle itself.
    pub fn for_range<F>(
        &self,
        center: &SpatialPoint,
        radius: f64,
        row_fn: F,
    ) -> Result<ControlFlow<()>>
    where
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let set = self.engine.cover(&Region::circle(*center, radius))?;
        self.for_set(&set, row_fn)
    }

    /// Candidate rows near `rc`.
    pub fn for_rect<F>(&self, rc: &SpatialRect, row_fn: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let set = self.engine.cover(&Region::Rect(*rc))?;
        self.for_set(&set, row_fn)
    }

    /// Candidate rows indexed under any cell of `set`.
    pub fn for_set<F>(&self, set: &IntervalCellSet, mut row_fn: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let mut seen = FxHashSet::default();
        for (first, last) in set.runs() {
            let flow = self.scan_dedup(first, last, &mut seen, &mut row_fn)?;
            if flow.is_break() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn scan_dedup(
        &self,
        first: SpatialCell,
        last: SpatialCell,
        seen: &mut FxHashSet<I::Key>,
        row_fn: &mut dyn FnMut(&I::Row) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>> {
        let index = &self.index;
        index.scan(first, last, &mut |row| {
            if seen.insert(index.primary_key(row)) {
                row_fn(row)
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// Rows whose geometry lies within `radius` meters of `center`, with their distance.
    pub fn rows_within<G, F>(
        &self,
        source: &G,
        center: &SpatialPoint,
        radius: f64,
        mut row_fn: F,
    ) -> Result<ControlFlow<()>>
    where
        G: GeometrySource<I::Row> + ?Sized,
        F: FnMut(&I::Row, f64) -> ControlFlow<()>,
    {
        let mut failure = None;
        let flow = self.for_range(center, radius, |row| match load(source, row) {
            Ok(value) => {
                let d = value.st_distance(center);
                if d <= radius {
                    row_fn(row, d)
                } else {
                    ControlFlow::Continue(())
                }
            }
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(flow),
        }
    }

    /// Rows whose geometry intersects `rc`.
    pub fn rows_intersecting<G, F>(
        &self,
        source: &G,
        rc: &SpatialRect,
        mut row_fn: F,
    ) -> Result<ControlFlow<()>>
    where
        G: GeometrySource<I::Row> + ?Sized,
        F: FnMut(&I::Row) -> ControlFlow<()>,
    {
        let mut failure = None;
        let flow = self.for_rect(rc, |row| match load(source, row) {
            Ok(value) if value.st_intersects(rc) => row_fn(row),
            Ok(_) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(flow),
        }
    }

    /// Closest row within `radius` meters of `center`, ties going to the first seen.
    pub fn nearest_within<G>(
        &self,
        source: &G,
        center: &SpatialPoint,
        radius: f64,
    ) -> Result<Option<(I::Row, f64)>>
    where
        G: GeometrySource<I::Row> + ?Sized,
        I::Row: Clone,
    {
        let mut best: Option<(I::Row, f64)> = None;
        let _ = self.rows_within(source, center, radius, |row, d| {
            if best.as_ref().map_or(INFINITY, |(_, b)| *b) > d {
                best = Some((row.clone(), d));
            }
            ControlFlow::Continue(())
        })?;
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::wkt;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u64,
        wkb: Vec<u8>,
    }

    /// Points keyed by their leaf, everything else by the covering of its envelope.
    struct MemIndex {
        entries: BTreeMap<(SpatialCell, u64), Row>,
    }

    impl MemIndex {
        fn build(engine: &SpatialEngine, rows: &[(u64, &str)]) -> Self {
            let mut entries = BTreeMap::new();
            for &(id, text) in rows {
                let wkb = wkt::parse(text).unwrap();
                let value = GeoValue::parse(&wkb).unwrap();
                let mut cells = Vec::new();
                if value.kind() == crate::geometry::GeometryKind::Point {
                    cells.push(engine.make_cell(&value.points().first().unwrap()));
                } else {
                    let set = engine.cover(&Region::Rect(value.envelope())).unwrap();
                    let _ = set.for_each_merged(|cell| {
                        cells.push(cell);
                        ControlFlow::Continue(())
                    });
                }
                for cell in cells {
                    entries.insert((cell, id), Row { id, wkb: wkb.clone() });
                }
            }
            Self { entries }
        }
    }

    impl CellKeyIndex for MemIndex {
        type Row = Row;
        type Key = u64;

        fn scan(
            &self,
            first: SpatialCell,
            last: SpatialCell,
            row_fn: &mut dyn FnMut(&Row) -> ControlFlow<()>,
        ) -> Result<ControlFlow<()>> {
            for ((cell, _), row) in self.entries.iter() {
                if cell.upper() < first || cell.lower() > last {
                    continue;
                }
                if row_fn(row).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
            Ok(ControlFlow::Continue(()))
        }

        fn primary_key(&self, row: &Row) -> u64 {
            row.id
        }
    }

    struct Rows;

    impl GeometrySource<Row> for Rows {
        fn geometry_bytes<'a>(&'a self, row: &'a Row) -> Result<SmallVec<[&'a [u8]; 2]>> {
            // Split to exercise fragment joining.
            let (a, b) = row.wkb.split_at(row.wkb.len() / 2);
            Ok(SmallVec::from_slice(&[a, b]))
        }
    }

    fn tree(engine: &SpatialEngine) -> SpatialTree<'_, MemIndex> {
        let index = MemIndex::build(
            engine,
            &[
                (1, "POINT (2.35 48.85)"),
                (2, "POINT (2.45 48.90)"),
                (3, "LINESTRING (2.0 48.0, 2.2 48.5, 2.25 48.7)"),
                (4, "POINT (13.40 52.52)"),
                (5, "POLYGON ((2.0 48.7, 2.6 48.7, 2.6 49.0, 2.0 49.0, 2.0 48.7))"),
            ],
        );
        SpatialTree::new(engine, index)
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let config = Config::default().with_segment_meters(-1.0);
        assert!(matches!(SpatialEngine::new(config), Err(GeocellError::Config(_))));
        assert!(SpatialEngine::new(Config::default()).is_ok());
    }

    #[test]
    fn test_engine_cover_contains_cell() {
        let engine = SpatialEngine::default();
        let center = SpatialPoint::new(35.68, 139.69);
        let set = engine.cover(&Region::circle(center, 10_000.0)).unwrap();
        assert!(set.contains(&engine.make_cell(&center)));
        let back = engine.cell_to_spatial(&engine.make_cell(&center));
        assert!(engine.distance(&center, &back) < 1_000.0);
    }

    #[test]
    fn test_cell_to_spatial_is_lower_left_corner() {
        let engine = SpatialEngine::default();
        let cell = engine.make_cell(&SpatialPoint::new(-33.87, 151.21));
        let corner = engine.cell_to_point(&cell);
        assert_eq!(engine.cell_to_spatial(&cell), crate::projection::unproject(&corner));
        let center = addressing::cell_center(&cell, &engine.config().grid);
        assert!(center.x > corner.x && center.y > corner.y);
    }

    #[test]
    fn test_sorted_sink_uses_configured_capacity() {
        let engine = SpatialEngine::new(Config::default().with_sink_buffer_size(2)).unwrap();
        let mut sink = engine.sorted_sink(Vec::<SpatialCell>::new());
        for code in [9, 4, 4, 1] {
            let _ = sink.push(SpatialCell::from_code(code));
        }
        let _ = sink.finish();
        let codes: Vec<u32> = sink.into_inner().iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![4, 9, 1, 4]);
    }

    #[test]
    fn test_full_globe_dedupes() {
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let mut ids = Vec::new();
        tree.full_globe(|row| {
            ids.push(row.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_for_cell_finds_point() {
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let cell = engine.make_cell(&SpatialPoint::new(52.52, 13.40));
        let mut ids = Vec::new();
        tree.for_cell(cell, |row| {
            ids.push(row.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_rows_within_filters_exactly() {
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let paris = SpatialPoint::new(48.85, 2.35);
        let mut hits = Vec::new();
        tree.rows_within(&Rows, &paris, 20_000.0, |row, d| {
            assert!(d <= 20_000.0);
            hits.push(row.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2, 3, 5]);

        let mut candidates = Vec::new();
        tree.for_range(&paris, 1_000.0, |row| {
            candidates.push(row.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert!(candidates.contains(&1));
        assert!(!candidates.contains(&4));
    }

    #[test]
    fn test_nearest_within() {
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let near_berlin = SpatialPoint::new(52.50, 13.41);
        let (row, d) = tree
            .nearest_within(&Rows, &near_berlin, 50_000.0)
            .unwrap()
            .unwrap();
        assert_eq!(row.id, 4);
        assert!(d < 3_000.0);
        let nothing = tree
            .nearest_within(&Rows, &SpatialPoint::new(-40.0, -70.0), 10_000.0)
            .unwrap();
        assert!(nothing.is_none());
    }

    #[test]
    fn test_rows_intersecting_and_break() {
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let rc = SpatialRect::new(48.80, 2.30, 48.95, 2.50);
        let mut hits = Vec::new();
        tree.rows_intersecting(&Rows, &rc, |row| {
            hits.push(row.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2, 5]);

        let mut seen = 0;
        let flow = tree
            .full_globe(|_| {
                seen += 1;
                ControlFlow::Break(())
            })
            .unwrap();
        assert!(flow.is_break());
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_bad_geometry_surfaces() {
        struct Broken;
        impl GeometrySource<Row> for Broken {
            fn geometry_bytes<'a>(&'a self, _row: &'a Row) -> Result<SmallVec<[&'a [u8]; 2]>> {
                Ok(SmallVec::from_slice(&[&[0u8, 1, 2][..]]))
            }
        }
        let engine = SpatialEngine::default();
        let tree = tree(&engine);
        let result = tree.rows_within(&Broken, &SpatialPoint::new(48.85, 2.35), 5_000.0, |_, _| {
            ControlFlow::Continue(())
        });
        assert!(matches!(result, Err(GeocellError::Parse(_))));
    }
}
