//! Parsed view over a `geography` value.
//!
//! A [`GeoValue`] borrows the bytes it was parsed from and decodes points on
//! demand. Values spread over several fragments are copied once into a
//! shared buffer.

mod convert;
pub mod layout;
pub mod wkt;

use crate::error::{GeocellError, Result};
use crate::planar::{is_vertex, point_in_polygon, signed_area2};
use crate::types::{Point2D, SpatialPoint, SpatialRect};
use bytes::{Bytes, BytesMut};
use layout::{
    HEADER_SIZE, LINESEGMENT_VALUE_SIZE, MIN_POINTARRAY_SIZE, POINT_SIZE, POINT_VALUE_SIZE,
    POINTARRAY_OFFSET, TAG_LINESEGMENT, TAG_LINESTRING, TAG_MULTIPOLYGON, TAG_POINT, TAIL_LINES,
    TAIL_RINGS,
};
use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineSegment,
    LineString,
    Polygon,
    MultiLineString,
    /// Several rings; a polygon with holes is stored this way too.
    MultiPolygon,
}

impl GeometryKind {
    pub fn is_multi(self) -> bool {
        matches!(self, GeometryKind::MultiLineString | GeometryKind::MultiPolygon)
    }
}

/// OGC geometry type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeometryType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Unknown => "Unknown",
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Exterior,
    Interior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    CounterClockwise,
    Clockwise,
    /// Zero signed area.
    Degenerate,
}

#[derive(Debug, Clone)]
enum Storage<'a> {
    Borrowed(&'a [u8]),
    Shared(Bytes),
}

impl Storage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Borrowed(data) => data,
            Storage::Shared(bytes) => bytes,
        }
    }
}

/// Borrowed run of encoded points.
#[derive(Debug, Clone, Copy)]
pub struct PointSeq<'b> {
    data: &'b [u8],
}

impl<'b> PointSeq<'b> {
    pub fn len(&self) -> usize {
        self.data.len() / POINT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<SpatialPoint> {
        self.data
            .get(i * POINT_SIZE..(i + 1) * POINT_SIZE)
            .map(layout::decode_point)
    }

    pub fn first(&self) -> Option<SpatialPoint> {
        self.get(0)
    }

    pub fn last(&self) -> Option<SpatialPoint> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = SpatialPoint> + 'b {
        self.data.chunks_exact(POINT_SIZE).map(layout::decode_point)
    }

    pub fn to_vec(&self) -> Vec<SpatialPoint> {
        self.iter().collect()
    }

    /// Points on the longitude/latitude plane, `x` = longitude.
    pub fn to_planar(&self) -> Vec<Point2D> {
        self.iter()
            .map(|p| Point2D::new(p.longitude, p.latitude))
            .collect()
    }

    fn is_closed(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => self.len() > 1 && a.equal(&b),
            _ => false,
        }
    }
}

/// Ring roles plus whether some hole sits inside another hole.
#[derive(Debug, Clone)]
struct RingLayout {
    orientation: Vec<Orientation>,
    nested: bool,
}

/// A parsed `geography` value.
///
/// # Examples
///
/// ```
/// use geocell::geometry::{GeoValue, GeometryKind, wkt};
/// use geocell::SpatialPoint;
///
/// let bytes = wkt::parse("POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))").unwrap();
/// let value = GeoValue::parse(&bytes).unwrap();
/// assert_eq!(value.kind(), GeometryKind::Polygon);
/// assert!(value.st_contains(&SpatialPoint::new(25.0, 25.0)));
/// assert!(!value.st_contains(&SpatialPoint::new(5.0, 5.0)));
/// ```
#[derive(Debug, Clone)]
pub struct GeoValue<'a> {
    storage: Storage<'a>,
    kind: GeometryKind,
    /// Byte range of the point array.
    points: Range<usize>,
    /// Point index ranges of the sub-objects (multi kinds only).
    parts: SmallVec<[Range<u32>; 4]>,
    rings: OnceCell<RingLayout>,
}

impl<'a> GeoValue<'a> {
    /// Parse a contiguous value, borrowing `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        Self::from_storage(Storage::Borrowed(data))
    }

    /// Parse a value split across fragments, copying them into one buffer.
    pub fn from_fragments(fragments: &[&[u8]]) -> Result<GeoValue<'static>> {
        if let [single] = fragments {
            return GeoValue::from_bytes(Bytes::copy_from_slice(single));
        }
        let total = fragments.iter().map(|f| f.len()).sum();
        let mut buf = BytesMut::with_capacity(total);
        for fragment in fragments {
            buf.extend_from_slice(fragment);
        }
        GeoValue::from_bytes(buf.freeze())
    }

    /// Parse an owned buffer.
    pub fn from_bytes(bytes: Bytes) -> Result<GeoValue<'static>> {
        GeoValue::from_storage(Storage::Shared(bytes))
    }

    fn from_storage(storage: Storage<'a>) -> Result<Self> {
        let data = storage.as_slice();
        let header = layout::read_header(data)?;
        let (kind, points, parts) = match header.tag {
            TAG_POINT => {
                expect_size(data, POINT_VALUE_SIZE, "point")?;
                (GeometryKind::Point, HEADER_SIZE..POINT_VALUE_SIZE, SmallVec::new())
            }
            TAG_LINESEGMENT => {
                expect_size(data, LINESEGMENT_VALUE_SIZE, "line segment")?;
                (
                    GeometryKind::LineSegment,
                    HEADER_SIZE..LINESEGMENT_VALUE_SIZE,
                    SmallVec::new(),
                )
            }
            TAG_LINESTRING => {
                let points = point_array(data)?;
                if data.len() > points.end {
                    log::warn!(
                        "line string carries {} trailing bytes",
                        data.len() - points.end
                    );
                }
                (GeometryKind::LineString, points, SmallVec::new())
            }
            TAG_MULTIPOLYGON => {
                let points = point_array(data)?;
                let num_points = ((points.end - points.start) / POINT_SIZE) as u32;
                match layout::read_tail(data, points.end)? {
                    None => {
                        log::warn!("multipolygon tag without a tail read as a line string");
                        (GeometryKind::LineString, points, SmallVec::new())
                    }
                    Some(tail) => {
                        let kind = classify_tail(tail.count, tail.kind)?;
                        let parts = if kind.is_multi() {
                            part_ranges(&tail.starts, num_points)?
                        } else {
                            SmallVec::new()
                        };
                        (kind, points, parts)
                    }
                }
            }
            tag => {
                return Err(GeocellError::parse(format!(
                    "unknown geography tag {:#06x}",
                    tag
                )));
            }
        };
        let value = Self {
            storage,
            kind,
            points,
            parts,
            rings: OnceCell::new(),
        };
        value.check_rings()?;
        Ok(value)
    }

    fn check_rings(&self) -> Result<()> {
        let check = |seq: PointSeq<'_>, i: usize| {
            if seq.len() < 4 || !seq.is_closed() {
                return Err(GeocellError::parse(format!(
                    "ring {} with {} points is not closed",
                    i,
                    seq.len()
                )));
            }
            Ok(())
        };
        match self.kind {
            GeometryKind::Polygon => check(self.points(), 0),
            GeometryKind::MultiPolygon => (0..self.parts.len())
                .try_for_each(|i| check(self.part(i), i)),
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Raw bytes of the value.
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    pub fn num_points(&self) -> usize {
        (self.points.end - self.points.start) / POINT_SIZE
    }

    pub fn point(&self, i: usize) -> Option<SpatialPoint> {
        self.points().get(i)
    }

    /// Every point of the value in storage order.
    pub fn points(&self) -> PointSeq<'_> {
        PointSeq {
            data: &self.as_bytes()[self.points.clone()],
        }
    }

    /// Sub-object count of multi kinds, 0 otherwise.
    pub fn num_subobjects(&self) -> usize {
        self.parts.len()
    }

    pub fn subobject(&self, i: usize) -> Option<PointSeq<'_>> {
        (i < self.parts.len()).then(|| self.part(i))
    }

    fn part(&self, i: usize) -> PointSeq<'_> {
        let range = &self.parts[i];
        let start = self.points.start + range.start as usize * POINT_SIZE;
        let end = self.points.start + range.end as usize * POINT_SIZE;
        PointSeq {
            data: &self.as_bytes()[start..end],
        }
    }

    /// Rings, lines or the single point run of the value.
    pub fn parts(&self) -> impl Iterator<Item = PointSeq<'_>> + '_ {
        let count = if self.kind.is_multi() { self.parts.len() } else { 1 };
        (0..count).map(move |i| {
            if self.kind.is_multi() {
                self.part(i)
            } else {
                self.points()
            }
        })
    }

    fn ring_layout(&self) -> &RingLayout {
        self.rings.get_or_init(|| infer_ring_layout(self))
    }

    /// Exterior/interior role of every ring of a multipolygon, computed once.
    ///
    /// A hole nested inside another hole is reported as unsupported.
    pub fn ring_orientation(&self) -> Result<&[Orientation]> {
        if self.kind != GeometryKind::MultiPolygon {
            return Ok(&[]);
        }
        let layout = self.ring_layout();
        if layout.nested {
            return Err(GeocellError::Unsupported(
                "hole nested inside another hole".to_string(),
            ));
        }
        Ok(&layout.orientation)
    }

    /// Winding of every ring on the longitude/latitude plane.
    pub fn ring_winding(&self) -> Vec<Winding> {
        match self.kind {
            GeometryKind::Polygon | GeometryKind::MultiPolygon => self
                .parts()
                .map(|ring| {
                    let area = signed_area2(&ring.to_planar());
                    if area > 0.0 {
                        Winding::CounterClockwise
                    } else if area < 0.0 {
                        Winding::Clockwise
                    } else {
                        Winding::Degenerate
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True for a multipolygon with more than one exterior ring.
    pub fn multiple_exterior(&self) -> bool {
        match self.ring_orientation() {
            Ok(rings) => rings.iter().filter(|o| **o == Orientation::Exterior).count() > 1,
            Err(_) => true,
        }
    }

    /// Groups of `(exterior, holes)` ring indices.
    pub(crate) fn shells(&self) -> Result<Vec<(usize, SmallVec<[usize; 4]>)>> {
        let orientation = self.ring_orientation()?;
        let mut shells: Vec<(usize, SmallVec<[usize; 4]>)> = Vec::new();
        for (i, o) in orientation.iter().enumerate() {
            if *o == Orientation::Interior {
                if let Some((_, holes)) = shells.last_mut() {
                    holes.push(i);
                    continue;
                }
            }
            shells.push((i, SmallVec::new()));
        }
        Ok(shells)
    }

    /// OGC type of the value.
    pub fn st_geometry_type(&self) -> GeometryType {
        match self.kind {
            GeometryKind::Point => GeometryType::Point,
            GeometryKind::LineSegment | GeometryKind::LineString => GeometryType::LineString,
            GeometryKind::Polygon => GeometryType::Polygon,
            GeometryKind::MultiLineString => GeometryType::MultiLineString,
            GeometryKind::MultiPolygon => match self.ring_orientation() {
                Ok(_) if self.multiple_exterior() => GeometryType::MultiPolygon,
                Ok(_) => GeometryType::Polygon,
                Err(_) => GeometryType::Unknown,
            },
        }
    }

    /// Latitude/longitude bounds of all points, not antimeridian aware.
    pub fn envelope(&self) -> SpatialRect {
        let mut it = self.points().iter();
        let Some(first) = it.next() else {
            return SpatialRect::default();
        };
        it.fold(
            SpatialRect::new(first.latitude, first.longitude, first.latitude, first.longitude),
            |mut rc, p| {
                rc.min_lat = rc.min_lat.min(p.latitude);
                rc.max_lat = rc.max_lat.max(p.latitude);
                rc.min_lon = rc.min_lon.min(p.longitude);
                rc.max_lon = rc.max_lon.max(p.longitude);
                rc
            },
        )
    }
}

impl fmt::Display for GeoValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.st_as_text())
    }
}

fn expect_size(data: &[u8], size: usize, what: &str) -> Result<()> {
    if data.len() != size {
        return Err(GeocellError::parse(format!(
            "{} value must be {} bytes, got {}",
            what,
            size,
            data.len()
        )));
    }
    Ok(())
}

/// Byte range of the point array, checked against the buffer length.
fn point_array(data: &[u8]) -> Result<Range<usize>> {
    if data.len() < MIN_POINTARRAY_SIZE {
        return Err(GeocellError::parse(format!(
            "point array value of {} bytes is too short",
            data.len()
        )));
    }
    let num = layout::read_u32(data, HEADER_SIZE)? as usize;
    let end = num
        .checked_mul(POINT_SIZE)
        .and_then(|n| n.checked_add(POINTARRAY_OFFSET))
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            GeocellError::parse(format!(
                "{} points do not fit in {} bytes",
                num,
                data.len()
            ))
        })?;
    if num == 0 {
        return Err(GeocellError::parse("empty point array"));
    }
    Ok(POINTARRAY_OFFSET..end)
}

fn classify_tail(count: u32, kind: u8) -> Result<GeometryKind> {
    match (count, kind) {
        (0, _) => Err(GeocellError::parse("tail declares no sub-objects")),
        (1, TAIL_LINES) => Ok(GeometryKind::LineString),
        (1, TAIL_RINGS) => Ok(GeometryKind::Polygon),
        (_, TAIL_LINES) => Ok(GeometryKind::MultiLineString),
        (_, TAIL_RINGS) => Ok(GeometryKind::MultiPolygon),
        (_, other) => {
            log::warn!("unsupported geography sub-object kind {}", other);
            Err(GeocellError::Unsupported(format!(
                "sub-object kind {} (multi-point or geometry collection)",
                other
            )))
        }
    }
}

fn part_ranges(starts: &[u32], num_points: u32) -> Result<SmallVec<[Range<u32>; 4]>> {
    let mut parts = SmallVec::with_capacity(starts.len() + 1);
    let mut begin = 0u32;
    for &start in starts.iter().chain(std::iter::once(&num_points)) {
        if start <= begin || start > num_points {
            return Err(GeocellError::parse(format!(
                "sub-object boundary {} out of order (previous {}, points {})",
                start, begin, num_points
            )));
        }
        parts.push(begin..start);
        begin = start;
    }
    Ok(parts)
}

/// Ring 0 is exterior. Every later ring is tested point by point against the
/// current exterior: the first point strictly inside makes it a hole, the
/// first point outside makes it the new exterior. Vertex hits decide nothing.
fn infer_ring_layout(value: &GeoValue<'_>) -> RingLayout {
    let size = value.num_subobjects();
    let mut orientation = vec![Orientation::Exterior; size];
    let mut nested = false;
    if size == 0 {
        return RingLayout {
            orientation,
            nested,
        };
    }
    let mut exterior = value.part(0).to_planar();
    let mut holes: Vec<Vec<Point2D>> = Vec::new();
    for (i, role) in orientation.iter_mut().enumerate().skip(1) {
        let ring = value.part(i).to_planar();
        let mut decided = false;
        for p in &ring {
            if point_in_polygon(&exterior, p) {
                if !is_vertex(&exterior, p) {
                    *role = Orientation::Interior;
                    decided = true;
                    if holes.iter().any(|h| point_in_polygon(h, p) && !is_vertex(h, p)) {
                        nested = true;
                    }
                    break;
                }
            } else {
                decided = true;
                break;
            }
        }
        match *role {
            Orientation::Interior => holes.push(ring),
            Orientation::Exterior => {
                if !decided {
                    log::debug!("ring {} lies on the exterior boundary, kept as exterior", i);
                }
                exterior = ring;
                holes.clear();
            }
        }
    }
    RingLayout {
        orientation,
        nested,
    }
}
