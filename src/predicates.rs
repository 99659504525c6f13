//! Exact predicates on parsed geography values.

use crate::geometry::{GeoValue, GeometryKind, PointSeq};
use crate::planar::{self, Containment};
use crate::sphere::{self, INFINITY};
use crate::types::{Point2D, Rect2D, SpatialPoint, SpatialRect};

fn planar_point(p: &SpatialPoint) -> Point2D {
    Point2D::new(p.longitude, p.latitude)
}

/// Planar pieces of a rectangle, two when it wraps the antimeridian.
fn rect_pieces(rc: &SpatialRect) -> Vec<Rect2D> {
    let piece = |min_lon: f64, max_lon: f64| {
        Rect2D::new(
            Point2D::new(min_lon, rc.min_lat),
            Point2D::new(max_lon, rc.max_lat),
        )
    };
    if rc.is_full_longitude() || rc.min_lon <= rc.max_lon {
        vec![piece(rc.min_lon, rc.max_lon)]
    } else {
        vec![piece(rc.min_lon, 180.0), piece(-180.0, rc.max_lon)]
    }
}

fn ring_contains(ring: &PointSeq<'_>, t: &Point2D) -> bool {
    planar::point_in_polygon(&ring.to_planar(), t)
}

impl GeoValue<'_> {
    /// Does the value contain `p`?
    ///
    /// Points match exactly, polygons use even-odd ray crossing, and a
    /// multipolygon contains `p` when some exterior ring holds it and none of
    /// that ring's holes does. Open lines never contain a point.
    pub fn st_contains(&self, p: &SpatialPoint) -> bool {
        let t = planar_point(p);
        match self.kind() {
            GeometryKind::Point => self.points().first().is_some_and(|q| q.matches(p)),
            GeometryKind::Polygon => ring_contains(&self.points(), &t),
            GeometryKind::LineString => {
                let seq = self.points();
                let closed = seq.len() >= 4
                    && matches!((seq.first(), seq.last()), (Some(a), Some(b)) if a.equal(&b));
                closed && ring_contains(&seq, &t)
            }
            GeometryKind::MultiPolygon => match self.shells() {
                Ok(shells) => shells.iter().any(|(exterior, holes)| {
                    self.subobject(*exterior)
                        .is_some_and(|ring| ring_contains(&ring, &t))
                        && !holes.iter().any(|h| {
                            self.subobject(*h)
                                .is_some_and(|ring| ring_contains(&ring, &t))
                        })
                }),
                Err(e) => {
                    log::warn!("st_contains: {}", e);
                    false
                }
            },
            GeometryKind::LineSegment | GeometryKind::MultiLineString => false,
        }
    }

    /// Distance in meters from `p` to the value, [`INFINITY`] when undefined.
    pub fn st_distance(&self, p: &SpatialPoint) -> f64 {
        match self.kind() {
            GeometryKind::Point => self
                .points()
                .first()
                .map_or(INFINITY, |q| sphere::haversine(&q, p)),
            GeometryKind::LineSegment | GeometryKind::LineString => {
                sphere::track_distance(&self.points().to_vec(), p, true)
            }
            GeometryKind::Polygon => {
                if self.st_contains(p) {
                    0.0
                } else {
                    sphere::track_distance(&self.points().to_vec(), p, true)
                }
            }
            GeometryKind::MultiLineString => self.min_part_distance(p),
            GeometryKind::MultiPolygon => {
                if let Err(e) = self.ring_orientation() {
                    log::warn!("st_distance: {}", e);
                    return INFINITY;
                }
                if self.st_contains(p) {
                    0.0
                } else {
                    self.min_part_distance(p)
                }
            }
        }
    }

    fn min_part_distance(&self, p: &SpatialPoint) -> f64 {
        self.parts()
            .map(|part| sphere::track_distance(&part.to_vec(), p, true))
            .fold(INFINITY, f64::min)
    }

    /// Does the value touch the rectangle?
    pub fn st_intersects(&self, rc: &SpatialRect) -> bool {
        if rc.is_null() || !rc.is_valid() {
            return false;
        }
        let pieces = rect_pieces(rc);
        match self.kind() {
            GeometryKind::Point => self.points().first().is_some_and(|q| rc.contains(&q)),
            GeometryKind::LineSegment | GeometryKind::LineString | GeometryKind::MultiLineString => {
                self.parts().any(|part| {
                    let line = part.to_planar();
                    pieces.iter().any(|r| planar::polyline_intersects(&line, r))
                })
            }
            GeometryKind::Polygon => {
                let ring = self.points().to_planar();
                pieces.iter().any(|r| !planar::contains(&ring, r).is_none())
            }
            GeometryKind::MultiPolygon => match self.shells() {
                Ok(shells) => shells.iter().any(|(exterior, holes)| {
                    let Some(ring) = self.subobject(*exterior) else {
                        return false;
                    };
                    let ring = ring.to_planar();
                    let holes: Vec<Vec<Point2D>> = holes
                        .iter()
                        .filter_map(|h| self.subobject(*h))
                        .map(|h| h.to_planar())
                        .collect();
                    pieces.iter().any(|r| match planar::contains(&ring, r) {
                        Containment::None => false,
                        Containment::Intersect | Containment::PolyInside => true,
                        Containment::RectInside => !holes
                            .iter()
                            .any(|h| planar::contains(h, r) == Containment::RectInside),
                    })
                }),
                Err(e) => {
                    log::warn!("st_intersects: {}", e);
                    false
                }
            },
        }
    }

    /// Great-circle length in meters; ring perimeters for polygons.
    pub fn st_length(&self) -> f64 {
        match self.kind() {
            GeometryKind::Point => 0.0,
            _ => self
                .parts()
                .map(|part| sphere::track_length(&part.to_vec()))
                .sum(),
        }
    }
}
