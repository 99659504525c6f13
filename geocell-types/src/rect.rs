use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::fequal;
use crate::point::{Point2D, SpatialPoint};

/// A latitude/longitude box in degrees.
///
/// `min_lon > max_lon` describes a box that wraps across the antimeridian.
/// `min_lon = -180, max_lon = 180` is the whole longitude circle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpatialRect {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl SpatialRect {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// The whole sphere.
    pub const fn globe() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    /// Box spanned by two corners, latitude sorted and longitude taken as given.
    pub fn from_corners(p1: SpatialPoint, p2: SpatialPoint) -> Self {
        Self::new(
            p1.latitude.min(p2.latitude),
            p1.longitude,
            p1.latitude.max(p2.latitude),
            p2.longitude,
        )
    }

    /// True when the box has no area.
    pub fn is_null(&self) -> bool {
        if !(self.min_lat < self.max_lat) {
            return true;
        }
        if self.is_full_longitude() {
            return false;
        }
        // -180 and 180 are the same meridian.
        let seam = |lon: f64| if lon == 180.0 { -180.0 } else { lon };
        fequal(seam(self.min_lon), seam(self.max_lon))
    }

    pub fn is_valid(&self) -> bool {
        SpatialPoint::valid_latitude(self.min_lat)
            && SpatialPoint::valid_latitude(self.max_lat)
            && SpatialPoint::valid_longitude(self.min_lon)
            && SpatialPoint::valid_longitude(self.max_lon)
            && self.min_lat <= self.max_lat
    }

    pub fn cross_equator(&self) -> bool {
        self.min_lat < 0.0 && 0.0 < self.max_lat
    }

    pub fn is_full_longitude(&self) -> bool {
        self.min_lon == -180.0 && self.max_lon == 180.0
    }

    /// Eastward extent from `min_lon` to `max_lon` in degrees, `(0, 360]`.
    pub fn lon_width(&self) -> f64 {
        if self.is_full_longitude() {
            return 360.0;
        }
        let d = self.max_lon - self.min_lon;
        if d < 0.0 { d + 360.0 } else { d }
    }

    /// Corner `i` in counter-clockwise order starting at `(min_lat, min_lon)`.
    pub fn corner(&self, i: usize) -> SpatialPoint {
        match i % 4 {
            0 => SpatialPoint::new(self.min_lat, self.min_lon),
            1 => SpatialPoint::new(self.min_lat, self.max_lon),
            2 => SpatialPoint::new(self.max_lat, self.max_lon),
            _ => SpatialPoint::new(self.max_lat, self.min_lon),
        }
    }

    pub fn corners(&self) -> [SpatialPoint; 4] {
        [self.corner(0), self.corner(1), self.corner(2), self.corner(3)]
    }

    pub fn contains(&self, p: &SpatialPoint) -> bool {
        if p.latitude < self.min_lat || p.latitude > self.max_lat {
            return false;
        }
        if self.is_full_longitude() {
            return true;
        }
        if self.min_lon <= self.max_lon {
            self.min_lon <= p.longitude && p.longitude <= self.max_lon
        } else {
            p.longitude >= self.min_lon || p.longitude <= self.max_lon
        }
    }

    /// Planar `geo::Rect` (x = longitude); `None` for antimeridian-wrapping boxes.
    pub fn to_geo(&self) -> Option<Rect<f64>> {
        if self.min_lon > self.max_lon {
            return None;
        }
        Some(Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        ))
    }
}

/// Axis-aligned box on the projected plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect2D {
    pub min: Point2D,
    pub max: Point2D,
}

impl Rect2D {
    pub const fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// Bounding box of a point sequence, `None` when empty.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2D>,
    {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut rc = Rect2D::new(first, first);
        for p in it {
            rc.min.x = rc.min.x.min(p.x);
            rc.min.y = rc.min.y.min(p.y);
            rc.max.x = rc.max.x.max(p.x);
            rc.max.y = rc.max.y.max(p.y);
        }
        Some(rc)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Closed containment test.
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Corners counter-clockwise from `min`.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.min,
            Point2D::new(self.max.x, self.min.y),
            self.max,
            Point2D::new(self.min.x, self.max.y),
        ]
    }
}
