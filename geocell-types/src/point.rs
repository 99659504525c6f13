use geo::{Coord, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::{fequal, fzero};

/// A geographic position in degrees.
///
/// Latitude comes first, matching the on-disk point layout of the
/// `geography` column (`latitude f64, longitude f64`).
///
/// # Examples
///
/// ```
/// use geocell_types::point::SpatialPoint;
///
/// let p = SpatialPoint::new(90.0, 45.0);
/// assert!(p.is_pole());
/// assert!(p.matches(&SpatialPoint::new(90.0, -120.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl SpatialPoint {
    pub const MIN_LATITUDE: f64 = -90.0;
    pub const MAX_LATITUDE: f64 = 90.0;
    pub const MIN_LONGITUDE: f64 = -180.0;
    pub const MAX_LONGITUDE: f64 = 180.0;

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn valid_latitude(lat: f64) -> bool {
        (Self::MIN_LATITUDE..=Self::MAX_LATITUDE).contains(&lat)
    }

    pub fn valid_longitude(lon: f64) -> bool {
        (Self::MIN_LONGITUDE..=Self::MAX_LONGITUDE).contains(&lon)
    }

    pub fn is_valid(&self) -> bool {
        Self::valid_latitude(self.latitude) && Self::valid_longitude(self.longitude)
    }

    pub fn is_pole(&self) -> bool {
        fequal(self.latitude.abs(), 90.0)
    }

    /// Wrap a longitude around the ±180 meridian.
    pub fn norm_longitude(mut x: f64) -> f64 {
        while x > 180.0 {
            x -= 360.0;
        }
        while x < -180.0 {
            x += 360.0;
        }
        x
    }

    /// Wrap a latitude around the poles.
    ///
    /// ```
    /// use geocell_types::point::SpatialPoint;
    ///
    /// assert_eq!(SpatialPoint::norm_latitude(100.0), 80.0);
    /// assert_eq!(SpatialPoint::norm_latitude(-100.0 - 360.0), -80.0);
    /// ```
    pub fn norm_latitude(mut x: f64) -> f64 {
        while x > 180.0 {
            x -= 360.0;
        }
        while x < -180.0 {
            x += 360.0;
        }
        if x > 90.0 {
            x = 180.0 - x;
        } else if x < -90.0 {
            x = -180.0 - x;
        }
        x
    }

    pub fn normalize(&self) -> Self {
        Self::new(
            Self::norm_latitude(self.latitude),
            Self::norm_longitude(self.longitude),
        )
    }

    /// Approximate equality within the coordinate tolerance.
    pub fn equal(&self, other: &SpatialPoint) -> bool {
        fequal(self.latitude, other.latitude) && fequal(self.longitude, other.longitude)
    }

    /// Equality that treats every longitude at a pole, and ±180 on the
    /// antimeridian, as the same position.
    pub fn matches(&self, other: &SpatialPoint) -> bool {
        if !fequal(self.latitude, other.latitude) {
            return false;
        }
        if fequal(self.longitude, other.longitude) {
            return true;
        }
        if fequal(self.latitude.abs(), 90.0) {
            return true;
        }
        fequal(self.longitude.abs(), 180.0) && fequal(other.longitude.abs(), 180.0)
    }
}

impl From<SpatialPoint> for Point<f64> {
    fn from(p: SpatialPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl From<Point<f64>> for SpatialPoint {
    fn from(p: Point<f64>) -> Self {
        SpatialPoint::new(p.y(), p.x())
    }
}

/// Error returned when `POINT (lon lat)` text cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePointError(String);

impl fmt::Display for ParsePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid point text: {}", self.0)
    }
}

impl std::error::Error for ParsePointError {}

impl FromStr for SpatialPoint {
    type Err = ParsePointError;

    /// Read well-known text `POINT (lon lat)`, longitude first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s
            .get(..5)
            .filter(|head| head.eq_ignore_ascii_case("POINT"))
            .map(|_| s[5..].trim())
            .ok_or_else(|| ParsePointError(format!("expected POINT, got '{}'", s)))?;
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| ParsePointError(format!("expected parenthesized coordinates in '{}'", s)))?;
        let coords = inner
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ParsePointError(e.to_string()))?;
        match coords.as_slice() {
            [lon, lat] => {
                let p = SpatialPoint::new(*lat, *lon);
                if p.is_valid() {
                    Ok(p)
                } else {
                    Err(ParsePointError(format!("coordinates out of range in '{}'", s)))
                }
            }
            _ => Err(ParsePointError(format!(
                "expected 2 coordinates, got {}",
                coords.len()
            ))),
        }
    }
}

/// A position on the projected plane.
///
/// Globe projections land in `[0,1]×[0,1]`; the rasterizer reuses the same
/// type for pixel-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (*self - *other).length()
    }

    pub fn is_zero(&self) -> bool {
        fzero(self.x) && fzero(self.y)
    }

    /// Z component of the cross product.
    pub fn cross(&self, other: &Point2D) -> f64 {
        self.x * other.y - other.x * self.y
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, k: f64) -> Point2D {
        Point2D::new(self.x * k, self.y * k)
    }
}

impl From<Point2D> for Coord<f64> {
    fn from(p: Point2D) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

impl From<Coord<f64>> for Point2D {
    fn from(c: Coord<f64>) -> Self {
        Point2D::new(c.x, c.y)
    }
}
