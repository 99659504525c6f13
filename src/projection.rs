//! Globe to unit-square projection.
//!
//! The sphere is cut into 8 sectors: 2 hemispheres × 4 longitude quadrants
//! of 90° centered on 0, 90, 180 and -90. Inside a sector the point is
//! mapped gnomonically onto the plane through `(1,0,0)`, `(0,1,0)`,
//! `(0,0,1)` and the resulting triangle is placed affinely into the unit
//! square. Each hemisphere fills a `1 × 0.5` half of the square with its
//! pole at the center of that half and the equator along the border:
//!
//! ```text
//!  y=1  +-----------------+
//!       |\      q1       /|
//!       |  \           /  |
//!       |q2  (N pole)  q0 |
//!       |  /           \  |
//!       |/      q3       \|
//!  y=.5 +-----------------+
//!       |\      q3       /|
//!       |q2  (S pole)  q0 |
//!       |/      q1       \|
//!  y=0  +-----------------+
//!      x=0               x=1
//! ```
//!
//! Great circles stay straight inside a sector, and neighboring sectors of
//! the same hemisphere share their border, so outlines drawn in this plane
//! only need an extra vertex where they cross a quadrant boundary.

use crate::types::{Point2D, SpatialPoint};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;
const EPSILON: f64 = 1e-12;

/// `atan2(1, 2)`, half opening angle of the q0/q2 sector seen from a pole.
pub const ATAN_1_2: f64 = 0.463_647_609_000_806_1;

/// Longitudes where the quadrants meet, ascending.
pub const QUADRANT_BOUNDARIES: [f64; 4] = [-135.0, -45.0, 45.0, 135.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    /// Latitude `[0, 90]`.
    North,
    /// Latitude `[-90, 0)`.
    South,
}

impl Hemisphere {
    pub fn of_latitude(lat: f64) -> Self {
        if lat >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    /// Which half of the unit square a projected point lies in.
    pub fn of_point(p: &Point2D) -> Self {
        if p.y >= 0.5 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    /// Projected position of this hemisphere's pole.
    pub fn pole(self) -> Point2D {
        match self {
            Hemisphere::North => Point2D::new(0.5, 0.75),
            Hemisphere::South => Point2D::new(0.5, 0.25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    /// `[-45, 45)`
    Q0 = 0,
    /// `[45, 135)`
    Q1 = 1,
    /// `[135, 180] ∪ [-180, -135)`
    Q2 = 2,
    /// `[-135, -45)`
    Q3 = 3,
}

impl Quadrant {
    pub fn of_longitude(x: f64) -> Self {
        debug_assert!(SpatialPoint::valid_longitude(x));
        if x >= 0.0 {
            if x < 45.0 {
                return Quadrant::Q0;
            }
            if x < 135.0 {
                return Quadrant::Q1;
            }
        } else {
            if x >= -45.0 {
                return Quadrant::Q0;
            }
            if x >= -135.0 {
                return Quadrant::Q3;
            }
        }
        Quadrant::Q2
    }

    fn is_odd(self) -> bool {
        matches!(self, Quadrant::Q1 | Quadrant::Q3)
    }
}

/// Hemisphere and quadrant of a globe position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sector {
    pub hemisphere: Hemisphere,
    pub quadrant: Quadrant,
}

impl Sector {
    pub fn of(p: &SpatialPoint) -> Self {
        Self {
            hemisphere: Hemisphere::of_latitude(p.latitude),
            quadrant: Quadrant::of_longitude(p.longitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point3D {
    x: f64,
    y: f64,
    z: f64,
}

impl Point3D {
    const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn dot(&self, other: &Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    fn normalize(&self) -> Point3D {
        let len = self.length();
        debug_assert!(len > 0.0);
        Point3D::new(self.x / len, self.y / len, self.z / len)
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, k: f64) -> Point3D {
        Point3D::new(self.x * k, self.y * k, self.z * k)
    }
}

const E1: Point3D = Point3D::new(1.0, 0.0, 0.0);
const SQRT_2: f64 = std::f64::consts::SQRT_2;
// sqrt(1.5)
const SQRT_1_5: f64 = 1.224_744_871_391_589;
const INV_SQRT_3: f64 = 0.577_350_269_189_625_8;

// Plane normal, (1,1,1) normalized.
const PLANE_N: Point3D = Point3D::new(INV_SQRT_3, INV_SQRT_3, INV_SQRT_3);
// Facet axes: e1 -> e2 and mid(e1,e2) -> e3, normalized.
const AXIS_X: Point3D = Point3D::new(-1.0 / SQRT_2, 1.0 / SQRT_2, 0.0);
const AXIS_Y: Point3D = Point3D::new(-0.5 / SQRT_1_5, -0.5 / SQRT_1_5, 1.0 / SQRT_1_5);
const SCALE_02: Point2D = Point2D::new(0.5 / SQRT_2, 0.5 / SQRT_1_5);
const SCALE_13: Point2D = Point2D::new(1.0 / SQRT_2, 0.25 / SQRT_1_5);

fn fatan2(y: f64, x: f64) -> f64 {
    if x == 0.0 && y == 0.0 { 0.0 } else { y.atan2(x) }
}

/// Rotate a longitude into the 0..=90 local angle of its quadrant.
pub fn longitude_meridian(x: f64, q: Quadrant) -> f64 {
    if x >= 0.0 {
        match q {
            Quadrant::Q0 => x + 45.0,
            Quadrant::Q1 => x - 45.0,
            _ => x - 135.0,
        }
    } else {
        match q {
            Quadrant::Q0 => x + 45.0,
            Quadrant::Q3 => x + 135.0,
            _ => x + 225.0,
        }
    }
}

pub fn reverse_longitude_meridian(x: f64, q: Quadrant) -> f64 {
    match q {
        Quadrant::Q0 => x - 45.0,
        Quadrant::Q1 => x + 45.0,
        Quadrant::Q2 => {
            if x <= 45.0 {
                x + 135.0
            } else {
                x - 225.0
            }
        }
        Quadrant::Q3 => x - 135.0,
    }
}

fn cartesian(lat: f64, lon: f64) -> Point3D {
    let l = (lat * DEG_TO_RAD).cos();
    Point3D::new(
        l * (lon * DEG_TO_RAD).cos(),
        l * (lon * DEG_TO_RAD).sin(),
        (lat * DEG_TO_RAD).sin(),
    )
}

fn reverse_cartesian(p: &Point3D) -> SpatialPoint {
    let latitude = if p.z >= 1.0 - EPSILON {
        90.0
    } else if p.z <= -1.0 + EPSILON {
        -90.0
    } else {
        p.z.asin() * RAD_TO_DEG
    };
    SpatialPoint::new(latitude, fatan2(p.y, p.x) * RAD_TO_DEG)
}

/// Ray from the origin through `(lat, meridian)` hitting the facet plane.
fn line_plane_intersect(lat: f64, meridian: f64) -> Point3D {
    let ray = cartesian(lat, meridian);
    let n_u = ray.dot(&PLANE_N);
    debug_assert!(n_u > 0.0);
    ray * (PLANE_N.x / n_u)
}

fn scale_plane_intersect(p3: Point3D, q: Quadrant, h: Hemisphere) -> Point2D {
    let v = p3 - E1;
    let mut p2 = Point2D::new(v.dot(&AXIS_X), v.dot(&AXIS_Y));
    let scale = if q.is_odd() { SCALE_13 } else { SCALE_02 };
    p2.x *= scale.x;
    p2.y *= scale.y;
    match (h, q) {
        (Hemisphere::North, Quadrant::Q0) => Point2D::new(1.0 - p2.y, 0.5 + p2.x),
        (Hemisphere::North, Quadrant::Q1) => Point2D::new(1.0 - p2.x, 1.0 - p2.y),
        (Hemisphere::North, Quadrant::Q2) => Point2D::new(p2.y, 1.0 - p2.x),
        (Hemisphere::North, Quadrant::Q3) => Point2D::new(p2.x, 0.5 + p2.y),
        (Hemisphere::South, Quadrant::Q0) => Point2D::new(1.0 - p2.y, 0.5 - p2.x),
        (Hemisphere::South, Quadrant::Q1) => Point2D::new(1.0 - p2.x, p2.y),
        (Hemisphere::South, Quadrant::Q2) => Point2D::new(p2.y, p2.x),
        (Hemisphere::South, Quadrant::Q3) => Point2D::new(p2.x, 0.5 - p2.y),
    }
}

fn reverse_scale_plane_intersect(ret: &Point2D, q: Quadrant, h: Hemisphere) -> Point3D {
    let mut p2 = match (h, q) {
        (Hemisphere::North, Quadrant::Q0) => Point2D::new(ret.y - 0.5, 1.0 - ret.x),
        (Hemisphere::North, Quadrant::Q1) => Point2D::new(1.0 - ret.x, 1.0 - ret.y),
        (Hemisphere::North, Quadrant::Q2) => Point2D::new(1.0 - ret.y, ret.x),
        (Hemisphere::North, Quadrant::Q3) => Point2D::new(ret.x, ret.y - 0.5),
        (Hemisphere::South, Quadrant::Q0) => Point2D::new(0.5 - ret.y, 1.0 - ret.x),
        (Hemisphere::South, Quadrant::Q1) => Point2D::new(1.0 - ret.x, ret.y),
        (Hemisphere::South, Quadrant::Q2) => Point2D::new(ret.y, ret.x),
        (Hemisphere::South, Quadrant::Q3) => Point2D::new(ret.x, 0.5 - ret.y),
    };
    let scale = if q.is_odd() { SCALE_13 } else { SCALE_02 };
    p2.x /= scale.x;
    p2.y /= scale.y;
    E1 + AXIS_X * p2.x + AXIS_Y * p2.y
}

/// Quadrant of a projected point, by its angle around the hemisphere's pole.
pub fn point_quadrant(p: &Point2D) -> Quadrant {
    let h = Hemisphere::of_point(p);
    let v = *p - h.pole();
    let mut arg = fatan2(v.y, v.x);
    if h == Hemisphere::South {
        arg = -arg;
    }
    if arg >= 0.0 {
        if arg <= ATAN_1_2 {
            return Quadrant::Q0;
        }
        if arg <= PI - ATAN_1_2 {
            return Quadrant::Q1;
        }
    } else {
        if arg >= -ATAN_1_2 {
            return Quadrant::Q0;
        }
        if arg >= ATAN_1_2 - PI {
            return Quadrant::Q3;
        }
    }
    Quadrant::Q2
}

/// Project into a chosen hemisphere's half of the square.
///
/// Only meaningful for points of that hemisphere or on the equator; the
/// rasterizer uses it to place equator vertices on the correct border.
pub fn project_in(p: &SpatialPoint, h: Hemisphere) -> Point2D {
    debug_assert!(p.is_valid());
    let q = Quadrant::of_longitude(p.longitude);
    let meridian = longitude_meridian(p.longitude, q);
    let lat = match h {
        Hemisphere::North => p.latitude,
        Hemisphere::South => -p.latitude,
    };
    scale_plane_intersect(line_plane_intersect(lat, meridian), q, h)
}

/// Globe position to unit-square point.
///
/// # Examples
///
/// ```
/// use geocell::projection::{project, unproject};
/// use geocell::SpatialPoint;
///
/// let p = SpatialPoint::new(55.7558, 37.6173);
/// let back = unproject(&project(&p));
/// assert!((back.latitude - p.latitude).abs() < 1e-9);
/// assert!((back.longitude - p.longitude).abs() < 1e-9);
/// ```
pub fn project(p: &SpatialPoint) -> Point2D {
    project_in(p, Hemisphere::of_latitude(p.latitude))
}

/// Unit-square point back to the globe. Poles come back with longitude 0.
pub fn unproject(p: &Point2D) -> SpatialPoint {
    let q = point_quadrant(p);
    let h = Hemisphere::of_point(p);
    let p3 = reverse_scale_plane_intersect(p, q, h);
    let mut ret = reverse_cartesian(&p3.normalize());
    if h == Hemisphere::South {
        ret.latitude = -ret.latitude;
    }
    if (ret.latitude.abs() - 90.0).abs() <= EPSILON {
        ret.longitude = 0.0;
    } else {
        ret.longitude = SpatialPoint::norm_longitude(reverse_longitude_meridian(ret.longitude, q));
    }
    ret
}
