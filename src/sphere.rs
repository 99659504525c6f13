//! Great-circle formulas on a spherical earth.
//!
//! Distances are meters, angles degrees. Bearings are clockwise from north.

use crate::config::EarthModel;
use crate::types::{SpatialPoint, fzero};
use std::f64::consts::PI;

/// Mean earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;
/// WGS84 semi-major axis.
pub const EQUATOR_RADIUS: f64 = 6_378_137.0;
/// WGS84 semi-minor axis.
pub const POLAR_RADIUS: f64 = 6_356_752.3142;

/// Sentinel for "no distance found".
pub const INFINITY: f64 = f64::MAX;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

#[inline]
fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Earth radius at a latitude.
pub fn earth_radius(lat: f64, model: EarthModel) -> f64 {
    match model {
        EarthModel::Sphere => EARTH_RADIUS,
        EarthModel::Ellipsoid => {
            EQUATOR_RADIUS - (EQUATOR_RADIUS - POLAR_RADIUS) * (lat * DEG_TO_RAD).sin().abs()
        }
    }
}

pub fn haversine_with_radius(p1: &SpatialPoint, p2: &SpatialPoint, radius: f64) -> f64 {
    let lat1 = p1.latitude * DEG_TO_RAD;
    let lat2 = p2.latitude * DEG_TO_RAD;
    let dlat = lat2 - lat1;
    let dlon = (p2.longitude - p1.longitude) * DEG_TO_RAD;
    let sin_lat = (dlat / 2.0).sin();
    let sin_lon = (dlon / 2.0).sin();
    let a = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    2.0 * a.sqrt().min(1.0).asin() * radius
}

/// Haversine distance on the mean-radius sphere.
///
/// # Examples
///
/// ```
/// use geocell::sphere::haversine;
/// use geocell::SpatialPoint;
///
/// let d = haversine(&SpatialPoint::new(0.0, 0.0), &SpatialPoint::new(0.0, 1.0));
/// assert!((d - 111_194.9).abs() < 1.0);
/// ```
pub fn haversine(p1: &SpatialPoint, p2: &SpatialPoint) -> f64 {
    haversine_with_radius(p1, p2, EARTH_RADIUS)
}

/// Haversine distance with the radius taken at the mean latitude of the pair.
pub fn distance(p1: &SpatialPoint, p2: &SpatialPoint, model: EarthModel) -> f64 {
    let radius = earth_radius((p1.latitude + p2.latitude) / 2.0, model);
    haversine_with_radius(p1, p2, radius)
}

/// Spherical law of cosines. Less accurate than haversine for short distances.
pub fn spherical_cosines(p1: &SpatialPoint, p2: &SpatialPoint) -> f64 {
    let lat1 = p1.latitude * DEG_TO_RAD;
    let lat2 = p2.latitude * DEG_TO_RAD;
    let dlon = (p2.longitude - p1.longitude) * DEG_TO_RAD;
    let c = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
    clamp_unit(c).acos() * EARTH_RADIUS
}

/// Point reached from `p` after `distance` meters along initial `bearing`.
pub fn destination(p: &SpatialPoint, distance: f64, bearing: f64) -> SpatialPoint {
    if !(distance > 0.0) {
        return *p;
    }
    let lat1 = p.latitude * DEG_TO_RAD;
    let lon1 = p.longitude * DEG_TO_RAD;
    let brng = bearing * DEG_TO_RAD;
    let d = distance / EARTH_RADIUS;
    let lat2 = clamp_unit(lat1.sin() * d.cos() + lat1.cos() * d.sin() * brng.cos()).asin();
    let lon2 = if p.is_pole() {
        // Every direction from a pole runs along a meridian.
        SpatialPoint::norm_longitude(bearing) * DEG_TO_RAD
    } else {
        let y = brng.sin() * d.sin() * lat1.cos();
        let x = d.cos() - lat1.sin() * lat2.sin();
        lon1 + y.atan2(x)
    };
    SpatialPoint::new(lat2 * RAD_TO_DEG, lon2 * RAD_TO_DEG).normalize()
}

/// Initial bearing from `p1` to `p2` in `[0, 360)`.
pub fn course_between_points(p1: &SpatialPoint, p2: &SpatialPoint) -> f64 {
    if p1.is_pole() {
        return if p1.latitude > 0.0 { 180.0 } else { 0.0 };
    }
    let lat1 = p1.latitude * DEG_TO_RAD;
    let lat2 = p2.latitude * DEG_TO_RAD;
    let dlon = (p1.longitude - p2.longitude) * DEG_TO_RAD;
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let mut course = -y.atan2(x) * RAD_TO_DEG;
    if fzero(course) {
        course = 0.0;
    } else if course < 0.0 {
        course += 360.0;
    }
    if course >= 360.0 { course - 360.0 } else { course }
}

/// Distance from `d` to the great-circle segment `a`–`b`.
///
/// When the perpendicular foot falls outside the segment the distance to
/// the nearer endpoint is returned instead.
pub fn cross_track_distance(a: &SpatialPoint, b: &SpatialPoint, d: &SpatialPoint) -> f64 {
    if a.is_pole() {
        return haversine(d, &SpatialPoint::new(d.latitude, b.longitude));
    }
    let d_ad = haversine(a, d);
    if fzero(d_ad) {
        return 0.0;
    }
    let c_ad = course_between_points(a, d);
    let c_ab = course_between_points(a, b);
    let mut angle = (c_ad - c_ab).abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    if angle > 90.0 {
        return d_ad;
    }
    let xtd = clamp_unit((d_ad / EARTH_RADIUS).sin() * (angle * DEG_TO_RAD).sin())
        .asin()
        .abs();
    let cos_xtd = xtd.cos();
    let atd = if fzero(cos_xtd) {
        0.0
    } else {
        clamp_unit((d_ad / EARTH_RADIUS).cos() / cos_xtd).acos().abs() * EARTH_RADIUS
    };
    let d_ab = haversine(a, b);
    if d_ab <= atd {
        return haversine(b, d);
    }
    xtd * EARTH_RADIUS
}

/// Lower bound on the distance from `p` to segment `a`–`b`, from latitudes alone.
///
/// An arc with both ends in one hemisphere only bulges toward that pole, so
/// its latitude never drops past the endpoint nearer the equator.
fn latitude_bound(a: &SpatialPoint, b: &SpatialPoint, p: &SpatialPoint) -> f64 {
    let lo = a.latitude.min(b.latitude);
    let hi = a.latitude.max(b.latitude);
    let gap = if lo >= 0.0 && p.latitude < lo {
        lo - p.latitude
    } else if hi <= 0.0 && p.latitude > hi {
        p.latitude - hi
    } else {
        0.0
    };
    gap * DEG_TO_RAD * EARTH_RADIUS
}

/// Minimum distance from `p` to a polyline.
///
/// With `prune` set, segments whose latitude band already proves them
/// farther than the best distance so far are skipped.
pub fn track_distance(track: &[SpatialPoint], p: &SpatialPoint, prune: bool) -> f64 {
    match track {
        [] => INFINITY,
        [single] => haversine(single, p),
        _ => {
            let mut best = INFINITY;
            for seg in track.windows(2) {
                if prune && latitude_bound(&seg[0], &seg[1], p) >= best {
                    continue;
                }
                let d = cross_track_distance(&seg[0], &seg[1], p);
                if d < best {
                    best = d;
                    if fzero(best) {
                        break;
                    }
                }
            }
            best
        }
    }
}

/// Great-circle length of a polyline.
pub fn track_length(track: &[SpatialPoint]) -> f64 {
    track.windows(2).map(|s| haversine(&s[0], &s[1])).sum()
}
