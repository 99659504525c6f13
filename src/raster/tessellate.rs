//! Region outlines on the unit square.
//!
//! Rectangles are cut at the equator and at the quadrant meridians so every
//! piece stays inside one projection sector. Circles are sampled along
//! bearings, with an extra vertex wherever the boundary changes sector, and
//! split into one outline per hemisphere when they cross the equator.

use crate::config::Config;
use crate::error::{GeocellError, Result};
use crate::projection::{Hemisphere, QUADRANT_BOUNDARIES, Sector, project_in};
use crate::sphere::{EARTH_RADIUS, destination, haversine};
use crate::types::{Point2D, SpatialPoint, SpatialRect};
use smallvec::SmallVec;
use std::f64::consts::PI;

const RAD_TO_DEG: f64 = 180.0 / PI;

/// Rectangle parallels get at least this many intermediate points (odd).
const MIN_PARALLEL_POINTS: usize = 3;
/// Circle vertex counts are multiples of this.
const CIRCLE_POINTS_STEP: usize = 32;

/// A part of a covered region.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Even-odd rings on the unit square; rows limited to one hemisphere when set.
    Outline {
        rings: Vec<Vec<Point2D>>,
        hemisphere: Option<Hemisphere>,
    },
    /// A whole hemisphere.
    Hemisphere(Hemisphere),
}

impl Piece {
    fn outline(ring: Vec<Point2D>, hemisphere: Hemisphere) -> Self {
        Piece::Outline {
            rings: vec![ring],
            hemisphere: Some(hemisphere),
        }
    }
}

/// Border of a hemisphere's half of the square.
pub fn hemisphere_outline(h: Hemisphere) -> Vec<Point2D> {
    let (y0, y1) = match h {
        Hemisphere::North => (0.5, 1.0),
        Hemisphere::South => (0.0, 0.5),
    };
    vec![
        Point2D::new(0.0, y0),
        Point2D::new(1.0, y0),
        Point2D::new(1.0, y1),
        Point2D::new(0.0, y1),
    ]
}

/// Eastward `(start, end)` offsets from `min_lon`, cut at the quadrant meridians.
fn sector_spans(rc: &SpatialRect) -> SmallVec<[(f64, f64); 5]> {
    let width = rc.lon_width();
    let mut cuts: SmallVec<[f64; 4]> = QUADRANT_BOUNDARIES
        .iter()
        .map(|b| (b - rc.min_lon).rem_euclid(360.0))
        .filter(|&o| o > 0.0 && o < width)
        .collect();
    cuts.sort_by(|a, b| a.total_cmp(b));
    let mut spans = SmallVec::new();
    let mut start = 0.0;
    for cut in cuts {
        spans.push((start, cut));
        start = cut;
    }
    spans.push((start, width));
    spans
}

/// Walk a parallel from offset `a` to `b`, both ends included.
fn push_parallel(
    out: &mut Vec<Point2D>,
    lat: f64,
    min_lon: f64,
    (a, b): (f64, f64),
    h: Hemisphere,
    segment_meters: f64,
) {
    let at = |off: f64| SpatialPoint::new(lat, SpatialPoint::norm_longitude(min_lon + off));
    let dist = haversine(&at(a), &at(b));
    let extra = if segment_meters > 0.0 {
        (dist / segment_meters) as usize * 2
    } else {
        0
    };
    let num = MIN_PARALLEL_POINTS + extra;
    let step = (b - a) / (num + 1) as f64;
    for i in 0..=num + 1 {
        out.push(project_in(&at(a + step * i as f64), h));
    }
}

/// Outlines of a valid, non-null rectangle.
pub fn rect_pieces(rc: &SpatialRect, config: &Config) -> Vec<Piece> {
    let mut bands: SmallVec<[(f64, f64); 2]> = SmallVec::new();
    if rc.cross_equator() {
        bands.push((0.0, rc.max_lat));
        bands.push((rc.min_lat, 0.0));
    } else {
        bands.push((rc.min_lat, rc.max_lat));
    }
    let mut pieces = Vec::new();
    for (lo, hi) in bands {
        if !(lo < hi) {
            continue;
        }
        let h = Hemisphere::of_latitude((lo + hi) / 2.0);
        let touches_equator = lo == 0.0 || hi == 0.0;
        let reaches_pole = lo <= -90.0 || hi >= 90.0;
        if rc.is_full_longitude() && touches_equator && reaches_pole {
            pieces.push(Piece::Hemisphere(h));
            continue;
        }
        for span in sector_spans(rc) {
            let mut ring = Vec::new();
            push_parallel(&mut ring, lo, rc.min_lon, span, h, config.segment_meters);
            push_parallel(&mut ring, hi, rc.min_lon, (span.1, span.0), h, config.segment_meters);
            pieces.push(Piece::outline(ring, h));
        }
    }
    pieces
}

/// A circle boundary vertex.
#[derive(Debug, Clone, Copy)]
struct Sample {
    point: SpatialPoint,
    sector: Sector,
    /// Inserted where the boundary crosses the equator.
    equator: bool,
}

struct Circle<'c> {
    center: SpatialPoint,
    radius: f64,
    config: &'c Config,
}

impl Circle<'_> {
    fn at(&self, bearing: f64) -> SpatialPoint {
        destination(&self.center, self.radius, bearing)
    }

    /// Boundary point between bearings `lo` (in `from`) and `hi` (in `to`).
    fn sector_change(&self, mut lo: f64, mut hi: f64, from: Sector, to: Sector) -> Sample {
        let equator = from.hemisphere != to.hemisphere;
        let same_side = |p: &SpatialPoint| {
            let s = Sector::of(p);
            if equator {
                s.hemisphere == from.hemisphere
            } else {
                s == from
            }
        };
        for _ in 0..self.config.bisection_iterations {
            if haversine(&self.at(lo), &self.at(hi)) < self.config.bisection_tolerance_meters {
                break;
            }
            let mid = (lo + hi) / 2.0;
            if same_side(&self.at(mid)) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mut point = self.at((lo + hi) / 2.0);
        if equator {
            point.latitude = 0.0;
        }
        Sample {
            point,
            sector: from,
            equator,
        }
    }

    fn samples(&self) -> Vec<Sample> {
        let deg = RAD_TO_DEG * self.radius / EARTH_RADIUS;
        let per_degree = self.config.circle_points_per_degree.max(1) as f64;
        let steps = ((deg * per_degree / CIRCLE_POINTS_STEP as f64).ceil() as usize).max(1);
        let num = steps * CIRCLE_POINTS_STEP;
        let bx = 360.0 / num as f64;

        let first = self.at(0.0);
        let mut ring = Vec::with_capacity(num + 8);
        ring.push(Sample {
            point: first,
            sector: Sector::of(&first),
            equator: false,
        });
        let (mut prev_bearing, mut prev_sector) = (0.0, Sector::of(&first));
        for i in 1..=num {
            let bearing = bx * i as f64;
            let point = if i == num { first } else { self.at(bearing) };
            let sector = Sector::of(&point);
            if sector != prev_sector {
                ring.push(self.sector_change(prev_bearing, bearing, prev_sector, sector));
            }
            if i < num {
                ring.push(Sample {
                    point,
                    sector,
                    equator: false,
                });
            }
            prev_bearing = bearing;
            prev_sector = sector;
        }
        ring
    }
}

fn project_run<'a>(run: impl IntoIterator<Item = &'a Sample>, h: Hemisphere) -> Vec<Point2D> {
    run.into_iter().map(|s| project_in(&s.point, h)).collect()
}

/// Close a hemisphere run along the equator from `from_lon` to `to_lon`,
/// the way that passes `center_lon`, adding the square's corners on the way.
fn push_equator_path(
    out: &mut Vec<Point2D>,
    from_lon: f64,
    to_lon: f64,
    center_lon: f64,
    h: Hemisphere,
) {
    let off = |lon: f64| SpatialPoint::norm_longitude(lon - center_lon);
    let (a, b) = (off(from_lon), off(to_lon));
    let mut corners: SmallVec<[f64; 4]> = QUADRANT_BOUNDARIES
        .iter()
        .map(|&c| off(c))
        .filter(|&o| (o - a) * (o - b) < 0.0)
        .collect();
    if a < b {
        corners.sort_by(|x, y| x.total_cmp(y));
    } else {
        corners.sort_by(|x, y| y.total_cmp(x));
    }
    for o in corners {
        let p = SpatialPoint::new(0.0, SpatialPoint::norm_longitude(center_lon + o));
        out.push(project_in(&p, h));
    }
}

/// Outlines of a circle with `0 < radius < π·R` around a valid center.
pub fn circle_pieces(center: &SpatialPoint, radius: f64, config: &Config) -> Result<Vec<Piece>> {
    if !radius.is_finite() {
        return Err(GeocellError::invalid(format!("radius {} is not finite", radius)));
    }
    if !center.is_valid() {
        return Err(GeocellError::invalid(format!(
            "circle center ({}, {}) out of range",
            center.latitude, center.longitude
        )));
    }
    if radius >= PI * EARTH_RADIUS {
        return Ok(vec![
            Piece::Hemisphere(Hemisphere::North),
            Piece::Hemisphere(Hemisphere::South),
        ]);
    }
    if center.is_pole() {
        // A polar cap is a latitude band.
        let deg = RAD_TO_DEG * radius / EARTH_RADIUS;
        let rc = if center.latitude > 0.0 {
            SpatialRect::new(90.0 - deg, -180.0, 90.0, 180.0)
        } else {
            SpatialRect::new(-90.0, -180.0, deg - 90.0, 180.0)
        };
        return Ok(rect_pieces(&rc, config));
    }

    let circle = Circle {
        center: *center,
        radius,
        config,
    };
    let ring = circle.samples();
    let crossings: SmallVec<[usize; 2]> = ring
        .iter()
        .enumerate()
        .filter(|(_, s)| s.equator)
        .map(|(i, _)| i)
        .collect();
    let hc = Hemisphere::of_latitude(center.latitude);

    match crossings.as_slice() {
        [] => {
            let hb = ring[0].sector.hemisphere;
            let outline = project_run(&ring, hb);
            if hb == hc {
                Ok(vec![Piece::outline(outline, hb)])
            } else {
                // The cap swallows the center's hemisphere; the ring bounds a hole in the other.
                Ok(vec![
                    Piece::Hemisphere(hc),
                    Piece::Outline {
                        rings: vec![hemisphere_outline(hb), outline],
                        hemisphere: Some(hb),
                    },
                ])
            }
        }
        &[a, b] => {
            let first_run: Vec<&Sample> = ring[a..=b].iter().collect();
            let second_run: Vec<&Sample> = ring[b..].iter().chain(&ring[..=a]).collect();
            let mut pieces = Vec::with_capacity(2);
            for run in [first_run, second_run] {
                let (Some(start), Some(end), Some(inner)) = (run.first(), run.last(), run.get(1))
                else {
                    continue;
                };
                if inner.equator {
                    continue;
                }
                let h = inner.sector.hemisphere;
                let mut outline = project_run(run.iter().copied(), h);
                push_equator_path(
                    &mut outline,
                    end.point.longitude,
                    start.point.longitude,
                    center.longitude,
                    h,
                );
                pieces.push(Piece::outline(outline, h));
            }
            Ok(pieces)
        }
        other => {
            log::warn!(
                "circle boundary crosses the equator {} times, covering the globe",
                other.len()
            );
            Ok(vec![
                Piece::Hemisphere(Hemisphere::North),
                Piece::Hemisphere(Hemisphere::South),
            ])
        }
    }
}
