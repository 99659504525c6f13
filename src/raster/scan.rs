//! Scan-line coverage of outlines on the leaf pixel grid.
//!
//! Outlines arrive in pixel units (unit square scaled by `max_id`). A pixel
//! is covered when its center lies inside by even-odd parity, or when some
//! outline edge passes through the closed pixel square.

use crate::planar::{ray_crossing, ring_edges};
use crate::types::Point2D;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Inclusive pixel column range.
pub type Span = (u32, u32);

type RowSpans = SmallVec<[Span; 4]>;

fn clamp_pixel(v: f64, max_id: u32) -> u32 {
    if !(v >= 0.0) {
        0
    } else if v >= (max_id - 1) as f64 {
        max_id - 1
    } else {
        v as u32
    }
}

/// Columns an edge passes through inside pixel row `row`, `None` when the
/// edge does not reach that row.
///
/// An edge occupies rows `floor(min y)..=floor(max y)`. Inside a row it is
/// clipped to the band `[row, row + 1]` and the floor of its x extent is taken.
pub fn edge_row_span(p1: &Point2D, p2: &Point2D, row: u32, max_id: u32) -> Option<Span> {
    let (lo, hi) = if p1.y <= p2.y { (p1, p2) } else { (p2, p1) };
    if row < clamp_pixel(lo.y.floor(), max_id) || row > clamp_pixel(hi.y.floor(), max_id) {
        return None;
    }
    let band_lo = row as f64;
    let band_hi = band_lo + 1.0;
    let (x0, x1) = if hi.y - lo.y <= f64::EPSILON {
        (lo.x, hi.x)
    } else {
        let x_at = |y: f64| {
            let t = ((y - lo.y) / (hi.y - lo.y)).clamp(0.0, 1.0);
            lo.x + (hi.x - lo.x) * t
        };
        (x_at(band_lo.max(lo.y)), x_at(band_hi.min(hi.y)))
    };
    let a = clamp_pixel(x0.min(x1).floor(), max_id);
    let b = clamp_pixel(x0.max(x1).floor(), max_id);
    Some((a, b))
}

/// Columns whose centers fall strictly between consecutive pairs of sorted crossings.
fn interior_spans(xs: &mut [f64], max_id: u32, out: &mut RowSpans) {
    xs.sort_by(|a, b| a.total_cmp(b));
    for pair in xs.chunks_exact(2) {
        let first = (pair[0] - 0.5).floor() + 1.0;
        let last = (pair[1] - 0.5).ceil() - 1.0;
        if first > last || last < 0.0 || first > (max_id - 1) as f64 {
            continue;
        }
        out.push((clamp_pixel(first, max_id), clamp_pixel(last, max_id)));
    }
}

fn merge(spans: &mut RowSpans) {
    spans.sort_unstable();
    let mut merged: RowSpans = SmallVec::with_capacity(spans.len());
    for &(a, b) in spans.iter() {
        match merged.last_mut() {
            Some(last) if a as u64 <= last.1 as u64 + 1 => last.1 = last.1.max(b),
            _ => merged.push((a, b)),
        }
    }
    *spans = merged;
}

/// Brute-force coverage of one pixel, the reference the scan table must agree with.
pub fn pixel_covered(rings: &[Vec<Point2D>], x: u32, y: u32, max_id: u32) -> bool {
    let center = Point2D::new(x as f64 + 0.5, y as f64 + 0.5);
    let inside = rings.iter().fold(false, |inside, ring| {
        ring_edges(ring).fold(inside, |acc, (p1, p2)| acc ^ ray_crossing(&center, &p1, &p2))
    });
    inside
        || rings.iter().any(|ring| {
            ring_edges(ring).any(|(p1, p2)| {
                edge_row_span(&p1, &p2, y, max_id).is_some_and(|(a, b)| a <= x && x <= b)
            })
        })
}

/// Sorted, merged covered spans per pixel row.
#[derive(Debug, Clone, Default)]
pub struct ScanTable {
    max_id: u32,
    rows: BTreeMap<u32, RowSpans>,
}

/// How much of a square block a table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Empty,
    Partial,
    Full,
}

impl ScanTable {
    pub fn new(max_id: u32) -> Self {
        Self {
            max_id,
            rows: BTreeMap::new(),
        }
    }

    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn span_count(&self) -> usize {
        self.rows.values().map(|s| s.len()).sum()
    }

    pub fn row(&self, y: u32) -> &[Span] {
        self.rows.get(&y).map_or(&[], |s| s.as_slice())
    }

    /// Add the area of an outline given in pixel units, restricted to rows `clip`.
    ///
    /// Several rings form one even-odd region, so a ring inside another cuts a hole.
    pub fn add_outline(&mut self, rings: &[Vec<Point2D>], clip: (u32, u32)) {
        let max_id = self.max_id;
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in rings.iter().flatten() {
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
        if !(y_min <= y_max) {
            return;
        }
        let first = clamp_pixel(y_min.floor(), max_id).max(clip.0);
        let last = clamp_pixel(y_max.floor(), max_id).min(clip.1);
        if first > last {
            return;
        }
        // Per row: parity crossings at the row center, then traced boundary spans.
        let height = (last - first + 1) as usize;
        let mut crossings: Vec<SmallVec<[f64; 8]>> = vec![SmallVec::new(); height];
        let mut traced: Vec<RowSpans> = vec![RowSpans::new(); height];
        for ring in rings {
            for (p1, p2) in ring_edges(ring) {
                let lo = clamp_pixel(p1.y.min(p2.y).floor(), max_id).max(first);
                let hi = clamp_pixel(p1.y.max(p2.y).floor(), max_id).min(last);
                if lo > hi {
                    continue;
                }
                for row in lo..=hi {
                    let slot = (row - first) as usize;
                    let yc = row as f64 + 0.5;
                    if (p1.y > yc) != (p2.y > yc) {
                        crossings[slot].push((yc - p2.y) * (p1.x - p2.x) / (p1.y - p2.y) + p2.x);
                    }
                    if let Some(span) = edge_row_span(&p1, &p2, row, max_id) {
                        traced[slot].push(span);
                    }
                }
            }
        }
        for (slot, (mut xs, mut spans)) in crossings.into_iter().zip(traced).enumerate() {
            interior_spans(&mut xs, max_id, &mut spans);
            if spans.is_empty() {
                continue;
            }
            let entry = self.rows.entry(first + slot as u32).or_default();
            entry.extend(spans);
            merge(entry);
        }
    }

    /// Cover every pixel of rows `first..=last`.
    pub fn add_rows(&mut self, first: u32, last: u32) {
        let full = self.max_id - 1;
        for row in first..=last.min(full) {
            self.rows.insert(row, SmallVec::from_slice(&[(0, full)]));
        }
    }

    /// Is pixel `(x, y)` covered?
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let spans = self.row(y);
        let i = spans.partition_point(|s| s.1 < x);
        i < spans.len() && spans[i].0 <= x
    }

    /// Coverage of the `w × w` block with lower-left pixel `(x0, y0)`.
    pub fn classify(&self, x0: u32, y0: u32, w: u32) -> Coverage {
        let x1 = x0 + (w - 1);
        let y1 = y0 + (w - 1);
        let mut full_rows = 0u32;
        let mut touched = false;
        for spans in self.rows.range(y0..=y1).map(|(_, s)| s) {
            let i = spans.partition_point(|s| s.1 < x0);
            let Some(&(a, b)) = spans.get(i) else {
                continue;
            };
            if a > x1 {
                continue;
            }
            touched = true;
            if a <= x0 && b >= x1 {
                full_rows += 1;
            } else {
                return Coverage::Partial;
            }
        }
        if !touched {
            Coverage::Empty
        } else if full_rows == w {
            Coverage::Full
        } else {
            Coverage::Partial
        }
    }
}
