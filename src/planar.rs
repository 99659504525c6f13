//! Planar tests on longitude/latitude coordinates (`x` = longitude, `y` = latitude).

use crate::types::{EPSILON, Point2D, Rect2D};

/// Relation of a ring to a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    None,
    /// Some ring edge crosses or touches a rectangle edge.
    Intersect,
    /// The rectangle lies inside the ring.
    RectInside,
    /// The ring lies inside the rectangle.
    PolyInside,
}

impl Containment {
    pub fn is_none(self) -> bool {
        self == Containment::None
    }
}

/// Does the horizontal ray from `t` toward +x cross edge `p1`–`p2`?
///
/// Half-open in `y`, so a ray through a shared vertex counts once.
#[inline]
pub fn ray_crossing(t: &Point2D, p1: &Point2D, p2: &Point2D) -> bool {
    ((p1.y > t.y) != (p2.y > t.y))
        && (t.x + EPSILON < (t.y - p2.y) * (p1.x - p2.x) / (p1.y - p2.y) + p2.x)
}

/// Consecutive edges of a ring, closing it if the last point differs from the first.
pub fn ring_edges(ring: &[Point2D]) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2).map(|w| (w[0], w[1])).chain(closing)
}

/// Even-odd point-in-ring test.
pub fn point_in_polygon(ring: &[Point2D], t: &Point2D) -> bool {
    ring_edges(ring).fold(false, |inside, (p1, p2)| inside ^ ray_crossing(t, &p1, &p2))
}

pub fn is_vertex(ring: &[Point2D], t: &Point2D) -> bool {
    ring.iter().any(|p| (p.x - t.x).abs() <= EPSILON && (p.y - t.y).abs() <= EPSILON)
}

fn orientation(a: &Point2D, b: &Point2D, c: &Point2D) -> i8 {
    let v = (*b - *a).cross(&(*c - *a));
    if v > EPSILON {
        1
    } else if v < -EPSILON {
        -1
    } else {
        0
    }
}

fn on_segment(a: &Point2D, b: &Point2D, p: &Point2D) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Closed segment intersection, touching and collinear overlap included.
pub fn segments_intersect(a: &Point2D, b: &Point2D, c: &Point2D, d: &Point2D) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    if o1 != o2 && o3 != o4 && o1 * o2 <= 0 && o3 * o4 <= 0 {
        return true;
    }
    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}

/// Classify a ring against a rectangle.
pub fn contains(ring: &[Point2D], rect: &Rect2D) -> Containment {
    if ring.is_empty() {
        return Containment::None;
    }
    let corners = rect.corners();
    for (p1, p2) in ring_edges(ring) {
        for i in 0..4 {
            if segments_intersect(&p1, &p2, &corners[i], &corners[(i + 1) % 4]) {
                return Containment::Intersect;
            }
        }
    }
    if point_in_polygon(ring, &corners[0]) {
        return Containment::RectInside;
    }
    if rect.contains(&ring[0]) {
        return Containment::PolyInside;
    }
    Containment::None
}

/// Does a polyline touch a rectangle?
pub fn polyline_intersects(line: &[Point2D], rect: &Rect2D) -> bool {
    if line.iter().any(|p| rect.contains(p)) {
        return true;
    }
    let corners = rect.corners();
    line.windows(2).any(|w| {
        (0..4).any(|i| segments_intersect(&w[0], &w[1], &corners[i], &corners[(i + 1) % 4]))
    })
}

/// Twice the signed area in the x/y plane, positive when counter-clockwise.
pub fn signed_area2(ring: &[Point2D]) -> f64 {
    ring_edges(ring).map(|(a, b)| a.cross(&b)).sum()
}
