//! Well-known text output for [`GeoValue`] and a reader producing encoded values.

use super::layout::{self, TAIL_LINES, TAIL_RINGS};
use super::{GeoValue, GeometryKind, PointSeq};
use crate::error::{GeocellError, Result};
use crate::types::SpatialPoint;
use std::fmt::Write;

fn write_coords(out: &mut String, seq: &PointSeq<'_>) {
    out.push('(');
    for (i, p) in seq.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", p.longitude, p.latitude);
    }
    out.push(')');
}

fn write_group<'b>(out: &mut String, seqs: impl IntoIterator<Item = PointSeq<'b>>) {
    out.push('(');
    for (i, seq) in seqs.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coords(out, &seq);
    }
    out.push(')');
}

impl GeoValue<'_> {
    /// Well-known text, longitude before latitude.
    ///
    /// A multipolygon with a single exterior ring renders as `POLYGON`.
    pub fn st_as_text(&self) -> String {
        let mut out = String::new();
        match self.kind() {
            GeometryKind::Point => {
                let p = self.points().first().unwrap_or_default();
                let _ = write!(out, "POINT ({} {})", p.longitude, p.latitude);
            }
            GeometryKind::LineSegment | GeometryKind::LineString => {
                out.push_str("LINESTRING ");
                write_coords(&mut out, &self.points());
            }
            GeometryKind::Polygon => {
                out.push_str("POLYGON ");
                write_group(&mut out, [self.points()]);
            }
            GeometryKind::MultiLineString => {
                out.push_str("MULTILINESTRING ");
                write_group(&mut out, self.parts());
            }
            GeometryKind::MultiPolygon => match self.shells() {
                Ok(shells) if shells.len() == 1 => {
                    out.push_str("POLYGON ");
                    write_group(&mut out, self.parts());
                }
                Ok(shells) => {
                    out.push_str("MULTIPOLYGON (");
                    for (i, (exterior, holes)) in shells.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let rings = std::iter::once(*exterior)
                            .chain(holes.iter().copied())
                            .filter_map(|r| self.subobject(r));
                        write_group(&mut out, rings);
                    }
                    out.push(')');
                }
                Err(e) => {
                    log::warn!("rendering rings as one polygon: {}", e);
                    out.push_str("POLYGON ");
                    write_group(&mut out, self.parts());
                }
            },
        }
        out
    }
}

/// Parenthesized coordinate tree.
#[derive(Debug)]
enum Node {
    Coord(SpatialPoint),
    List(Vec<Node>),
}

struct Cursor<'s> {
    text: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.text[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += c.len_utf8();
                Ok(())
            }
            found => Err(GeocellError::parse(format!(
                "expected '{}' at {}, found {:?}",
                c, self.pos, found
            ))),
        }
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        let len = rest
            .find(|c: char| c.is_whitespace() || c == ',' || c == ')' || c == '(')
            .unwrap_or(rest.len());
        let value = rest[..len]
            .parse::<f64>()
            .map_err(|e| GeocellError::parse(format!("bad number '{}': {}", &rest[..len], e)))?;
        self.pos += len;
        Ok(value)
    }

    fn coord(&mut self) -> Result<SpatialPoint> {
        let lon = self.number()?;
        let lat = self.number()?;
        let p = SpatialPoint::new(lat, lon);
        if !p.is_valid() {
            return Err(GeocellError::parse(format!(
                "coordinate ({} {}) out of range",
                lon, lat
            )));
        }
        Ok(p)
    }

    fn list(&mut self) -> Result<Node> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            let item = if self.peek() == Some('(') {
                self.list()?
            } else {
                Node::Coord(self.coord()?)
            };
            items.push(item);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Ok(Node::List(items));
                }
                found => {
                    return Err(GeocellError::parse(format!(
                        "expected ',' or ')' at {}, found {:?}",
                        self.pos, found
                    )));
                }
            }
        }
    }
}

fn coords(node: Node) -> Result<Vec<SpatialPoint>> {
    match node {
        Node::List(items) => items
            .into_iter()
            .map(|item| match item {
                Node::Coord(p) => Ok(p),
                Node::List(_) => Err(GeocellError::parse("unexpected nested list")),
            })
            .collect(),
        Node::Coord(_) => Err(GeocellError::parse("expected a coordinate list")),
    }
}

fn lists(node: Node) -> Result<Vec<Node>> {
    match node {
        Node::List(items) if items.iter().all(|i| matches!(i, Node::List(_))) => Ok(items),
        _ => Err(GeocellError::parse("expected a list of lists")),
    }
}

fn ring(node: Node) -> Result<Vec<SpatialPoint>> {
    let ring = coords(node)?;
    match (ring.first(), ring.last()) {
        (Some(a), Some(b)) if ring.len() >= 4 && a.equal(b) => Ok(ring),
        _ => Err(GeocellError::parse(format!(
            "ring of {} points is not closed",
            ring.len()
        ))),
    }
}

fn line(node: Node) -> Result<Vec<SpatialPoint>> {
    let line = coords(node)?;
    if line.len() < 2 {
        return Err(GeocellError::parse("line string needs at least 2 points"));
    }
    Ok(line)
}

/// Encode well-known text as a `geography` value.
///
/// Supports `POINT`, `LINESTRING`, `POLYGON`, `MULTILINESTRING` and
/// `MULTIPOLYGON`. Coordinates are `lon lat`.
pub fn parse(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let split = text.find('(').unwrap_or(text.len());
    let keyword = text[..split].trim().to_ascii_uppercase();
    let mut cursor = Cursor { text, pos: split };
    let parse_body = |cursor: &mut Cursor<'_>| -> Result<Node> {
        let node = cursor.list()?;
        if cursor.peek().is_some() {
            return Err(GeocellError::parse(format!(
                "trailing text after position {}",
                cursor.pos
            )));
        }
        Ok(node)
    };
    match keyword.as_str() {
        "POINT" => {
            let p = text.parse::<SpatialPoint>().map_err(|e| GeocellError::parse(e.to_string()))?;
            Ok(layout::encode_point(&p))
        }
        "LINESTRING" => Ok(layout::encode_linestring(&line(parse_body(&mut cursor)?)?)),
        "POLYGON" => {
            let rings = lists(parse_body(&mut cursor)?)?
                .into_iter()
                .map(ring)
                .collect::<Result<Vec<_>>>()?;
            Ok(layout::encode_parts(&rings, TAIL_RINGS))
        }
        "MULTILINESTRING" => {
            let lines = lists(parse_body(&mut cursor)?)?
                .into_iter()
                .map(line)
                .collect::<Result<Vec<_>>>()?;
            Ok(layout::encode_parts(&lines, TAIL_LINES))
        }
        "MULTIPOLYGON" => {
            let mut rings = Vec::new();
            for polygon in lists(parse_body(&mut cursor)?)? {
                for r in lists(polygon)? {
                    rings.push(ring(r)?);
                }
            }
            Ok(layout::encode_parts(&rings, TAIL_RINGS))
        }
        "MULTIPOINT" | "GEOMETRYCOLLECTION" => {
            log::warn!("{} is not supported", keyword);
            Err(GeocellError::Unsupported(keyword))
        }
        other => Err(GeocellError::parse(format!("unknown geometry type '{}'", other))),
    }
}

/// `STPointFromText`: read `POINT (lon lat)`.
pub fn point_from_text(text: &str) -> Result<SpatialPoint> {
    text.parse::<SpatialPoint>()
        .map_err(|e| GeocellError::parse(e.to_string()))
}
