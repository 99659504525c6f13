//! Conversion of parsed values into `geo` geometries.

use super::{GeoValue, GeometryKind, PointSeq};
use crate::error::Result;
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};

fn line_string(seq: &PointSeq<'_>) -> LineString<f64> {
    LineString::new(
        seq.iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect(),
    )
}

impl GeoValue<'_> {
    /// The value as a `geo` geometry, `x` = longitude.
    ///
    /// Fails for a multipolygon whose rings cannot be grouped into shells.
    pub fn to_geo(&self) -> Result<Geometry<f64>> {
        let geometry = match self.kind() {
            GeometryKind::Point => {
                let p = self.points().first().unwrap_or_default();
                Geometry::Point(Point::from(p))
            }
            GeometryKind::LineSegment | GeometryKind::LineString => {
                Geometry::LineString(line_string(&self.points()))
            }
            GeometryKind::Polygon => {
                Geometry::Polygon(Polygon::new(line_string(&self.points()), Vec::new()))
            }
            GeometryKind::MultiLineString => Geometry::MultiLineString(MultiLineString::new(
                self.parts().map(|part| line_string(&part)).collect(),
            )),
            GeometryKind::MultiPolygon => {
                let mut polygons: Vec<Polygon<f64>> = self
                    .shells()?
                    .into_iter()
                    .filter_map(|(exterior, holes)| {
                        let shell = line_string(&self.subobject(exterior)?);
                        let interiors = holes
                            .iter()
                            .filter_map(|h| self.subobject(*h))
                            .map(|ring| line_string(&ring))
                            .collect();
                        Some(Polygon::new(shell, interiors))
                    })
                    .collect();
                if polygons.len() == 1 {
                    Geometry::Polygon(polygons.remove(0))
                } else {
                    Geometry::MultiPolygon(MultiPolygon::new(polygons))
                }
            }
        };
        Ok(geometry)
    }
}
