use geo::{Distance, Haversine, Point};
use geocell::geometry::wkt;
use geocell::sphere::{EARTH_RADIUS, destination, haversine};
use geocell::{GeoValue, GeometryKind, GeometryType, Orientation, SpatialPoint, SpatialRect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

fn sp(lat: f64, lon: f64) -> SpatialPoint {
    SpatialPoint::new(lat, lon)
}

fn encode(text: &str) -> Vec<u8> {
    wkt::parse(text).unwrap()
}

#[test]
fn test_polygon_contains_reference_case() {
    let bytes = encode("POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))");
    let value = GeoValue::parse(&bytes).unwrap();
    assert_eq!(value.kind(), GeometryKind::Polygon);
    assert!(value.st_contains(&sp(25.0, 25.0)));
    assert!(!value.st_contains(&sp(5.0, 5.0)));
}

#[test]
fn test_haversine_reference_values() {
    let d = haversine(&sp(0.0, 0.0), &sp(0.0, 1.0));
    assert!((d - 111_194.9).abs() < 0.1, "{}", d);

    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..1_000 {
        let a = sp(rng.gen_range(-90.0..90.0), rng.gen_range(-180.0..180.0));
        let b = sp(rng.gen_range(-90.0..90.0), rng.gen_range(-180.0..180.0));
        let ours = haversine(&a, &b);
        let theirs = Haversine.distance(Point::from(a), Point::from(b));
        assert!((ours - theirs).abs() <= theirs * 1e-5 + 1e-6, "{} vs {}", ours, theirs);
    }
}

#[test]
fn test_destination_quarter_circle_reaches_pole() {
    let p = destination(&sp(0.0, 0.0), EARTH_RADIUS * PI / 2.0, 0.0);
    assert!((p.latitude - 90.0).abs() < 1e-9, "{:?}", p);
}

#[test]
fn test_ring_orientation_of_holes() {
    let bytes = encode("POLYGON ((0 0, 20 0, 20 20, 0 20, 0 0), (5 5, 10 5, 10 10, 5 10, 5 5))");
    let value = GeoValue::parse(&bytes).unwrap();
    assert_eq!(value.kind(), GeometryKind::MultiPolygon);
    assert_eq!(
        value.ring_orientation().unwrap(),
        &[Orientation::Exterior, Orientation::Interior]
    );
    assert_eq!(value.st_geometry_type(), GeometryType::Polygon);

    let two = encode(
        "MULTIPOLYGON (((0 0, 5 0, 5 5, 0 5, 0 0)), ((10 10, 15 10, 15 15, 10 15, 10 10)))",
    );
    let value = GeoValue::parse(&two).unwrap();
    assert_eq!(
        value.ring_orientation().unwrap(),
        &[Orientation::Exterior, Orientation::Exterior]
    );
    assert_eq!(value.st_geometry_type(), GeometryType::MultiPolygon);
}

#[test]
fn test_orientation_is_memoized() {
    let bytes = encode("POLYGON ((0 0, 20 0, 20 20, 0 20, 0 0), (5 5, 10 5, 10 10, 5 10, 5 5))");
    let value = GeoValue::parse(&bytes).unwrap();
    let first = value.ring_orientation().unwrap().as_ptr();
    let second = value.ring_orientation().unwrap().as_ptr();
    assert_eq!(first, second);
}

#[test]
fn test_distance_and_length() {
    let bytes = encode("LINESTRING (0 0, 0 1, 0 2)");
    let line = GeoValue::parse(&bytes).unwrap();
    assert!((line.st_length() - 2.0 * 111_194.9).abs() < 1.0);
    let d = line.st_distance(&sp(1.0, 1.0));
    // One degree of longitude at latitude 1, measured across the meridian.
    assert!(d > 111_170.0 && d < 111_195.0, "{}", d);

    let bytes = encode("POINT (10 20)");
    let point = GeoValue::parse(&bytes).unwrap();
    assert_eq!(point.st_distance(&sp(20.0, 10.0)), 0.0);
    assert!(point.st_intersects(&SpatialRect::new(19.0, 9.0, 21.0, 11.0)));
}

#[test]
fn test_wkt_rendering_is_idempotent() {
    let inputs = [
        "POINT (2.5 48.75)",
        "LINESTRING (0 0, 1 1, 2 0.5)",
        "POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))",
        "MULTILINESTRING ((0 0, 1 0), (0 10, 1 10))",
        "POLYGON ((0 0, 20 0, 20 20, 0 20, 0 0), (5 5, 10 5, 10 10, 5 10, 5 5))",
        "MULTIPOLYGON (((0 0, 5 0, 5 5, 0 5, 0 0)), ((10 10, 15 10, 15 15, 10 15, 10 10)))",
    ];
    for text in inputs {
        let bytes = encode(text);
        let rendered = GeoValue::parse(&bytes).unwrap().st_as_text();
        assert_eq!(rendered, text);
        let again = encode(&rendered);
        assert_eq!(again, bytes);
        assert_eq!(GeoValue::parse(&again).unwrap().to_string(), rendered);
    }
}

#[test]
fn test_rejects_foreign_srid() {
    let mut bytes = encode("POINT (1 2)");
    bytes[0] ^= 0xFF;
    assert!(GeoValue::parse(&bytes).is_err());
    assert!(GeoValue::parse(&bytes[..4]).is_err());
}
