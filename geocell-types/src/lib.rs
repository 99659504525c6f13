//! # geocell-types
//!
//! Value types shared by the geocell sphere index:
//!
//! - **Points**: `SpatialPoint` (latitude/longitude in degrees), `Point2D`
//!   (a position on the projected unit square)
//! - **Rectangles**: `SpatialRect` (a latitude/longitude box), `Rect2D`
//! - **Cells**: `SpatialCell`, a 4-level Hilbert cell address with depth
//!
//! All types are serializable with Serde and convert to the `geo` crate's
//! primitives where a natural mapping exists.
//!
//! ## Examples
//!
//! ```rust
//! use geocell_types::point::SpatialPoint;
//! use geocell_types::cell::SpatialCell;
//!
//! let london = SpatialPoint::new(51.5074, -0.1278);
//! assert!(london.is_valid());
//!
//! let cell = SpatialCell::parse_hex("6ca5f92a04").unwrap();
//! assert_eq!(cell.depth(), 4);
//! assert_eq!(cell.digit(0), 108);
//! ```

pub mod cell;
pub mod point;
pub mod rect;

/// Tolerance used for coordinate comparisons.
pub const EPSILON: f64 = 1e-12;

#[inline]
pub fn fequal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

#[inline]
pub fn fzero(a: f64) -> bool {
    a.abs() <= EPSILON
}
