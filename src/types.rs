//! Value types shared with the `geocell-types` crate.
pub use geocell_types::cell::SpatialCell;
pub use geocell_types::point::{Point2D, SpatialPoint};
pub use geocell_types::rect::{Rect2D, SpatialRect};
pub use geocell_types::{EPSILON, fequal, fzero};
