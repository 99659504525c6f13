//! Hierarchical Hilbert cell index and sphere geometry for `geography` columns.
//!
//! ```rust
//! use geocell::{Region, SpatialEngine, SpatialPoint};
//!
//! let engine = SpatialEngine::default();
//! let paris = SpatialPoint::new(48.8566, 2.3522);
//! let cell = engine.make_cell(&paris);
//! assert_eq!(cell.depth(), 4);
//!
//! let covering = engine.cover(&Region::circle(paris, 5_000.0))?;
//! assert!(covering.contains(&cell));
//! # Ok::<(), geocell::GeocellError>(())
//! ```

pub mod addressing;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hilbert;
pub mod interval;
pub mod planar;
pub mod predicates;
pub mod projection;
pub mod query;
pub mod raster;
pub mod sphere;
pub mod types;

pub use addressing::{cell_to_point, cell_to_spatial, make_cell};
pub use config::{Config, EarthModel, GridSize, SpatialGrid};
pub use error::{GeocellError, Result};

pub use geometry::{GeoValue, GeometryKind, GeometryType, Orientation, PointSeq};

pub use interval::IntervalCellSet;

pub use projection::{Hemisphere, project, unproject};

pub use query::{CellKeyIndex, GeometrySource, SpatialEngine, SpatialTree};

pub use raster::{CellSink, FnSink, LeafSink, Region, SortedBuffer, cells_covering};

pub use sphere::{EARTH_RADIUS, INFINITY, haversine};

pub use types::{Point2D, Rect2D, SpatialCell, SpatialPoint, SpatialRect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeocellError, Result, SpatialEngine};

    pub use crate::{Config, EarthModel, GridSize, SpatialGrid};

    pub use crate::{SpatialCell, SpatialPoint, SpatialRect};

    pub use crate::{CellSink, IntervalCellSet, Region};

    pub use crate::{CellKeyIndex, GeoValue, GeometrySource, SpatialTree};

    pub use std::ops::ControlFlow;
}
