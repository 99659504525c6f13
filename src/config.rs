//! Engine configuration.
//!
//! Grid resolution and rasterizer tuning are plain values threaded through
//! every call, never globals. Everything has a default matching the
//! `geography` index layout (four 16×16 levels, spherical earth).
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Per-level grid size of the cell hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridSize {
    /// 4×4, 16 cells
    Low,
    /// 8×8, 64 cells
    Medium,
    /// 16×16, 256 cells
    #[default]
    High,
}

impl GridSize {
    pub const fn get(self) -> u32 {
        match self {
            GridSize::Low => 4,
            GridSize::Medium => 8,
            GridSize::High => 16,
        }
    }
}

/// Grid sizes of the four cell levels, top down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SpatialGrid {
    pub levels: [GridSize; 4],
}

impl SpatialGrid {
    pub const fn new(levels: [GridSize; 4]) -> Self {
        Self { levels }
    }

    pub const fn high() -> Self {
        Self::new([GridSize::High; 4])
    }

    /// Cells per axis at level `i` (0-based).
    pub fn size(&self, i: usize) -> u32 {
        self.levels[i].get()
    }

    /// Leaf pixels per axis across the whole unit square (65536 for 16⁴).
    pub fn max_id(&self) -> u32 {
        self.levels.iter().map(|g| g.get()).product()
    }

    /// Leaf pixels per axis inside one cell of level `i` (0-based).
    pub fn block(&self, i: usize) -> u32 {
        self.levels[i + 1..].iter().map(|g| g.get()).product()
    }

    pub fn is_high(&self) -> bool {
        self.levels.iter().all(|g| *g == GridSize::High)
    }
}

/// Earth radius model used by the distance formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EarthModel {
    /// Fixed mean radius.
    #[default]
    Sphere,
    /// Radius interpolated between the WGS84 semi-axes by latitude.
    Ellipsoid,
}

/// Engine configuration
///
/// # Example
///
/// ```rust
/// use geocell::Config;
///
/// let json = r#"{
///     "earth": "sphere",
///     "segment_meters": 50000.0,
///     "bisection_iterations": 12
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.bisection_iterations, 12);
/// assert_eq!(config.circle_points_per_degree, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub grid: SpatialGrid,

    #[serde(default)]
    pub earth: EarthModel,

    /// Great-circle distance between tessellation points on rectangle edges.
    #[serde(default = "Config::default_segment_meters")]
    pub segment_meters: f64,

    /// Boundary points per degree of circle radius, rounded up to a multiple of 32.
    #[serde(default = "Config::default_circle_points_per_degree")]
    pub circle_points_per_degree: usize,

    /// Maximum bisection steps when locating a circle's equator crossing.
    #[serde(default = "Config::default_bisection_iterations")]
    pub bisection_iterations: usize,

    /// Bisection stops once the bracket is shorter than this.
    #[serde(default = "Config::default_bisection_tolerance_meters")]
    pub bisection_tolerance_meters: f64,

    /// Capacity of the sort-and-dedupe cell buffer.
    #[serde(default = "Config::default_sink_buffer_size")]
    pub sink_buffer_size: usize,
}

impl Config {
    const fn default_segment_meters() -> f64 {
        100_000.0
    }

    const fn default_circle_points_per_degree() -> usize {
        32
    }

    const fn default_bisection_iterations() -> usize {
        10
    }

    const fn default_bisection_tolerance_meters() -> f64 {
        5.0
    }

    const fn default_sink_buffer_size() -> usize {
        256
    }

    pub fn with_grid(mut self, grid: SpatialGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_earth(mut self, earth: EarthModel) -> Self {
        self.earth = earth;
        self
    }

    pub fn with_segment_meters(mut self, meters: f64) -> Self {
        self.segment_meters = meters;
        self
    }

    pub fn with_bisection(mut self, iterations: usize, tolerance_meters: f64) -> Self {
        self.bisection_iterations = iterations;
        self.bisection_tolerance_meters = tolerance_meters;
        self
    }

    pub fn with_sink_buffer_size(mut self, size: usize) -> Self {
        assert!(size > 0, "Sink buffer size must be greater than zero");
        self.sink_buffer_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.segment_meters.is_finite() || self.segment_meters <= 0.0 {
            return Err("Segment length must be positive and finite".to_string());
        }
        if self.circle_points_per_degree == 0 {
            return Err("Circle points per degree must be greater than zero".to_string());
        }
        if self.bisection_iterations == 0 || self.bisection_iterations > 64 {
            return Err("Bisection iterations must be between 1 and 64".to_string());
        }
        if !self.bisection_tolerance_meters.is_finite() || self.bisection_tolerance_meters <= 0.0 {
            return Err("Bisection tolerance must be positive and finite".to_string());
        }
        if self.sink_buffer_size == 0 {
            return Err("Sink buffer size must be greater than zero".to_string());
        }
        if self.segment_meters < 1000.0 {
            log::warn!(
                "Segment length of {} m produces very dense rectangle outlines",
                self.segment_meters
            );
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: SpatialGrid::default(),
            earth: EarthModel::default(),
            segment_meters: Self::default_segment_meters(),
            circle_points_per_degree: Self::default_circle_points_per_degree(),
            bisection_iterations: Self::default_bisection_iterations(),
            bisection_tolerance_meters: Self::default_bisection_tolerance_meters(),
            sink_buffer_size: Self::default_sink_buffer_size(),
        }
    }
}
