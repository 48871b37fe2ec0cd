//! Scene configuration file (JSON).
//!
//! Every field has a default describing the reference dataset: an RT90 map
//! sheet over central Sweden, the EarthEnv DEM90 N60E010 tile and a glider
//! log in RT90 coordinates. A config file only needs the keys it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use foundation::math::{CoordinateTransform, Crs, CrsError, ProjectedPoint, Sphere};
use foundation::{GeodeticRect, MapFrame};
use serde::{Deserialize, Serialize};

use crate::elevation_raster::raster_byte_len;
use crate::trajectory::DateLayout;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Crs(#[from] CrsError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub name: Option<String>,
    pub sphere: SphereConfig,
    pub crs: CrsConfig,
    pub elevation: ElevationConfig,
    pub map: MapConfig,
    pub trajectory: TrajectoryConfig,
    pub ramps: RampConfig,
    pub terrain: TerrainConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    /// Reference radius in meters.
    pub radius: f64,
    /// Height of the camera focal point above the reference radius.
    pub focal_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrsConfig {
    pub projected: String,
    pub geodetic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub path: PathBuf,
    pub rows: usize,
    pub cols: usize,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Overlay image and the projected position of its corners, `[x, y]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub image: PathBuf,
    pub top_left: [f64; 2],
    pub top_right: [f64; 2],
    pub bottom_right: [f64; 2],
    pub bottom_left: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub path: PathBuf,
    pub date_layout: DateLayout,
    pub tube_radius: f64,
    pub tube_sides: u32,
}

/// Hue ranges are `[hue at the zero-speed end.. hue at the far end]` for the
/// ascending ramp and `[hue at min speed, hue at zero]` for the descending
/// one, in turns (0..1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    pub ascending_hues: [f64; 2],
    pub descending_hues: [f64; 2],
    pub saturation: f64,
    pub value: f64,
    /// Quantize each ramp into this many table entries; continuous if unset.
    pub table_size: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LongitudeStepping {
    /// `start + (k + 1) * step`.
    #[default]
    Indexed,
    /// Repeated `lon += step`, matching the accumulation strategy of incremental rotation.
    Accumulated,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub longitude_stepping: LongitudeStepping,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: foundation::math::MEAN_EARTH_RADIUS,
            focal_height: 500.0,
        }
    }
}

impl Default for CrsConfig {
    fn default() -> Self {
        Self {
            projected: Crs::Rt90.to_string(),
            geodetic: Crs::Wgs84.to_string(),
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/EarthEnv-DEM90_N60E010.bil"),
            rows: 6000,
            cols: 6000,
            min_lon: 10.0,
            max_lon: 15.0,
            min_lat: 60.0,
            max_lat: 65.0,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from("data/glider_map.jpg"),
            top_left: [1_349_340.0, 7_022_573.0],
            top_right: [1_371_573.0, 7_022_967.0],
            bottom_right: [1_371_835.0, 7_006_362.0],
            bottom_left: [1_349_602.0, 7_005_969.0],
        }
    }
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/vtkgps.txt"),
            date_layout: DateLayout::YearDayMonth,
            tube_radius: 20.0,
            tube_sides: 50,
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            ascending_hues: [1.0 / 6.0, 0.0],
            descending_hues: [3.0 / 6.0, 2.0 / 6.0],
            saturation: 1.0,
            value: 1.0,
            table_size: None,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: None,
            sphere: SphereConfig::default(),
            crs: CrsConfig::default(),
            elevation: ElevationConfig::default(),
            map: MapConfig::default(),
            trajectory: TrajectoryConfig::default(),
            ramps: RampConfig::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SceneConfig =
            serde_json::from_str(&payload).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if !(self.sphere.radius > 0.0) {
            return invalid(format!("sphere.radius must be positive, got {}", self.sphere.radius));
        }
        let e = &self.elevation;
        if e.rows == 0 || e.cols == 0 {
            return invalid(format!("elevation grid must be non-empty, got {}x{}", e.rows, e.cols));
        }
        if raster_byte_len(e.rows, e.cols).is_none() {
            return invalid(format!("elevation grid {}x{} is too large", e.rows, e.cols));
        }
        if !(e.min_lon < e.max_lon && e.min_lat < e.max_lat) {
            return invalid("elevation bounds must have min < max on both axes".to_string());
        }
        if self.trajectory.tube_sides < 3 {
            return invalid(format!(
                "trajectory.tube_sides must be at least 3, got {}",
                self.trajectory.tube_sides
            ));
        }
        let r = &self.ramps;
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(unit(r.saturation) && unit(r.value)) {
            return invalid("ramps.saturation and ramps.value must lie in [0, 1]".to_string());
        }
        if r.table_size == Some(0) {
            return invalid("ramps.table_size must be at least 1".to_string());
        }
        let window = self.map_frame().texture_window();
        if !(window.min_x < window.max_x && window.min_y < window.max_y) {
            return invalid("map corners must span a non-empty window".to_string());
        }
        self.transform()?;
        Ok(())
    }

    pub fn transform(&self) -> Result<CoordinateTransform, ConfigError> {
        let projected: Crs = self.crs.projected.parse()?;
        let geodetic: Crs = self.crs.geodetic.parse()?;
        Ok(CoordinateTransform::new(projected, geodetic)?)
    }

    pub fn sphere(&self) -> Sphere {
        Sphere::new(self.sphere.radius)
    }

    pub fn elevation_bounds(&self) -> GeodeticRect {
        let e = &self.elevation;
        GeodeticRect::new(e.min_lon, e.max_lon, e.min_lat, e.max_lat)
    }

    pub fn map_frame(&self) -> MapFrame {
        let p = |[x, y]: [f64; 2]| ProjectedPoint::new(x, y);
        MapFrame {
            top_left: p(self.map.top_left),
            top_right: p(self.map.top_right),
            bottom_right: p(self.map.bottom_right),
            bottom_left: p(self.map.bottom_left),
        }
    }
}
