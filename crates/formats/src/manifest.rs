use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// Index of a scene package: scene metadata plus one entry per binary buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneManifest {
    pub version: String,
    pub name: Option<String>,
    pub sphere_radius: f64,
    pub focal_point: [f64; 3],
    pub terrain: TerrainEntry,
    pub trajectory: TrajectoryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainEntry {
    pub rows: usize,
    pub cols: usize,
    /// Grid index window `[min_lon, max_lon, min_lat, max_lat]` (columns/rows
    /// counted from the raster's west and south edges).
    pub grid_window: [usize; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_image: Option<String>,
    /// Vertices whose texture coordinate is the `(-1, -1)` sentinel.
    pub outside_vertices: usize,
    pub positions: BufferEntry,
    pub tex_coords: BufferEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrajectoryEntry {
    pub samples: usize,
    pub min_vertical_speed: f64,
    pub max_vertical_speed: f64,
    pub tube_radius: f64,
    pub tube_sides: u32,
    pub positions: BufferEntry,
    pub colors: BufferEntry,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BufferLayout {
    F32x3,
    F32x2,
    U8x3,
}

impl BufferLayout {
    pub fn element_size(self) -> usize {
        match self {
            BufferLayout::F32x3 => 12,
            BufferLayout::F32x2 => 8,
            BufferLayout::U8x3 => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferEntry {
    pub path: String,
    pub layout: BufferLayout,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}
