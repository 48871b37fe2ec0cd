use std::error::Error;
use std::path::{Path, PathBuf};

use formats::{
    ElevationGrid, MANIFEST_VERSION, SceneConfig, SceneManifest, ScenePackageError,
    ScenePackageWriter, TERRAIN_POSITIONS_FILE, TERRAIN_TEXCOORDS_FILE, TRAJECTORY_COLORS_FILE,
    TRAJECTORY_POSITIONS_FILE, TerrainEntry, Trajectory, TrajectoryEntry, load_log,
};
use layers::{ColorRamp, Layer, TerrainLayer, TerrainMeshBuilder, TrajectoryLayer, TubeStyle};
use tracing::info;

const TERRAIN_LAYER: u64 = 1;
const TRAJECTORY_LAYER: u64 = 2;

/// Input paths that override the configuration file.
#[derive(Debug, Default, Clone)]
pub struct InputOverrides {
    pub elevation: Option<PathBuf>,
    pub trajectory: Option<PathBuf>,
    pub map_image: Option<PathBuf>,
}

impl InputOverrides {
    pub fn apply(self, config: &mut SceneConfig) {
        if let Some(p) = self.elevation {
            config.elevation.path = p;
        }
        if let Some(p) = self.trajectory {
            config.trajectory.path = p;
        }
        if let Some(p) = self.map_image {
            config.map.image = p;
        }
    }
}

pub struct Scene {
    pub terrain: TerrainLayer,
    pub trajectory: TrajectoryLayer,
    pub min_vertical_speed: f64,
    pub max_vertical_speed: f64,
    pub samples: usize,
}

pub fn load_trajectory(config: &SceneConfig) -> Result<Trajectory, Box<dyn Error>> {
    Ok(load_log(&config.trajectory.path, config.trajectory.date_layout)?)
}

pub fn load_grid(config: &SceneConfig) -> Result<ElevationGrid, Box<dyn Error>> {
    let e = &config.elevation;
    Ok(ElevationGrid::load(&e.path, e.rows, e.cols, config.elevation_bounds())?)
}

pub fn build_scene(
    config: &SceneConfig,
    grid: &ElevationGrid,
    trajectory: &Trajectory,
) -> Result<Scene, Box<dyn Error>> {
    let transform = config.transform()?;
    let sphere = config.sphere();

    let mesh = TerrainMeshBuilder::from_config(config)?.build(grid, &config.map_frame())?;
    let terrain = TerrainLayer::new(TERRAIN_LAYER, mesh)
        .with_overlay_image(config.map.image.display().to_string());

    let (min, max) = (
        trajectory.min_vertical_speed(),
        trajectory.max_vertical_speed(),
    );
    let ramp = ColorRamp::from_config(min, max, &config.ramps);
    let tube = TubeStyle {
        radius: config.trajectory.tube_radius,
        sides: config.trajectory.tube_sides,
    };
    let trajectory_layer =
        TrajectoryLayer::build(TRAJECTORY_LAYER, trajectory, &transform, &sphere, &ramp, tube);

    info!(
        terrain_vertices = terrain.vertex_count(),
        trajectory_vertices = trajectory_layer.vertex_count(),
        min_vertical_speed = min,
        max_vertical_speed = max,
        "scene built"
    );
    Ok(Scene {
        terrain,
        trajectory: trajectory_layer,
        min_vertical_speed: min,
        max_vertical_speed: max,
        samples: trajectory.len(),
    })
}

pub fn write_scene(
    out: &Path,
    config: &SceneConfig,
    scene: &Scene,
) -> Result<PathBuf, ScenePackageError> {
    let writer = ScenePackageWriter::create(out)?;
    let mesh = &scene.terrain.mesh;

    let terrain = TerrainEntry {
        rows: mesh.rows(),
        cols: mesh.cols(),
        grid_window: mesh.window().to_array(),
        overlay_image: scene.terrain.overlay_image.clone(),
        outside_vertices: mesh.outside_count(),
        positions: writer.write_f32x3(TERRAIN_POSITIONS_FILE, &mesh.position_buffer())?,
        tex_coords: writer.write_f32x2(TERRAIN_TEXCOORDS_FILE, &mesh.tex_coord_buffer())?,
    };
    let trajectory = TrajectoryEntry {
        samples: scene.samples,
        min_vertical_speed: scene.min_vertical_speed,
        max_vertical_speed: scene.max_vertical_speed,
        tube_radius: scene.trajectory.tube.radius,
        tube_sides: scene.trajectory.tube.sides,
        positions: writer.write_f32x3(
            TRAJECTORY_POSITIONS_FILE,
            &scene.trajectory.position_buffer(),
        )?,
        colors: writer.write_u8x3(TRAJECTORY_COLORS_FILE, &scene.trajectory.colors)?,
    };

    let manifest = SceneManifest {
        version: MANIFEST_VERSION.to_string(),
        name: config.name.clone(),
        sphere_radius: config.sphere.radius,
        focal_point: mesh.focal_point().as_array(),
        terrain,
        trajectory,
    };
    writer.finish(&manifest)
}
