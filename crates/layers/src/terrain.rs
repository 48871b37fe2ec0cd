//! Terrain mesh: elevation samples under the map overlay, embedded on the
//! sphere, with texture coordinates into the overlay image.

use std::time::Instant;

use formats::{ConfigError, ElevationGrid, LongitudeStepping, SceneConfig};
use foundation::math::{CoordinateTransform, GeodeticPoint, Sphere, Vec3};
use foundation::{GeodeticRect, MapFrame, ProjectedRect, TexCoord};
use rayon::prelude::*;
use tracing::info;

use crate::layer::{Layer, LayerId};

pub const DEFAULT_FOCAL_HEIGHT: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("grid window {window:?} does not fit a {rows}x{cols} elevation grid")]
    OutOfRangeIndex {
        window: GridWindow,
        rows: usize,
        cols: usize,
    },
    #[error("map frame {frame:?} has corners without a finite geodetic position")]
    UnmappableFrame { frame: MapFrame },
}

/// Half-open cell index ranges, columns from the west edge and rows of
/// latitude from the south edge of the grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridWindow {
    pub min_lon: i64,
    pub max_lon: i64,
    pub min_lat: i64,
    pub max_lat: i64,
}

impl GridWindow {
    pub fn new(min_lon: i64, max_lon: i64, min_lat: i64, max_lat: i64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Cells covering `bounds`, truncating toward zero.
    pub fn covering(grid: &ElevationGrid, bounds: &GeodeticRect) -> Self {
        let origin = grid.bounds();
        let lon_index = |lon: f64| ((lon - origin.min_lon) / grid.lon_step()) as i64;
        let lat_index = |lat: f64| ((lat - origin.min_lat) / grid.lat_step()) as i64;
        Self::new(
            lon_index(bounds.min_lon),
            lon_index(bounds.max_lon),
            lat_index(bounds.min_lat),
            lat_index(bounds.max_lat),
        )
    }

    pub fn cols(&self) -> usize {
        (self.max_lon - self.min_lon).max(0) as usize
    }

    pub fn rows(&self) -> usize {
        (self.max_lat - self.min_lat).max(0) as usize
    }

    /// Fractional `(lon, lat)` index of the window center.
    pub fn midpoint(&self) -> (f64, f64) {
        (
            self.min_lon as f64 + (self.max_lon - self.min_lon) as f64 / 2.0,
            self.min_lat as f64 + (self.max_lat - self.min_lat) as f64 / 2.0,
        )
    }

    pub fn to_array(&self) -> [usize; 4] {
        [self.min_lon, self.max_lon, self.min_lat, self.max_lat].map(|v| v.max(0) as usize)
    }

    pub fn check(&self, rows: usize, cols: usize) -> Result<(), MeshError> {
        let fits = |min: i64, max: i64, len: usize| min >= 0 && min <= max && max <= len as i64;
        if fits(self.min_lon, self.max_lon, cols) && fits(self.min_lat, self.max_lat, rows) {
            Ok(())
        } else {
            Err(MeshError::OutOfRangeIndex {
                window: *self,
                rows,
                cols,
            })
        }
    }
}

/// Structured grid of vertices, row-major from north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    rows: usize,
    cols: usize,
    window: GridWindow,
    positions: Vec<Vec3>,
    tex_coords: Vec<TexCoord>,
    focal_point: Vec3,
}

impl TerrainMesh {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn window(&self) -> GridWindow {
        self.window
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn tex_coords(&self) -> &[TexCoord] {
        &self.tex_coords
    }

    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn vertex(&self, row: usize, col: usize) -> Option<Vec3> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.positions.get(row * self.cols + col).copied()
    }

    pub fn tex_coord(&self, row: usize, col: usize) -> Option<TexCoord> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.tex_coords.get(row * self.cols + col).copied()
    }

    /// Vertices that fall outside the overlay image.
    pub fn outside_count(&self) -> usize {
        self.tex_coords.iter().filter(|t| t.is_outside()).count()
    }

    pub fn position_buffer(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_f32_array()).collect()
    }

    pub fn tex_coord_buffer(&self) -> Vec<[f32; 2]> {
        self.tex_coords.iter().map(|t| t.to_f32_array()).collect()
    }
}

struct MeshRow {
    positions: Vec<Vec3>,
    tex_coords: Vec<TexCoord>,
}

#[derive(Debug, Copy, Clone)]
pub struct TerrainMeshBuilder {
    transform: CoordinateTransform,
    sphere: Sphere,
    stepping: LongitudeStepping,
    focal_height: f64,
    parallel: bool,
}

impl TerrainMeshBuilder {
    pub fn new(transform: CoordinateTransform, sphere: Sphere) -> Self {
        Self {
            transform,
            sphere,
            stepping: LongitudeStepping::default(),
            focal_height: DEFAULT_FOCAL_HEIGHT,
            parallel: true,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.transform()?, config.sphere())
            .with_stepping(config.terrain.longitude_stepping)
            .with_focal_height(config.sphere.focal_height))
    }

    pub fn with_stepping(mut self, stepping: LongitudeStepping) -> Self {
        self.stepping = stepping;
        self
    }

    pub fn with_focal_height(mut self, focal_height: f64) -> Self {
        self.focal_height = focal_height;
        self
    }

    /// Build rows on the rayon pool (default) or on the calling thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Mesh for the grid cells under `frame`, textured by the frame's window.
    pub fn build(&self, grid: &ElevationGrid, frame: &MapFrame) -> Result<TerrainMesh, MeshError> {
        let bounds = frame
            .geodetic_bounds(&self.transform)
            .ok_or(MeshError::UnmappableFrame { frame: *frame })?;
        let window = GridWindow::covering(grid, &bounds);
        self.build_window(grid, window, bounds.min_lon, frame.texture_window())
    }

    /// Mesh for an explicit index window. Columns start one step east of
    /// `start_lon`.
    pub fn build_window(
        &self,
        grid: &ElevationGrid,
        window: GridWindow,
        start_lon: f64,
        texture: ProjectedRect,
    ) -> Result<TerrainMesh, MeshError> {
        window.check(grid.rows(), grid.cols())?;
        let started = Instant::now();

        let first_row = grid.rows() - window.max_lat as usize;
        let end_row = grid.rows() - window.min_lat as usize;
        let build_row = |y: usize| self.build_row(grid, window, y, start_lon, &texture);
        let rows: Vec<MeshRow> = if self.parallel {
            (first_row..end_row)
                .into_par_iter()
                .map(build_row)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (first_row..end_row)
                .map(build_row)
                .collect::<Result<Vec<_>, _>>()?
        };

        let count = window.rows() * window.cols();
        let mut positions = Vec::with_capacity(count);
        let mut tex_coords = Vec::with_capacity(count);
        for row in rows {
            positions.extend(row.positions);
            tex_coords.extend(row.tex_coords);
        }

        let mesh = TerrainMesh {
            rows: window.rows(),
            cols: window.cols(),
            window,
            positions,
            tex_coords,
            focal_point: self.focal_point(grid, window),
        };
        info!(
            rows = mesh.rows,
            cols = mesh.cols,
            outside = mesh.outside_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built terrain mesh"
        );
        Ok(mesh)
    }

    /// Embedding of the window's center cell, lifted by the focal height.
    pub fn focal_point(&self, grid: &ElevationGrid, window: GridWindow) -> Vec3 {
        let origin = grid.bounds();
        let (mid_lon, mid_lat) = window.midpoint();
        self.sphere.embed(
            origin.min_lon + mid_lon * grid.lon_step(),
            origin.min_lat + mid_lat * grid.lat_step(),
            self.focal_height,
        )
    }

    fn build_row(
        &self,
        grid: &ElevationGrid,
        window: GridWindow,
        y: usize,
        start_lon: f64,
        texture: &ProjectedRect,
    ) -> Result<MeshRow, MeshError> {
        let out_of_range = || MeshError::OutOfRangeIndex {
            window,
            rows: grid.rows(),
            cols: grid.cols(),
        };
        let first_col = window.min_lon as usize;
        let elevations = grid
            .row(y)
            .and_then(|row| row.get(first_col..window.max_lon as usize))
            .ok_or_else(out_of_range)?;

        let origin = grid.bounds();
        let lon_step = grid.lon_step();
        let lat_step = grid.lat_step();
        let lat = origin.max_lat - y as f64 * lat_step;
        let tex_lat = origin.max_lat - (y as f64 + 1.0) * lat_step;

        let mut positions = Vec::with_capacity(elevations.len());
        let mut tex_coords = Vec::with_capacity(elevations.len());
        let mut lon = start_lon;
        for (k, &elevation) in elevations.iter().enumerate() {
            lon = match self.stepping {
                LongitudeStepping::Indexed => start_lon + (k + 1) as f64 * lon_step,
                LongitudeStepping::Accumulated => lon + lon_step,
            };
            positions.push(self.sphere.embed(lon, lat, f64::from(elevation)));

            let x = (first_col + k) as f64;
            let tex_geo = GeodeticPoint::new(origin.min_lon + (x - 1.0) * lon_step, tex_lat);
            tex_coords.push(texture.texture_coord(self.transform.geodetic_to_projected(tex_geo)));
        }

        Ok(MeshRow {
            positions,
            tex_coords,
        })
    }
}

/// Terrain mesh plus the overlay image it is textured with.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainLayer {
    id: LayerId,
    pub mesh: TerrainMesh,
    pub overlay_image: Option<String>,
}

impl TerrainLayer {
    pub fn new(id: u64, mesh: TerrainMesh) -> Self {
        Self {
            id: LayerId(id),
            mesh,
            overlay_image: None,
        }
    }

    pub fn with_overlay_image(mut self, image: impl Into<String>) -> Self {
        self.overlay_image = Some(image.into());
        self
    }
}

impl Layer for TerrainLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use super::{GridWindow, MeshError, TerrainLayer, TerrainMeshBuilder};
    use crate::layer::{Layer, LayerId};
    use formats::{ElevationGrid, LongitudeStepping, SceneConfig};
    use foundation::math::{CoordinateTransform, Crs, GeodeticPoint, Sphere};
    use foundation::{GeodeticRect, MapFrame, ProjectedRect, TexCoord};
    use pretty_assertions::assert_eq;

    fn rt90() -> CoordinateTransform {
        CoordinateTransform::new(Crs::Rt90, Crs::Wgs84).expect("rt90 pair")
    }

    fn builder() -> TerrainMeshBuilder {
        TerrainMeshBuilder::new(rt90(), Sphere::default())
    }

    /// 6x6 grid over 10..16E / 60..66N, one degree per cell, sample = index.
    fn small_grid() -> ElevationGrid {
        let samples = (0..36).map(|i| i as i16 * 10).collect();
        ElevationGrid::new(6, 6, GeodeticRect::new(10.0, 16.0, 60.0, 66.0), samples)
            .expect("grid")
    }

    fn far_away() -> ProjectedRect {
        ProjectedRect::new(0.0, 10.0, 0.0, 10.0)
    }

    #[test]
    fn window_shape_gives_rows_by_cols() {
        let grid = small_grid();
        let window = GridWindow::new(2, 5, 1, 4);
        let mesh = builder()
            .build_window(&grid, window, 12.0, far_away())
            .expect("mesh");
        assert_eq!(mesh.rows(), 3);
        assert_eq!(mesh.cols(), 3);
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.tex_coords().len(), 9);
        assert_eq!(mesh.outside_count(), 9);
        assert_eq!(mesh.window().to_array(), [2, 5, 1, 4]);
    }

    #[test]
    fn vertices_follow_row_and_column_layout() {
        let grid = small_grid();
        let sphere = Sphere::default();
        let mesh = builder()
            .build_window(&grid, GridWindow::new(2, 5, 1, 4), 12.0, far_away())
            .expect("mesh");

        // First mesh row is grid row 6 - 4 = 2 at latitude 66 - 2 = 64.
        assert_eq!(mesh.vertex(0, 0), Some(sphere.embed(13.0, 64.0, 140.0)));
        assert_eq!(mesh.vertex(0, 2), Some(sphere.embed(15.0, 64.0, 160.0)));
        assert_eq!(mesh.vertex(2, 1), Some(sphere.embed(14.0, 62.0, 270.0)));
        assert_eq!(mesh.vertex(3, 0), None);
        assert_eq!(mesh.vertex(0, 3), None);
    }

    #[test]
    fn texture_lookup_is_offset_by_one_cell() {
        let grid = small_grid();
        let transform = rt90();
        // Window around lon 12, lat 62 in RT90.
        let center = transform.geodetic_to_projected(GeodeticPoint::new(12.0, 62.0));
        let texture = ProjectedRect::new(
            center.x - 1_000.0,
            center.x + 1_000.0,
            center.y - 1_000.0,
            center.y + 1_000.0,
        );
        let mesh = builder()
            .build_window(&grid, GridWindow::new(2, 5, 1, 4), 12.0, texture)
            .expect("mesh");

        // Sample (y = 3, x = 3) looks up lon 10 + 2 = 12 and lat 66 - 4 = 62.
        match mesh.tex_coord(1, 1) {
            Some(TexCoord::Inside { u, v }) => {
                assert!((u - 0.5).abs() < 1e-6, "u = {u}");
                assert!((v - 0.5).abs() < 1e-6, "v = {v}");
            }
            other => panic!("expected inside coordinate, got {other:?}"),
        }
        assert_eq!(mesh.outside_count(), 8);
        assert_eq!(mesh.tex_coord_buffer()[0], [-1.0, -1.0]);
    }

    #[test]
    fn rejects_windows_beyond_grid() {
        let grid = small_grid();
        let b = builder();
        for window in [
            GridWindow::new(2, 7, 1, 4),
            GridWindow::new(-1, 3, 1, 4),
            GridWindow::new(2, 5, 1, 7),
            GridWindow::new(4, 2, 1, 4),
        ] {
            let err = b
                .build_window(&grid, window, 12.0, far_away())
                .expect_err("window outside grid");
            assert_eq!(
                err,
                MeshError::OutOfRangeIndex {
                    window,
                    rows: 6,
                    cols: 6
                }
            );
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let grid = small_grid();
        let window = GridWindow::new(0, 6, 0, 6);
        let parallel = builder()
            .build_window(&grid, window, 10.0, far_away())
            .expect("parallel");
        let sequential = builder()
            .with_parallel(false)
            .build_window(&grid, window, 10.0, far_away())
            .expect("sequential");
        assert_eq!(parallel, sequential);

        let again = builder()
            .build_window(&grid, window, 10.0, far_away())
            .expect("again");
        assert_eq!(parallel, again);
    }

    #[test]
    fn accumulated_stepping_stays_close_to_indexed() {
        let grid = small_grid();
        let window = GridWindow::new(0, 6, 0, 6);
        let indexed = builder()
            .build_window(&grid, window, 10.0, far_away())
            .expect("indexed");
        let accumulated = builder()
            .with_stepping(LongitudeStepping::Accumulated)
            .build_window(&grid, window, 10.0, far_away())
            .expect("accumulated");
        for (a, b) in indexed.positions().iter().zip(accumulated.positions()) {
            assert!((*a - *b).length() < 1e-6, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn focal_point_sits_above_window_center() {
        let grid = small_grid();
        let window = GridWindow::new(2, 5, 1, 4);
        assert_eq!(window.midpoint(), (3.5, 2.5));
        let mesh = builder()
            .with_focal_height(250.0)
            .build_window(&grid, window, 12.0, far_away())
            .expect("mesh");
        assert_eq!(
            mesh.focal_point(),
            Sphere::default().embed(13.5, 62.5, 250.0)
        );
    }

    #[test]
    fn reference_frame_selects_expected_cells() {
        let config = SceneConfig::default();
        // Tenth of the reference resolution keeps the test small.
        let grid = ElevationGrid::new(600, 600, config.elevation_bounds(), vec![100; 360_000])
            .expect("grid");
        let builder = TerrainMeshBuilder::from_config(&config).expect("builder");
        let mesh = builder.build(&grid, &config.map_frame()).expect("mesh");

        assert_eq!(mesh.window(), GridWindow::new(336, 391, 375, 395));
        assert_eq!(mesh.rows(), 20);
        assert_eq!(mesh.cols(), 55);
        assert!(mesh.outside_count() < mesh.vertex_count());
        for tc in mesh.tex_coords() {
            if let TexCoord::Inside { u, v } = tc {
                assert!(*u > 0.0 && *u < 1.0 && *v > 0.0 && *v < 1.0);
            }
        }
    }

    #[test]
    fn map_outside_grid_is_rejected() {
        let grid = ElevationGrid::new(4, 4, GeodeticRect::new(0.0, 1.0, 0.0, 1.0), vec![0; 16])
            .expect("grid");
        let frame = SceneConfig::default().map_frame();
        assert!(matches!(
            builder().build(&grid, &frame),
            Err(MeshError::OutOfRangeIndex { .. })
        ));
    }

    #[test]
    fn frame_outside_projection_zone_is_rejected() {
        let frame = MapFrame::from(ProjectedRect::new(9.0e9, 9.1e9, 8.9e9, 9.0e9));
        assert_eq!(
            builder().build(&small_grid(), &frame),
            Err(MeshError::UnmappableFrame { frame })
        );
    }

    #[test]
    fn layer_reports_mesh_size() {
        let grid = small_grid();
        let mesh = builder()
            .build_window(&grid, GridWindow::new(2, 5, 1, 4), 12.0, far_away())
            .expect("mesh");
        let layer = TerrainLayer::new(1, mesh).with_overlay_image("map.jpg");
        assert_eq!(layer.id(), LayerId(1));
        assert_eq!(layer.vertex_count(), 9);
        assert_eq!(layer.overlay_image.as_deref(), Some("map.jpg"));
    }
}
