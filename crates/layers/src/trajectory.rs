use formats::Trajectory;
use foundation::math::{CoordinateTransform, Sphere, Vec3};
use tracing::debug;

use crate::layer::{Layer, LayerId};
use crate::symbology::ColorRamp;

/// Renderer hint for drawing the polyline as a tube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TubeStyle {
    pub radius: f64,
    pub sides: u32,
}

impl Default for TubeStyle {
    fn default() -> Self {
        Self {
            radius: 20.0,
            sides: 50,
        }
    }
}

/// Flight path as an ordered polyline with one color per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryLayer {
    id: LayerId,
    pub positions: Vec<Vec3>,
    pub colors: Vec<[u8; 3]>,
    pub tube: TubeStyle,
}

impl TrajectoryLayer {
    /// Embed every sample at its altitude and color it by vertical speed.
    pub fn build(
        id: u64,
        trajectory: &Trajectory,
        transform: &CoordinateTransform,
        sphere: &Sphere,
        ramp: &ColorRamp,
        tube: TubeStyle,
    ) -> Self {
        let positions: Vec<Vec3> = trajectory
            .samples()
            .iter()
            .map(|s| {
                let geo = transform.projected_to_geodetic(s.position());
                sphere.embed(geo.lon_deg, geo.lat_deg, s.altitude)
            })
            .collect();
        let colors = ramp.colors_for(&trajectory.vertical_speeds());
        debug!(vertices = positions.len(), "built trajectory layer");
        Self {
            id: LayerId(id),
            positions,
            colors,
            tube,
        }
    }

    pub fn position_buffer(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_f32_array()).collect()
    }
}

impl Layer for TrajectoryLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
