use super::{Rotation, Vec3};

/// Mean Earth radius (meters).
pub const MEAN_EARTH_RADIUS: f64 = 6_371_009.0;

/// Sphere used for visual placement of geodetic coordinates.
///
/// This is a rotation composition, not a datum: longitude and latitude are
/// treated as plain rotation angles about the Y and Z axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sphere {
    pub radius: f64,
}

impl Sphere {
    pub const fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Rotation that carries the +X axis to `(lon_deg, lat_deg)`:
    /// latitude about Z first, then longitude about Y.
    pub fn orientation(lon_deg: f64, lat_deg: f64) -> Rotation {
        Rotation::about_z(lat_deg).then(Rotation::about_y(lon_deg))
    }

    /// Embed a point `elevation` meters above the reference radius.
    pub fn embed(&self, lon_deg: f64, lat_deg: f64, elevation: f64) -> Vec3 {
        Self::orientation(lon_deg, lat_deg).apply(Vec3::new(self.radius + elevation, 0.0, 0.0))
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(MEAN_EARTH_RADIUS)
    }
}
