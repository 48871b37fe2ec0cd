/// Reference ellipsoid given by semi-major axis (meters) and flattening.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipsoid {
    pub semi_major: f64,
    pub flattening: f64,
}

impl Ellipsoid {
    pub const fn new(semi_major: f64, flattening: f64) -> Self {
        Self {
            semi_major,
            flattening,
        }
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    /// Third flattening, `f / (2 - f)`.
    pub fn third_flattening(&self) -> f64 {
        self.flattening / (2.0 - self.flattening)
    }
}

/// GRS 80, the ellipsoid of SWEREF 99 and RT90-via-SWEREF99 projections.
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);

/// Geodetic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeodeticPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeodeticPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }
}
