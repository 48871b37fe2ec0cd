//! Projected <-> geodetic conversion.
//!
//! Projected systems are Gauss-Krüger (transverse Mercator) projections on an
//! ellipsoid, evaluated with Krüger's series to the fourth order in the third
//! flattening. Conversions are total: inputs far outside a projection's zone
//! come back as large or non-finite values which consumers range-check.

use std::fmt;
use std::str::FromStr;

use super::geodesy::{Ellipsoid, GRS80, GeodeticPoint};

/// Planar coordinates in meters: `x` is easting, `y` is northing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct KrugerSeries {
    /// Rectifying radius.
    a_hat: f64,
    /// Geodetic -> conformal latitude.
    conformal: [f64; 4],
    /// Conformal latitude -> geodetic.
    geodetic: [f64; 4],
    beta: [f64; 4],
    delta: [f64; 4],
}

impl KrugerSeries {
    fn new(ellipsoid: Ellipsoid) -> Self {
        let e2 = ellipsoid.e2();
        let (e4, e6, e8) = (e2 * e2, e2 * e2 * e2, e2 * e2 * e2 * e2);
        let n = ellipsoid.third_flattening();
        let (n2, n3, n4) = (n * n, n * n * n, n * n * n * n);

        Self {
            a_hat: ellipsoid.semi_major / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0),
            conformal: [
                e2,
                (5.0 * e4 - e6) / 6.0,
                (104.0 * e6 - 45.0 * e8) / 120.0,
                1237.0 * e8 / 1260.0,
            ],
            geodetic: [
                e2 + e4 + e6 + e8,
                -(7.0 * e4 + 17.0 * e6 + 30.0 * e8) / 6.0,
                (224.0 * e6 + 889.0 * e8) / 120.0,
                -4279.0 * e8 / 1260.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0,
                61.0 * n3 / 240.0 - 103.0 * n4 / 140.0,
                49561.0 * n4 / 161_280.0,
            ],
            delta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0,
                n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0,
                17.0 * n3 / 480.0 - 37.0 * n4 / 840.0,
                4397.0 * n4 / 161_280.0,
            ],
        }
    }
}

/// Horner evaluation of `c0 + c1 s + c2 s^2 + c3 s^3` in `s = sin^2`.
fn sin2_poly(c: &[f64; 4], sin2: f64) -> f64 {
    c[0] + sin2 * (c[1] + sin2 * (c[2] + sin2 * c[3]))
}

/// Gauss-Krüger projection parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GaussKruger {
    central_meridian_deg: f64,
    scale: f64,
    false_northing: f64,
    false_easting: f64,
    series: KrugerSeries,
}

impl GaussKruger {
    pub fn new(
        ellipsoid: Ellipsoid,
        central_meridian_deg: f64,
        scale: f64,
        false_northing: f64,
        false_easting: f64,
    ) -> Self {
        Self {
            central_meridian_deg,
            scale,
            false_northing,
            false_easting,
            series: KrugerSeries::new(ellipsoid),
        }
    }

    /// RT90 2.5 gon V expressed directly on GRS80 (Lantmäteriet's
    /// SWEREF 99 -> RT90 parameter set, which folds the datum shift into the
    /// projection constants).
    pub fn rt90_2_5_gon_v() -> Self {
        Self::new(
            GRS80,
            15.0 + 48.0 / 60.0 + 22.624_306 / 3600.0,
            1.000_005_610_24,
            -667.711,
            1_500_064.274,
        )
    }

    pub fn sweref99_tm() -> Self {
        Self::new(GRS80, 15.0, 0.9996, 0.0, 500_000.0)
    }

    pub fn forward(&self, geo: GeodeticPoint) -> ProjectedPoint {
        let s = &self.series;
        let lat = geo.lat_deg.to_radians();
        let dlon = (geo.lon_deg - self.central_meridian_deg).to_radians();

        let (sin_lat, cos_lat) = lat.sin_cos();
        let conformal = lat - sin_lat * cos_lat * sin2_poly(&s.conformal, sin_lat * sin_lat);
        let xi = (conformal.tan() / dlon.cos()).atan();
        let eta = (conformal.cos() * dlon.sin()).atanh();

        let mut northing = xi;
        let mut easting = eta;
        for (k, b) in s.beta.iter().enumerate() {
            let m = 2.0 * (k + 1) as f64;
            northing += b * (m * xi).sin() * (m * eta).cosh();
            easting += b * (m * xi).cos() * (m * eta).sinh();
        }

        let k = self.scale * s.a_hat;
        ProjectedPoint::new(
            k * easting + self.false_easting,
            k * northing + self.false_northing,
        )
    }

    pub fn inverse(&self, p: ProjectedPoint) -> GeodeticPoint {
        let s = &self.series;
        let k = self.scale * s.a_hat;
        let xi = (p.y - self.false_northing) / k;
        let eta = (p.x - self.false_easting) / k;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, d) in s.delta.iter().enumerate() {
            let m = 2.0 * (j + 1) as f64;
            xi_p -= d * (m * xi).sin() * (m * eta).cosh();
            eta_p -= d * (m * xi).cos() * (m * eta).sinh();
        }

        let conformal = (xi_p.sin() / eta_p.cosh()).asin();
        let dlon = (eta_p.sinh() / xi_p.cos()).atan();

        let (sin_c, cos_c) = conformal.sin_cos();
        let lat = conformal + sin_c * cos_c * sin2_poly(&s.geodetic, sin_c * sin_c);

        GeodeticPoint::new(
            self.central_meridian_deg + dlon.to_degrees(),
            lat.to_degrees(),
        )
    }
}

/// Reference systems known to the pipeline.
///
/// The geodetic side is WGS 84; at the accuracy this pipeline targets it is
/// interchangeable with SWEREF 99 / GRS80 geodetic coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// EPSG:4326
    Wgs84,
    /// EPSG:3021
    Rt90,
    /// EPSG:3006
    Sweref99Tm,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Rt90 => 3021,
            Crs::Sweref99Tm => 3006,
        }
    }

    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(Crs::Wgs84),
            3021 => Some(Crs::Rt90),
            3006 => Some(Crs::Sweref99Tm),
            _ => None,
        }
    }

    pub fn is_geodetic(self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    pub fn projection(self) -> Option<GaussKruger> {
        match self {
            Crs::Wgs84 => None,
            Crs::Rt90 => Some(GaussKruger::rt90_2_5_gon_v()),
            Crs::Sweref99Tm => Some(GaussKruger::sweref99_tm()),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrsError {
    Unknown(String),
    UnsupportedPair { projected: Crs, geodetic: Crs },
}

impl fmt::Display for CrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsError::Unknown(name) => write!(f, "unknown reference system: {name}"),
            CrsError::UnsupportedPair {
                projected,
                geodetic,
            } => write!(
                f,
                "no conversion between {projected} (expected projected) and {geodetic} (expected geodetic)"
            ),
        }
    }
}

impl std::error::Error for CrsError {}

impl FromStr for Crs {
    type Err = CrsError;

    /// Accepts `EPSG:3021`, `epsg:3021` or a bare `3021`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(CrsError::Unknown(trimmed.to_string())),
            None => trimmed,
        };
        code.parse::<u32>()
            .ok()
            .and_then(Crs::from_epsg)
            .ok_or_else(|| CrsError::Unknown(trimmed.to_string()))
    }
}

/// A validated projected/geodetic pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateTransform {
    projected: Crs,
    geodetic: Crs,
    projection: GaussKruger,
}

impl CoordinateTransform {
    pub fn new(projected: Crs, geodetic: Crs) -> Result<Self, CrsError> {
        match (projected.projection(), geodetic.is_geodetic()) {
            (Some(projection), true) => Ok(Self {
                projected,
                geodetic,
                projection,
            }),
            _ => Err(CrsError::UnsupportedPair {
                projected,
                geodetic,
            }),
        }
    }

    pub fn projected_crs(&self) -> Crs {
        self.projected
    }

    pub fn geodetic_crs(&self) -> Crs {
        self.geodetic
    }

    pub fn projected_to_geodetic(&self, p: ProjectedPoint) -> GeodeticPoint {
        self.projection.inverse(p)
    }

    pub fn geodetic_to_projected(&self, g: GeodeticPoint) -> ProjectedPoint {
        self.projection.forward(g)
    }
}

/// One-shot conversion from `source` (projected) to `target` (geodetic).
pub fn projected_to_geodetic(
    p: ProjectedPoint,
    source: Crs,
    target: Crs,
) -> Result<GeodeticPoint, CrsError> {
    Ok(CoordinateTransform::new(source, target)?.projected_to_geodetic(p))
}

/// One-shot conversion from `source` (geodetic) to `target` (projected).
pub fn geodetic_to_projected(
    g: GeodeticPoint,
    source: Crs,
    target: Crs,
) -> Result<ProjectedPoint, CrsError> {
    Ok(CoordinateTransform::new(target, source)?.geodetic_to_projected(g))
}
