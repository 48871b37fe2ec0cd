use crate::math::{CoordinateTransform, GeodeticPoint, ProjectedPoint};

/// Axis-aligned rectangle in a projected system (meters).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectedRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ProjectedRect {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Strict interior test; points on the border are outside.
    pub fn contains(&self, p: ProjectedPoint) -> bool {
        p.x > self.min_x && p.x < self.max_x && p.y > self.min_y && p.y < self.max_y
    }

    /// Normalized position of `p` inside the rectangle.
    pub fn texture_coord(&self, p: ProjectedPoint) -> TexCoord {
        if !self.contains(p) {
            return TexCoord::Outside;
        }
        TexCoord::Inside {
            u: (p.x - self.min_x) / (self.max_x - self.min_x),
            v: (p.y - self.min_y) / (self.max_y - self.min_y),
        }
    }
}

/// Longitude/latitude box in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeodeticRect {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeodeticRect {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Texture coordinate of a vertex, or the marker for "not on the overlay".
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TexCoord {
    Inside { u: f64, v: f64 },
    Outside,
}

impl TexCoord {
    /// Value written into texture buffers for [`TexCoord::Outside`].
    pub const OUTSIDE_SENTINEL: [f32; 2] = [-1.0, -1.0];

    pub fn is_outside(&self) -> bool {
        matches!(self, TexCoord::Outside)
    }

    pub fn to_f32_array(self) -> [f32; 2] {
        match self {
            TexCoord::Inside { u, v } => [u as f32, v as f32],
            TexCoord::Outside => Self::OUTSIDE_SENTINEL,
        }
    }
}

/// Projected footprint of an overlay image given by its four corners.
///
/// The corners need not be axis aligned; the texture window is the smallest
/// rectangle spanned by the outer edges.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapFrame {
    pub top_left: ProjectedPoint,
    pub top_right: ProjectedPoint,
    pub bottom_right: ProjectedPoint,
    pub bottom_left: ProjectedPoint,
}

impl MapFrame {
    pub fn texture_window(&self) -> ProjectedRect {
        ProjectedRect::new(
            self.top_left.x.min(self.bottom_left.x),
            self.top_right.x.max(self.bottom_right.x),
            self.bottom_left.y.min(self.bottom_right.y),
            self.top_left.y.max(self.top_right.y),
        )
    }

    /// Geodetic bounding box of the frame, pairing corners the same way as
    /// [`MapFrame::texture_window`]. `None` if any corner has no finite
    /// geodetic position.
    pub fn geodetic_bounds(&self, transform: &CoordinateTransform) -> Option<GeodeticRect> {
        let to_geo = |p: ProjectedPoint| -> Option<GeodeticPoint> {
            let g = transform.projected_to_geodetic(p);
            g.is_finite().then_some(g)
        };
        let tl = to_geo(self.top_left)?;
        let tr = to_geo(self.top_right)?;
        let br = to_geo(self.bottom_right)?;
        let bl = to_geo(self.bottom_left)?;
        Some(GeodeticRect::new(
            tl.lon_deg.min(bl.lon_deg),
            tr.lon_deg.max(br.lon_deg),
            bl.lat_deg.min(br.lat_deg),
            tl.lat_deg.max(tr.lat_deg),
        ))
    }
}

impl From<ProjectedRect> for MapFrame {
    fn from(rect: ProjectedRect) -> Self {
        Self {
            top_left: ProjectedPoint::new(rect.min_x, rect.max_y),
            top_right: ProjectedPoint::new(rect.max_x, rect.max_y),
            bottom_right: ProjectedPoint::new(rect.max_x, rect.min_y),
            bottom_left: ProjectedPoint::new(rect.min_x, rect.min_y),
        }
    }
}
