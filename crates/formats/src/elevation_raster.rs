use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use foundation::GeodeticRect;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("raster holds {found} bytes, expected {expected} for {rows}x{cols} i16 samples")]
    SizeMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        found: usize,
    },
    #[error("a {rows}x{cols} i16 raster does not fit in memory")]
    TooLarge { rows: usize, cols: usize },
    #[error("raster must have at least one row and column (got {rows}x{cols})")]
    Empty { rows: usize, cols: usize },
    #[error("raster bounds must have positive spans: {0:?}")]
    InvalidBounds(GeodeticRect),
}

/// Byte length of a `rows` x `cols` i16 raster, `None` on overflow.
pub fn raster_byte_len(rows: usize, cols: usize) -> Option<usize> {
    rows.checked_mul(cols)?.checked_mul(2)
}

/// Row-major grid of signed 16-bit elevations covering `bounds`.
///
/// Row 0 is the northern edge (`bounds.max_lat`) and column 0 the western
/// edge (`bounds.min_lon`).
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    rows: usize,
    cols: usize,
    bounds: GeodeticRect,
    samples: Vec<i16>,
}

impl ElevationGrid {
    pub fn new(
        rows: usize,
        cols: usize,
        bounds: GeodeticRect,
        samples: Vec<i16>,
    ) -> Result<Self, RasterError> {
        if rows == 0 || cols == 0 {
            return Err(RasterError::Empty { rows, cols });
        }
        if !(bounds.lon_span() > 0.0 && bounds.lat_span() > 0.0) {
            return Err(RasterError::InvalidBounds(bounds));
        }
        let expected = raster_byte_len(rows, cols).ok_or(RasterError::TooLarge { rows, cols })?;
        if samples.len() * 2 != expected {
            return Err(RasterError::SizeMismatch {
                rows,
                cols,
                expected,
                found: samples.len() * 2,
            });
        }
        Ok(Self {
            rows,
            cols,
            bounds,
            samples,
        })
    }

    /// Decode a headerless little-endian i16 raster.
    pub fn from_le_bytes(
        bytes: &[u8],
        rows: usize,
        cols: usize,
        bounds: GeodeticRect,
    ) -> Result<Self, RasterError> {
        let expected = raster_byte_len(rows, cols).ok_or(RasterError::TooLarge { rows, cols })?;
        if bytes.len() != expected {
            return Err(RasterError::SizeMismatch {
                rows,
                cols,
                expected,
                found: bytes.len(),
            });
        }
        let mut samples = vec![0i16; expected / 2];
        LittleEndian::read_i16_into(bytes, &mut samples);
        Self::new(rows, cols, bounds, samples)
    }

    pub fn load(
        path: impl AsRef<Path>,
        rows: usize,
        cols: usize,
        bounds: GeodeticRect,
    ) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| RasterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let grid = Self::from_le_bytes(&bytes, rows, cols, bounds)?;
        debug!(path = %path.display(), rows, cols, "loaded elevation raster");
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bounds(&self) -> GeodeticRect {
        self.bounds
    }

    /// Degrees of longitude per column.
    pub fn lon_step(&self) -> f64 {
        self.bounds.lon_span() / self.cols as f64
    }

    /// Degrees of latitude per row.
    pub fn lat_step(&self) -> f64 {
        self.bounds.lat_span() / self.rows as f64
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i16> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.samples.get(row * self.cols + col).copied()
    }

    /// One full row; `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[i16]> {
        let start = row.checked_mul(self.cols)?;
        self.samples.get(start..start.checked_add(self.cols)?)
    }
}
