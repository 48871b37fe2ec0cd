//! Glider position logs and their vertical-speed analysis.
//!
//! A log is whitespace-delimited text: one header line, then one record per
//! sample with the fields
//!
//! ```text
//! [0] ignored  [1] x (int)  [2] y (int)  [3] altitude (m)  [4] date  [5] H:M:S
//! ```
//!
//! The three-part slash date follows [`DateLayout`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use foundation::math::ProjectedPoint;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_FIELDS: usize = 6;

/// Component order of the slash-separated date field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateLayout {
    #[default]
    YearDayMonth,
    YearMonthDay,
    DayMonthYear,
}

impl DateLayout {
    fn date(self, parts: [i64; 3]) -> Option<NaiveDate> {
        let (year, month, day) = match self {
            DateLayout::YearDayMonth => (parts[0], parts[2], parts[1]),
            DateLayout::YearMonthDay => (parts[0], parts[1], parts[2]),
            DateLayout::DayMonthYear => (parts[2], parts[1], parts[0]),
        };
        NaiveDate::from_ymd_opt(
            i32::try_from(year).ok()?,
            u32::try_from(month).ok()?,
            u32::try_from(day).ok()?,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub x: i64,
    pub y: i64,
    pub altitude: f64,
    pub timestamp: NaiveDateTime,
}

impl TrajectorySample {
    pub fn position(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.x as f64, self.y as f64)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("sample {index} repeats the previous timestamp {timestamp}")]
    DegenerateTimeDelta {
        index: usize,
        timestamp: NaiveDateTime,
    },
    #[error("sample {index} at {timestamp} precedes the previous sample at {previous}")]
    NonMonotonicTime {
        index: usize,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },
    #[error("vertical speed is undefined for the first sample")]
    NoPreviousSample,
    #[error("sample index {index} out of range ({len} samples)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Time-ordered samples plus the vertical-speed extrema seen while loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    min_vertical_speed: f64,
    max_vertical_speed: f64,
}

impl Trajectory {
    /// Validate timestamps and compute the vertical-speed extrema.
    ///
    /// Both extrema start at 0 and only widen, so a trajectory that never
    /// climbs keeps `max_vertical_speed == 0`.
    pub fn from_samples(samples: Vec<TrajectorySample>) -> Result<Self, TrajectoryError> {
        let mut min_vertical_speed: f64 = 0.0;
        let mut max_vertical_speed: f64 = 0.0;
        for index in 1..samples.len() {
            let speed = segment_speed(&samples, index)?;
            min_vertical_speed = min_vertical_speed.min(speed);
            max_vertical_speed = max_vertical_speed.max(speed);
        }
        Ok(Self {
            samples,
            min_vertical_speed,
            max_vertical_speed,
        })
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min_vertical_speed(&self) -> f64 {
        self.min_vertical_speed
    }

    pub fn max_vertical_speed(&self) -> f64 {
        self.max_vertical_speed
    }

    /// Climb rate (m/s) between sample `index - 1` and `index`.
    pub fn vertical_speed(&self, index: usize) -> Result<f64, TrajectoryError> {
        if index == 0 {
            return Err(TrajectoryError::NoPreviousSample);
        }
        if index >= self.samples.len() {
            return Err(TrajectoryError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            });
        }
        segment_speed(&self.samples, index)
    }

    /// Per-sample vertical speed; `None` for the first sample.
    pub fn vertical_speeds(&self) -> Vec<Option<f64>> {
        (0..self.samples.len())
            .map(|i| self.vertical_speed(i).ok())
            .collect()
    }

    pub fn summary(&self) -> TrajectorySummary {
        let duration_s = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_seconds(),
            _ => 0,
        };
        let (min_altitude, max_altitude) = self
            .samples
            .iter()
            .map(|s| s.altitude)
            .fold(None, |acc: Option<(f64, f64)>, a| match acc {
                Some((lo, hi)) => Some((lo.min(a), hi.max(a))),
                None => Some((a, a)),
            })
            .unwrap_or((0.0, 0.0));

        TrajectorySummary {
            samples: self.samples.len(),
            duration_s,
            min_altitude,
            max_altitude,
            min_vertical_speed: self.min_vertical_speed,
            max_vertical_speed: self.max_vertical_speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub samples: usize,
    pub duration_s: i64,
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub min_vertical_speed: f64,
    pub max_vertical_speed: f64,
}

fn segment_speed(samples: &[TrajectorySample], index: usize) -> Result<f64, TrajectoryError> {
    let prev = &samples[index - 1];
    let cur = &samples[index];
    let dt = (cur.timestamp - prev.timestamp).num_seconds();
    if dt == 0 {
        return Err(TrajectoryError::DegenerateTimeDelta {
            index,
            timestamp: cur.timestamp,
        });
    }
    if dt < 0 {
        return Err(TrajectoryError::NonMonotonicTime {
            index,
            previous: prev.timestamp,
            timestamp: cur.timestamp,
        });
    }
    Ok((cur.altitude - prev.altitude) / dt as f64)
}

pub fn load_log(path: impl AsRef<Path>, layout: DateLayout) -> Result<Trajectory, TrajectoryError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| TrajectoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trajectory = parse_log(&text, layout)?;
    debug!(
        path = %path.display(),
        samples = trajectory.len(),
        "loaded trajectory log"
    );
    Ok(trajectory)
}

/// Parse a whole log. Any malformed record fails the load.
pub fn parse_log(text: &str, layout: DateLayout) -> Result<Trajectory, TrajectoryError> {
    let mut samples = Vec::new();
    for (i, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_record(line, i + 1, layout)?);
    }
    Trajectory::from_samples(samples)
}

fn parse_record(
    line: &str,
    line_no: usize,
    layout: DateLayout,
) -> Result<TrajectorySample, TrajectoryError> {
    let fail = |reason: String| TrajectoryError::Parse {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(fail(format!(
            "expected at least {MIN_FIELDS} fields, found {}",
            fields.len()
        )));
    }

    let x = fields[1]
        .parse::<i64>()
        .map_err(|e| fail(format!("x {:?}: {e}", fields[1])))?;
    let y = fields[2]
        .parse::<i64>()
        .map_err(|e| fail(format!("y {:?}: {e}", fields[2])))?;
    let altitude = fields[3]
        .parse::<f64>()
        .map_err(|e| fail(format!("altitude {:?}: {e}", fields[3])))?;
    if !altitude.is_finite() {
        return Err(fail(format!("altitude {:?} is not finite", fields[3])));
    }

    let date = split_triplet(fields[4], '/')
        .and_then(|parts| layout.date(parts))
        .ok_or_else(|| fail(format!("invalid date {:?}", fields[4])))?;
    let time = split_triplet(fields[5], ':')
        .and_then(|[h, m, s]| {
            NaiveTime::from_hms_opt(
                u32::try_from(h).ok()?,
                u32::try_from(m).ok()?,
                u32::try_from(s).ok()?,
            )
        })
        .ok_or_else(|| fail(format!("invalid time {:?}", fields[5])))?;

    Ok(TrajectorySample {
        x,
        y,
        altitude,
        timestamp: NaiveDateTime::new(date, time),
    })
}

fn split_triplet(field: &str, sep: char) -> Option<[i64; 3]> {
    let mut parts = field.split(sep).map(|p| p.trim().parse::<i64>().ok());
    let triplet = [parts.next()??, parts.next()??, parts.next()??];
    if parts.next().is_some() {
        return None;
    }
    Some(triplet)
}
