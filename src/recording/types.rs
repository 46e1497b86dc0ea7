//! Recording types for per-minute summaries.

use crate::metrics::zones::{HrZone, VelocityZone};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// When a summary was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryTimestamp {
    /// Local wall-clock time from the GPS
    Local(NaiveDateTime),
    /// Seconds since power-up, used when the GPS has no valid time
    Uptime(u64),
}

impl std::fmt::Display for SummaryTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryTimestamp::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            SummaryTimestamp::Uptime(secs) => write!(f, "{}", secs),
        }
    }
}

/// One minute of aggregated training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteSummary {
    pub timestamp: SummaryTimestamp,
    /// Distance covered this minute (m)
    pub distance_m: f32,
    /// Distance since power-up (km)
    pub total_distance_km: f32,
    /// Mean speed over the minute (km/h)
    pub mean_speed_kmh: f32,
    /// Highest smoothed speed this minute (km/h)
    pub peak_speed_kmh: f32,
    /// Mean of the non-zero per-second BPM readings
    pub mean_bpm: f32,
    /// Seconds spent in each velocity zone
    pub velocity_zone_secs: [u32; VelocityZone::COUNT],
    /// Metres covered in each velocity zone
    pub velocity_zone_distance_m: [f32; VelocityZone::COUNT],
    /// Seconds spent in each heart rate zone
    pub hr_zone_secs: [u32; HrZone::COUNT],
    /// Training impulse accrued this minute
    pub trimp: f32,
    /// Sprints started this minute
    pub sprints_minute: u32,
    /// Sprints started since power-up
    pub sprints_total: u32,
}

impl MinuteSummary {
    /// Seconds in the velocity zone.
    pub fn seconds_in(&self, zone: VelocityZone) -> u32 {
        self.velocity_zone_secs[zone.index()]
    }

    /// Seconds in the heart rate zone.
    pub fn seconds_in_hr(&self, zone: HrZone) -> u32 {
        self.hr_zone_secs[zone.index()]
    }
}

/// Recorder errors.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The sink could not be opened or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Existing file does not start with the expected header
    #[error("Unexpected header in {path}: {found}")]
    HeaderMismatch { path: String, found: String },
}
