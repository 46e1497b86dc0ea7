//! Per-second accumulation and per-minute summaries.
//!
//! Everything scoped to the current minute lives in `MinuteAccumulators` so
//! that a boundary resets it in one assignment. Lifetime totals live beside
//! it and are never cleared.

use crate::metrics::sprint::{SprintConfig, SprintDetector};
use crate::metrics::zones::{
    HrZone, HrZoneConfig, HrZoneTally, VelocityZone, VelocityZoneConfig, VelocityZoneTally,
};
use crate::recording::types::{MinuteSummary, SummaryTimestamp};

const KMH_PER_MS: f32 = 3.6;

/// What one second contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondSnapshot {
    pub speed_kmh: f32,
    pub distance_m: f32,
    pub velocity_zone: VelocityZone,
    pub hr_zone: HrZone,
    /// A sprint started this second
    pub sprint_started: bool,
}

#[derive(Debug, Clone, Default)]
struct MinuteAccumulators {
    seconds: u32,
    distance_m: f32,
    peak_speed_kmh: f32,
    bpm_sum: f32,
    bpm_samples: u32,
    trimp: f32,
    velocity: VelocityZoneTally,
    heart_rate: HrZoneTally,
}

/// Accumulates one-second observations into minute summaries.
#[derive(Debug, Clone)]
pub struct MinuteAggregator {
    hr_zones: HrZoneConfig,
    velocity_zones: VelocityZoneConfig,
    sprints: SprintDetector,
    minute: MinuteAccumulators,
    total_distance_m: f64,
}

impl MinuteAggregator {
    pub fn new(
        hr_zones: HrZoneConfig,
        velocity_zones: VelocityZoneConfig,
        sprint: SprintConfig,
    ) -> Self {
        Self {
            hr_zones,
            velocity_zones,
            sprints: SprintDetector::new(sprint),
            minute: MinuteAccumulators::default(),
            total_distance_m: 0.0,
        }
    }

    /// Record one second of smoothed speed (km/h) and the current BPM.
    pub fn record_second(&mut self, speed_kmh: f32, bpm: f32) -> SecondSnapshot {
        let speed_kmh = speed_kmh.max(0.0);
        let distance_m = speed_kmh / KMH_PER_MS;
        let velocity_zone = self.velocity_zones.classify(speed_kmh);
        let hr_zone = self.hr_zones.classify(bpm);

        let m = &mut self.minute;
        m.seconds += 1;
        m.distance_m += distance_m;
        m.peak_speed_kmh = m.peak_speed_kmh.max(speed_kmh);
        m.velocity.add_second(velocity_zone.index(), distance_m);
        m.heart_rate.add_second(hr_zone.index(), 0.0);
        m.trimp += self.hr_zones.trimp_weight(hr_zone) / 60.0;
        if bpm > 0.0 {
            m.bpm_sum += bpm;
            m.bpm_samples += 1;
        }
        self.total_distance_m += f64::from(distance_m);

        let sprint_started = self.sprints.update(speed_kmh);
        if sprint_started {
            tracing::info!(
                speed_kmh,
                total = self.sprints.total_count(),
                "Sprint detected"
            );
        }

        SecondSnapshot {
            speed_kmh,
            distance_m,
            velocity_zone,
            hr_zone,
            sprint_started,
        }
    }

    /// Close the current minute: build its summary and reset every
    /// minute-scoped accumulator.
    pub fn finish_minute(&mut self, timestamp: SummaryTimestamp) -> MinuteSummary {
        let m = std::mem::take(&mut self.minute);

        let mean_bpm = if m.bpm_samples > 0 {
            m.bpm_sum / m.bpm_samples as f32
        } else {
            0.0
        };
        let mean_speed_kmh = if m.seconds > 0 {
            m.distance_m / m.seconds as f32 * KMH_PER_MS
        } else {
            0.0
        };

        let summary = MinuteSummary {
            timestamp,
            distance_m: m.distance_m,
            total_distance_km: (self.total_distance_m / 1000.0) as f32,
            mean_speed_kmh,
            peak_speed_kmh: m.peak_speed_kmh,
            mean_bpm,
            velocity_zone_secs: m.velocity.seconds,
            velocity_zone_distance_m: m.velocity.distance_m,
            hr_zone_secs: m.heart_rate.seconds,
            trimp: m.trimp,
            sprints_minute: self.sprints.minute_count(),
            sprints_total: self.sprints.total_count(),
        };

        self.sprints.reset_minute();
        summary
    }

    /// Seconds recorded in the current minute.
    pub fn seconds_in_minute(&self) -> u32 {
        self.minute.seconds
    }

    /// Distance covered in the current minute (m).
    pub fn minute_distance_m(&self) -> f32 {
        self.minute.distance_m
    }

    /// TRIMP accrued in the current minute.
    pub fn minute_trimp(&self) -> f32 {
        self.minute.trimp
    }

    pub fn peak_speed_kmh(&self) -> f32 {
        self.minute.peak_speed_kmh
    }

    pub fn velocity_tally(&self) -> &VelocityZoneTally {
        &self.minute.velocity
    }

    pub fn hr_tally(&self) -> &HrZoneTally {
        &self.minute.heart_rate
    }

    /// Distance since power-up (m).
    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn sprints(&self) -> &SprintDetector {
        &self.sprints
    }
}

impl Default for MinuteAggregator {
    fn default() -> Self {
        Self::new(
            HrZoneConfig::default(),
            VelocityZoneConfig::default(),
            SprintConfig::default(),
        )
    }
}
