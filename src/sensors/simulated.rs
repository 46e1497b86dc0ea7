//! Simulated collaborators for demo runs and tests.
//!
//! `SyntheticEcg` produces an ECG-like pulse train riding on slow baseline
//! wander. `SimulatedGps` plays back a scripted speed profile, advancing one
//! fix per byte received on its serial line.

use crate::sensors::types::{GeoPoint, GpsReceiver, SignalSource};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use noise::{NoiseFn, Perlin};

/// Full-scale count of a 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;

/// Metres per degree of latitude.
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Synthetic ECG generator.
pub struct SyntheticEcg {
    sample_rate_hz: f32,
    heart_rate_bpm: f32,
    baseline: f32,
    amplitude: f32,
    wander: f32,
    perlin: Perlin,
    sample_index: u64,
}

impl SyntheticEcg {
    /// Create a generator for a steady heart rate.
    pub fn new(sample_rate_hz: f32, heart_rate_bpm: f32) -> Self {
        Self {
            sample_rate_hz,
            heart_rate_bpm,
            baseline: 2048.0,
            amplitude: 900.0,
            wander: 120.0,
            perlin: Perlin::new(7),
            sample_index: 0,
        }
    }

    /// Set the baseline wander amplitude in ADC counts.
    pub fn with_wander(mut self, counts: f32) -> Self {
        self.wander = counts;
        self
    }


    fn value_at(&self, t: f64) -> f32 {
        let period = 60.0 / f64::from(self.heart_rate_bpm.max(1.0));
        let since_beat = t % period;
        // R wave as a narrow gaussian, ~40 ms wide
        let r = (-(since_beat / 0.04).powi(2)).exp() as f32;
        let drift = self.perlin.get([t * 0.2, 0.5]) as f32;
        self.baseline + self.amplitude * r + self.wander * drift
    }
}

impl SignalSource for SyntheticEcg {
    fn read(&mut self) -> u16 {
        let t = self.sample_index as f64 / f64::from(self.sample_rate_hz);
        self.sample_index += 1;
        self.value_at(t).round().clamp(0.0, f32::from(ADC_FULL_SCALE)) as u16
    }
}

/// A GPS receiver that replays a speed script.
///
/// Until the first byte arrives there is no fix. Each byte afterwards moves
/// the fix forward by one second; the script loops when it runs out.
#[derive(Debug, Clone)]
pub struct SimulatedGps {
    speeds_kmh: Vec<f32>,
    fixes: u64,
    position: GeoPoint,
    start: NaiveDateTime,
    satellites: u32,
}

impl SimulatedGps {
    pub fn new(speeds_kmh: Vec<f32>) -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap_or_default();
        Self {
            speeds_kmh,
            fixes: 0,
            position: GeoPoint {
                lat: 19.4326,
                lon: -99.1332,
            },
            start,
            satellites: 8,
        }
    }

    /// Start the clock of the fixes at a given UTC time.
    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    fn current_speed(&self) -> f32 {
        if self.speeds_kmh.is_empty() {
            return 0.0;
        }
        let idx = (self.fixes.saturating_sub(1) % self.speeds_kmh.len() as u64) as usize;
        self.speeds_kmh[idx]
    }

    fn has_fix(&self) -> bool {
        self.fixes > 0
    }
}

impl GpsReceiver for SimulatedGps {
    fn encode(&mut self, _byte: u8) -> bool {
        self.fixes += 1;
        // Head north at the scripted speed
        let meters = f64::from(self.current_speed()) / 3.6;
        self.position.lat += meters / METERS_PER_DEG_LAT;
        true
    }

    fn speed_kmh(&self) -> Option<f32> {
        self.has_fix().then(|| self.current_speed())
    }

    fn location(&self) -> Option<GeoPoint> {
        self.has_fix().then_some(self.position)
    }

    fn date_time(&self) -> Option<NaiveDateTime> {
        self.has_fix()
            .then(|| self.start + Duration::seconds(self.fixes as i64 - 1))
    }

    fn satellites(&self) -> Option<u32> {
        self.has_fix().then_some(self.satellites)
    }

    fn hdop(&self) -> Option<f32> {
        self.has_fix().then_some(0.9)
    }

    fn altitude_m(&self) -> Option<f32> {
        self.has_fix().then_some(2240.0)
    }
}
