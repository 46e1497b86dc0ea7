//! Adaptive-threshold heartbeat detection.
//!
//! The detector looks at filtered samples through a 3-sample window and
//! treats the middle sample as a candidate peak when it is a local maximum.
//! Candidates above the adaptive threshold are beats and feed the signal
//! level; the rest feed the noise level. The threshold sits a quarter of the
//! way from the noise level up to the signal level.
//!
//! During the warm-up period nothing is detected; the noise level is seeded
//! from the signal magnitude instead.

use crate::metrics::smoothing::RingBuffer;
use serde::{Deserialize, Serialize};

/// Number of RR intervals averaged for the BPM estimate.
pub const RR_WINDOW: usize = 4;

/// Weight of a new candidate in the signal/noise level averages.
const LEVEL_ALPHA: f32 = 0.125;

/// Weight of a new sample in the warm-up noise estimate.
const WARMUP_ALPHA: f32 = 0.01;

/// Beat detector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatDetectorConfig {
    /// Time from start of run before detection begins (ms)
    pub warmup_ms: u64,
    /// Minimum time between accepted beats (ms, ~200 bpm)
    pub refractory_ms: u64,
    /// Shortest plausible RR interval (ms)
    pub min_rr_ms: u32,
    /// Longest plausible RR interval (ms)
    pub max_rr_ms: u32,
}

impl Default for BeatDetectorConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 1500,
            refractory_ms: 300,
            min_rr_ms: 300,
            max_rr_ms: 2000,
        }
    }
}

/// An accepted beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Detection time (ms since start of run)
    pub timestamp_ms: u64,
    /// Time since the previous accepted beat (ms)
    pub rr_ms: u64,
    /// Whether the RR interval was plausible and updated the BPM
    pub valid: bool,
}

/// Signal and noise level estimates and the threshold derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdaptiveThreshold {
    pub signal_level: f32,
    pub noise_level: f32,
    pub threshold: f32,
}

impl AdaptiveThreshold {
    fn seed_noise(&mut self, magnitude: f32) {
        self.noise_level = (1.0 - WARMUP_ALPHA) * self.noise_level + WARMUP_ALPHA * magnitude;
        self.threshold = 1.5 * self.noise_level;
    }

    fn update_signal(&mut self, amplitude: f32) {
        self.signal_level = (1.0 - LEVEL_ALPHA) * self.signal_level + LEVEL_ALPHA * amplitude;
    }

    fn update_noise(&mut self, magnitude: f32) {
        self.noise_level = (1.0 - LEVEL_ALPHA) * self.noise_level + LEVEL_ALPHA * magnitude;
    }

    fn recompute(&mut self) {
        let ceiling = self.signal_level.max(self.noise_level + 1.0);
        self.threshold = self.noise_level + 0.25 * (ceiling - self.noise_level);
    }
}

/// Recent RR intervals and the BPM derived from their mean.
#[derive(Debug, Clone, Default)]
pub struct RrBuffer {
    intervals: RingBuffer<u32, RR_WINDOW>,
}

impl RrBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an interval and return the updated BPM.
    pub fn push(&mut self, rr_ms: u32) -> f32 {
        self.intervals.push(rr_ms);
        self.bpm()
    }

    /// Mean of the stored intervals (ms).
    pub fn mean_ms(&self) -> Option<f32> {
        if self.intervals.is_empty() {
            return None;
        }
        let sum: u64 = self.intervals.iter().map(u64::from).sum();
        Some(sum as f32 / self.intervals.len() as f32)
    }

    /// BPM from the mean interval, or 0 before the first interval.
    pub fn bpm(&self) -> f32 {
        match self.mean_ms() {
            Some(mean) if mean > 0.0 => 60_000.0 / mean,
            _ => 0.0,
        }
    }

    /// Stored intervals, oldest first.
    pub fn intervals(&self) -> impl Iterator<Item = u32> + '_ {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// 3-sample sliding window over filtered values.
#[derive(Debug, Clone, Copy, Default)]
struct PeakWindow {
    newest: f32,
    middle: f32,
    oldest: f32,
}

impl PeakWindow {
    fn shift(&mut self, sample: f32) {
        self.oldest = self.middle;
        self.middle = self.newest;
        self.newest = sample;
    }

    fn middle_is_local_max(&self) -> bool {
        self.middle > self.oldest && self.middle >= self.newest
    }
}

/// Detection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// Seeding the noise estimate
    WarmUp,
    /// Detecting beats
    Active,
}

/// Adaptive-threshold peak detector over filtered samples.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatDetectorConfig,
    window: PeakWindow,
    levels: AdaptiveThreshold,
    rr: RrBuffer,
    last_beat_ms: u64,
    bpm: f32,
    beats: u64,
}

impl BeatDetector {
    pub fn new(config: BeatDetectorConfig) -> Self {
        Self {
            config,
            window: PeakWindow::default(),
            levels: AdaptiveThreshold::default(),
            rr: RrBuffer::new(),
            last_beat_ms: 0,
            bpm: 0.0,
            beats: 0,
        }
    }

    /// Feed one filtered sample taken at `now_ms` (ms since start of run).
    ///
    /// Returns the beat when the previous sample turned out to be an
    /// accepted peak.
    pub fn process(&mut self, filtered: f32, now_ms: u64) -> Option<BeatEvent> {
        self.window.shift(filtered);
        let candidate = self.window.middle;

        if self.phase(now_ms) == DetectorPhase::WarmUp {
            self.levels.seed_noise(candidate.abs());
            return None;
        }

        let since_last = now_ms.saturating_sub(self.last_beat_ms);
        if !self.window.middle_is_local_max() || since_last <= self.config.refractory_ms {
            return None;
        }

        let event = if candidate > self.levels.threshold {
            let rr_ms = since_last;
            self.last_beat_ms = now_ms;
            self.beats += 1;
            self.levels.update_signal(candidate);

            let valid = self.rr_in_range(rr_ms);
            if valid {
                // In range, so it fits in u32
                self.bpm = self.rr.push(rr_ms as u32);
            } else {
                tracing::debug!(rr_ms, "Discarding implausible RR interval");
            }

            Some(BeatEvent {
                timestamp_ms: now_ms,
                rr_ms,
                valid,
            })
        } else {
            self.levels.update_noise(candidate.abs());
            None
        };

        self.levels.recompute();
        event
    }

    fn rr_in_range(&self, rr_ms: u64) -> bool {
        (u64::from(self.config.min_rr_ms)..=u64::from(self.config.max_rr_ms)).contains(&rr_ms)
    }

    /// Current phase for a given time.
    pub fn phase(&self, now_ms: u64) -> DetectorPhase {
        if now_ms < self.config.warmup_ms {
            DetectorPhase::WarmUp
        } else {
            DetectorPhase::Active
        }
    }

    /// Running BPM, 0 until a plausible RR interval has been seen.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Accepted beats, including those with implausible RR intervals.
    pub fn beat_count(&self) -> u64 {
        self.beats
    }

    pub fn last_beat_ms(&self) -> u64 {
        self.last_beat_ms
    }

    pub fn levels(&self) -> &AdaptiveThreshold {
        &self.levels
    }

    pub fn rr_intervals(&self) -> &RrBuffer {
        &self.rr
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(BeatDetectorConfig::default())
    }
}
