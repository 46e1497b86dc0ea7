//! Sprint detection on smoothed speed.

use serde::{Deserialize, Serialize};

/// Sprint detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprintConfig {
    /// Speed at or above which a second counts toward a sprint (km/h)
    pub threshold_kmh: f32,
    /// Consecutive qualifying seconds needed to start a sprint
    pub confirm_secs: u32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            threshold_kmh: 20.0,
            confirm_secs: 2,
        }
    }
}

/// Debounced threshold comparator evaluated once per second.
///
/// Entry needs `confirm_secs` qualifying seconds in a row; a single slow
/// second ends the sprint.
#[derive(Debug, Clone, Default)]
pub struct SprintDetector {
    config: SprintConfig,
    in_sprint: bool,
    held_secs: u32,
    minute_count: u32,
    total_count: u32,
}

impl SprintDetector {
    pub fn new(config: SprintConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Evaluate one second of speed. Returns `true` when a sprint starts.
    pub fn update(&mut self, speed_kmh: f32) -> bool {
        if speed_kmh < self.config.threshold_kmh {
            self.held_secs = 0;
            self.in_sprint = false;
            return false;
        }

        self.held_secs = self.held_secs.saturating_add(1);
        if !self.in_sprint && self.held_secs >= self.config.confirm_secs {
            self.in_sprint = true;
            self.minute_count += 1;
            self.total_count += 1;
            return true;
        }
        false
    }

    pub fn in_sprint(&self) -> bool {
        self.in_sprint
    }

    /// Sprints started in the current minute.
    pub fn minute_count(&self) -> u32 {
        self.minute_count
    }

    /// Sprints started since power-up.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Clear the per-minute count and the debounce state.
    pub fn reset_minute(&mut self) {
        self.minute_count = 0;
        self.held_secs = 0;
        self.in_sprint = false;
    }
}
