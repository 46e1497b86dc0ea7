//! Fixed-capacity ring buffer and speed smoothing.
//!
//! Everything here lives on the stack: the buffers are sized at compile time
//! so the per-second path never allocates.

use serde::{Deserialize, Serialize};

/// Fixed-capacity circular buffer that overwrites its oldest entry once full.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    /// Storage slots
    slots: [T; N],
    /// Index of the slot the next push writes to
    next: usize,
    /// Number of slots holding a value (saturates at N)
    filled: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            slots: [T::default(); N],
            next: 0,
            filled: 0,
        }
    }

    /// Push a value, returning the entry it displaced once the buffer is full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            Some(self.slots[self.next])
        } else {
            None
        };

        self.slots[self.next] = value;
        self.next = (self.next + 1) % N;
        if self.filled < N {
            self.filled += 1;
        }

        evicted
    }

    /// Iterate over the filled slots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = if self.is_full() { self.next } else { 0 };
        (0..self.filled).map(move |i| self.slots[(start + i) % N])
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Check if nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Check if every slot holds a value.
    pub fn is_full(&self) -> bool {
        self.filled == N
    }

    /// Capacity of the buffer.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop all values.
    pub fn clear(&mut self) {
        self.slots = [T::default(); N];
        self.next = 0;
        self.filled = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of GPS speed readings averaged by the smoother.
pub const SPEED_WINDOW: usize = 5;

/// Moving average over the last `N` readings.
#[derive(Debug, Clone, Default)]
pub struct MovingAverage<const N: usize> {
    buffer: RingBuffer<f32, N>,
}

impl<const N: usize> MovingAverage<N> {
    /// Create an empty moving average.
    pub fn new() -> Self {
        Self {
            buffer: RingBuffer::new(),
        }
    }

    /// Add a value and return the mean of the readings seen so far
    /// (at most the last `N`).
    pub fn add(&mut self, value: f32) -> f32 {
        self.buffer.push(value);
        self.average().unwrap_or(value)
    }

    /// Current mean, or `None` before the first reading.
    pub fn average(&self) -> Option<f32> {
        if self.buffer.is_empty() {
            return None;
        }
        let sum: f32 = self.buffer.iter().sum();
        Some(sum / self.buffer.len() as f32)
    }

    /// Check if the window is full.
    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    /// Reset the average.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Settings for the speed smoother.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Smoothed speeds below this are treated as standing still (km/h)
    pub stationary_kmh: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            stationary_kmh: 0.7,
        }
    }
}

/// Smooths GPS speed over a 5-reading window and floors jitter to zero.
#[derive(Debug, Clone, Default)]
pub struct SpeedSmoother {
    average: MovingAverage<SPEED_WINDOW>,
    config: SmoothingConfig,
}

impl SpeedSmoother {
    /// Create a smoother with the given settings.
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            average: MovingAverage::new(),
            config,
        }
    }

    /// Add a valid speed reading (km/h) and return the smoothed speed.
    pub fn smooth(&mut self, speed_kmh: f32) -> f32 {
        let mean = self.average.add(speed_kmh);
        if mean < self.config.stationary_kmh {
            0.0
        } else {
            mean
        }
    }

    /// Reset the window.
    pub fn reset(&mut self) {
        self.average.reset();
    }
}
