//! Cascaded biquad filter bank for conditioning the raw biosignal.
//!
//! The default chain was designed offline for a 30 Hz sample rate: two
//! low-pass sections knock down high-frequency noise and two high-pass
//! sections remove baseline wander, leaving the QRS energy for the beat
//! detector.

use serde::{Deserialize, Serialize};

/// Coefficients of one second-order section, normalized so `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    pub const fn new(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Steady-state gain for a constant input.
    pub fn dc_gain(&self) -> f32 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Default 4-stage chain for ECG/EMG at 30 Hz.
pub const ECG_SECTIONS: [BiquadCoefficients; 4] = [
    BiquadCoefficients::new(0.373_734_87, 0.747_469_75, 0.373_734_87, 1.028_309_6, 0.287_746_14),
    BiquadCoefficients::new(1.0, 2.0, 1.0, 1.324_402_2, 0.640_374_07),
    BiquadCoefficients::new(1.0, -2.0, 1.0, -1.809_396_6, 0.819_973_36),
    BiquadCoefficients::new(1.0, -2.0, 1.0, -1.914_243, 0.924_887_6),
];

/// A single biquad section in transposed direct form II.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Run one sample through the section.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let c = &self.coefficients;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Internal state `(z1, z2)`.
    pub fn state(&self) -> (f32, f32) {
        (self.z1, self.z2)
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Fixed cascade of `N` biquad sections applied in series.
#[derive(Debug, Clone)]
pub struct FilterBank<const N: usize> {
    stages: [Biquad; N],
}

impl<const N: usize> FilterBank<N> {
    /// Build a bank from per-stage coefficients.
    pub fn new(sections: [BiquadCoefficients; N]) -> Self {
        Self {
            stages: sections.map(Biquad::new),
        }
    }

    /// Filter one raw sample; each stage feeds the next.
    pub fn process(&mut self, raw: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(raw, |x, stage| stage.process(x))
    }

    pub fn stages(&self) -> &[Biquad; N] {
        &self.stages
    }

    /// Zero the state of every stage.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

/// The filter bank used for the heart-rate channel.
pub type EcgFilter = FilterBank<4>;

impl Default for FilterBank<4> {
    fn default() -> Self {
        Self::new(ECG_SECTIONS)
    }
}
