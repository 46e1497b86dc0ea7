//! Signal processing and training metrics.

pub mod beat;
pub mod filter;
pub mod smoothing;
pub mod sprint;
pub mod zones;

pub use beat::{BeatDetector, BeatDetectorConfig, BeatEvent, DetectorPhase, RrBuffer};
pub use filter::{Biquad, BiquadCoefficients, EcgFilter, FilterBank, ECG_SECTIONS};
pub use smoothing::{MovingAverage, RingBuffer, SmoothingConfig, SpeedSmoother};
pub use sprint::{SprintConfig, SprintDetector};
pub use zones::{
    HrZone, HrZoneConfig, HrZoneTally, VelocityZone, VelocityZoneConfig, VelocityZoneTally,
    ZoneTally,
};
