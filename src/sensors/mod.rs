//! Sensor interfaces and simulated devices.

pub mod simulated;
pub mod types;

pub use simulated::{SimulatedGps, SyntheticEcg, ADC_FULL_SCALE};
pub use types::{ByteSource, GeoPoint, GpsReceiver, GpsStatus, SignalSource};
