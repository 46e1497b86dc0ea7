//! Collaborator interfaces for the analog front end, the GPS receiver and
//! the serial line that carries its sentences.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Source of raw biosignal samples (one ADC conversion per call).
pub trait SignalSource {
    /// Read the current raw ADC count.
    fn read(&mut self) -> u16;
}

/// Byte-oriented input from the GPS module.
pub trait ByteSource {
    /// Next pending byte, or `None` when nothing is buffered.
    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl ByteSource for crossbeam::channel::Receiver<u8> {
    fn read_byte(&mut self) -> Option<u8> {
        self.try_recv().ok()
    }
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A GPS sentence decoder.
///
/// Every accessor is validity-gated: `None` means the receiver has no
/// current fix for that quantity and the caller must treat it as "no update".
pub trait GpsReceiver {
    /// Feed one byte from the serial line. Returns `true` when the byte
    /// completed a sentence.
    fn encode(&mut self, byte: u8) -> bool;

    /// Ground speed (km/h).
    fn speed_kmh(&self) -> Option<f32>;

    fn location(&self) -> Option<GeoPoint>;

    /// UTC date and time of the last fix.
    fn date_time(&self) -> Option<NaiveDateTime>;

    fn satellites(&self) -> Option<u32>;

    /// Horizontal dilution of precision.
    fn hdop(&self) -> Option<f32>;

    fn altitude_m(&self) -> Option<f32>;
}

/// Snapshot of everything a receiver reports, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsStatus {
    pub speed_kmh: Option<f32>,
    pub location: Option<GeoPoint>,
    pub date_time: Option<NaiveDateTime>,
    pub satellites: Option<u32>,
    pub hdop: Option<f32>,
    pub altitude_m: Option<f32>,
}

impl GpsStatus {
    pub fn read<G: GpsReceiver + ?Sized>(gps: &G) -> Self {
        Self {
            speed_kmh: gps.speed_kmh(),
            location: gps.location(),
            date_time: gps.date_time(),
            satellites: gps.satellites(),
            hdop: gps.hdop(),
            altitude_m: gps.altitude_m(),
        }
    }

    /// Whether a position fix is available.
    pub fn has_fix(&self) -> bool {
        self.location.is_some()
    }
}
