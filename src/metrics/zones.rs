//! Heart rate and velocity zone classification.
//!
//! Zones are closed-open intervals over an ascending table of edges: a value
//! exactly on an edge belongs to the zone above it. Values past either end
//! saturate into the first or last zone.

use serde::{Deserialize, Serialize};

/// Heart rate intensity zone, as a fraction of maximum heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HrZone {
    /// Below 50% HRmax
    Z1,
    /// 50-60% HRmax
    Z2,
    /// 60-70% HRmax
    Z3,
    /// 70-80% HRmax
    Z4,
    /// 80-90% HRmax
    Z5,
    /// 90% HRmax and above
    Z6,
}

impl HrZone {
    pub const COUNT: usize = 6;

    pub const ALL: [HrZone; Self::COUNT] = [
        HrZone::Z1,
        HrZone::Z2,
        HrZone::Z3,
        HrZone::Z4,
        HrZone::Z5,
        HrZone::Z6,
    ];

    /// Position in `ALL` (0-5).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Zone at a given index, saturating at `Z6`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::COUNT - 1)]
    }

    /// Short label used in CSV column names.
    pub fn label(self) -> &'static str {
        match self {
            HrZone::Z1 => "HZ1",
            HrZone::Z2 => "HZ2",
            HrZone::Z3 => "HZ3",
            HrZone::Z4 => "HZ4",
            HrZone::Z5 => "HZ5",
            HrZone::Z6 => "HZ6",
        }
    }
}

impl std::fmt::Display for HrZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z{}", self.index() + 1)
    }
}

/// Kinematic zone from smoothed GPS speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VelocityZone {
    Walking,
    Jogging,
    Running,
    Sprinting,
}

impl VelocityZone {
    pub const COUNT: usize = 4;

    pub const ALL: [VelocityZone; Self::COUNT] = [
        VelocityZone::Walking,
        VelocityZone::Jogging,
        VelocityZone::Running,
        VelocityZone::Sprinting,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::COUNT - 1)]
    }

    /// Short label used in CSV column names.
    pub fn label(self) -> &'static str {
        match self {
            VelocityZone::Walking => "CAM",
            VelocityZone::Jogging => "TRO",
            VelocityZone::Running => "CAR",
            VelocityZone::Sprinting => "SPR",
        }
    }
}

impl std::fmt::Display for VelocityZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VelocityZone::Walking => write!(f, "Walking"),
            VelocityZone::Jogging => write!(f, "Jogging"),
            VelocityZone::Running => write!(f, "Running"),
            VelocityZone::Sprinting => write!(f, "Sprinting"),
        }
    }
}

/// Number of edges below `value` in an ascending table.
fn edges_passed(edges: &[f32], value: f32) -> usize {
    edges.iter().take_while(|&&edge| value >= edge).count()
}

/// Check that a boundary table is strictly ascending.
pub fn is_ascending(edges: &[f32]) -> bool {
    edges.windows(2).all(|w| w[0] < w[1])
}

/// Heart rate zone table and the TRIMP weight of each zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrZoneConfig {
    /// Reference maximum heart rate (bpm)
    pub max_hr: f32,
    /// Zone edges as fractions of `max_hr`, ascending
    pub edges: [f32; 5],
    /// Training load per minute spent in each zone
    pub trimp_weights: [f32; HrZone::COUNT],
}

impl Default for HrZoneConfig {
    fn default() -> Self {
        Self {
            max_hr: 200.0,
            edges: [0.50, 0.60, 0.70, 0.80, 0.90],
            trimp_weights: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
    }
}

impl HrZoneConfig {
    /// Classify an instantaneous BPM. Unknown heart rate (<= 0) is zone 1.
    pub fn classify(&self, bpm: f32) -> HrZone {
        if bpm <= 0.0 || self.max_hr <= 0.0 {
            return HrZone::Z1;
        }
        HrZone::from_index(edges_passed(&self.edges, bpm / self.max_hr))
    }

    /// TRIMP accrued per minute in a zone.
    pub fn trimp_weight(&self, zone: HrZone) -> f32 {
        self.trimp_weights[zone.index()]
    }

    /// Lower BPM bound of a zone.
    pub fn lower_bpm(&self, zone: HrZone) -> f32 {
        match zone.index() {
            0 => 0.0,
            i => self.edges[i - 1] * self.max_hr,
        }
    }
}

/// Speed bins separating the velocity zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityZoneConfig {
    /// Walking/jogging/running/sprinting edges (km/h), ascending
    pub bins_kmh: [f32; 3],
}

impl Default for VelocityZoneConfig {
    fn default() -> Self {
        Self {
            bins_kmh: [7.0, 15.0, 20.0],
        }
    }
}

impl VelocityZoneConfig {
    pub fn classify(&self, speed_kmh: f32) -> VelocityZone {
        VelocityZone::from_index(edges_passed(&self.bins_kmh, speed_kmh))
    }
}

/// Seconds and metres accumulated per zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneTally<const N: usize> {
    pub seconds: [u32; N],
    pub distance_m: [f32; N],
}

impl<const N: usize> ZoneTally<N> {
    pub fn new() -> Self {
        Self {
            seconds: [0; N],
            distance_m: [0.0; N],
        }
    }

    /// Credit one second (and the distance covered in it) to a zone.
    pub fn add_second(&mut self, zone_index: usize, distance_m: f32) {
        let i = zone_index.min(N - 1);
        self.seconds[i] += 1;
        self.distance_m[i] += distance_m;
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds.iter().sum()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<const N: usize> Default for ZoneTally<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds per heart rate zone. `distance_m` stays at zero: distance is
/// only tallied per velocity zone.
pub type HrZoneTally = ZoneTally<{ HrZone::COUNT }>;
pub type VelocityZoneTally = ZoneTally<{ VelocityZone::COUNT }>;
