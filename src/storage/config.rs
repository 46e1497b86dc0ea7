//! Application configuration.
//!
//! Loaded from TOML in the platform data directory, or from an explicit
//! path. A missing file yields the defaults the device ships with.

use crate::metrics::beat::BeatDetectorConfig;
use crate::metrics::smoothing::SmoothingConfig;
use crate::metrics::sprint::SprintConfig;
use crate::metrics::zones::{is_ascending, HrZoneConfig, VelocityZoneConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest UTC offset accepted, in hours.
const MAX_UTC_OFFSET_HOURS: i32 = 23;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// ECG acquisition settings
    pub sampling: SamplingSettings,
    /// Beat detection and heart rate zones
    pub heart_rate: HeartRateSettings,
    /// Speed smoothing, velocity zones and sprints
    pub velocity: VelocitySettings,
    /// Minute summary persistence
    pub recording: RecordingSettings,
    /// Simulated sensors for the demo binary
    pub simulation: SimulationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            sampling: SamplingSettings::default(),
            heart_rate: HeartRateSettings::default(),
            velocity: VelocitySettings::default(),
            recording: RecordingSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.sample_rate_hz == 0 {
            return Err(ConfigError::Invalid("sample rate must be non-zero".into()));
        }
        if self.sampling.adc_full_scale == 0 {
            return Err(ConfigError::Invalid("ADC full scale must be non-zero".into()));
        }

        let detector = &self.heart_rate.detector;
        if detector.min_rr_ms == 0 || detector.min_rr_ms > detector.max_rr_ms {
            return Err(ConfigError::Invalid(format!(
                "RR range {}..={} ms is empty",
                detector.min_rr_ms, detector.max_rr_ms
            )));
        }

        let zones = &self.heart_rate.zones;
        if zones.max_hr <= 0.0 {
            return Err(ConfigError::Invalid("max heart rate must be positive".into()));
        }
        if !is_ascending(&zones.edges) {
            return Err(ConfigError::Invalid(
                "heart rate zone edges must be ascending".into(),
            ));
        }
        if !is_ascending(&self.velocity.zones.bins_kmh) {
            return Err(ConfigError::Invalid(
                "velocity zone bins must be ascending".into(),
            ));
        }
        if self.velocity.sprint.confirm_secs == 0 {
            return Err(ConfigError::Invalid(
                "sprint confirmation needs at least one second".into(),
            ));
        }

        if self.recording.minute_secs == 0 {
            return Err(ConfigError::Invalid("minute length must be non-zero".into()));
        }
        if self.recording.utc_offset_hours.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(ConfigError::Invalid(format!(
                "UTC offset {} h is out of range",
                self.recording.utc_offset_hours
            )));
        }

        Ok(())
    }
}

/// ECG acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// ADC sampling rate (Hz)
    pub sample_rate_hz: u32,
    /// Count reported by a saturated ADC
    pub adc_full_scale: u16,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30,
            adc_full_scale: 4095,
        }
    }
}

impl SamplingSettings {
    /// Time between samples (33 333 us at 30 Hz).
    pub fn period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.sample_rate_hz.max(1)))
    }
}

/// Beat detector tuning and heart rate zone table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateSettings {
    pub detector: BeatDetectorConfig,
    pub zones: HrZoneConfig,
}

/// Speed processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocitySettings {
    pub smoothing: SmoothingConfig,
    pub zones: VelocityZoneConfig,
    pub sprint: SprintConfig,
}

/// Minute summary persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// CSV file that summaries are appended to
    pub csv_path: PathBuf,
    /// Hours added to GPS UTC time for the summary timestamp
    pub utc_offset_hours: i32,
    /// Seconds per summary
    pub minute_secs: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("datos.csv"),
            utc_offset_hours: -6,
            minute_secs: 60,
        }
    }
}

/// Simulated sensors used by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// How long to run (s)
    pub duration_secs: u64,
    /// Follow the wall clock instead of running as fast as possible
    pub realtime: bool,
    /// Heart rate of the synthetic ECG (bpm)
    pub heart_rate_bpm: f32,
    /// Speed script replayed by the simulated GPS, one entry per second (km/h)
    pub speed_profile_kmh: Vec<f32>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        // Warm up, steady run, a short sprint, then recover
        let mut profile = vec![4.0; 10];
        profile.extend(std::iter::repeat(11.0).take(60));
        profile.extend(std::iter::repeat(23.0).take(8));
        profile.extend(std::iter::repeat(16.0).take(30));
        profile.extend(std::iter::repeat(6.0).take(12));

        Self {
            duration_secs: 180,
            realtime: false,
            heart_rate_bpm: 150.0,
            speed_profile_kmh: profile,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "pulsetrack", "PulseTrack")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the data directory.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from a specific file.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        let config = AppConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();
    config.validate()?;

    Ok(config)
}

/// Save application configuration to the data directory.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a specific file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
