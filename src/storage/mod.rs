//! Storage module for configuration.

pub mod config;

pub use config::{
    AppConfig, ConfigError, HeartRateSettings, RecordingSettings, SamplingSettings,
    SimulationSettings, VelocitySettings,
};
