//! PulseTrack - wearable ECG and GPS training telemetry
//!
//! Samples a single-lead ECG, detects heartbeats and derives heart rate,
//! smooths GPS speed, classifies heart rate and velocity zones, detects
//! sprints, and appends a summary of every minute to a CSV file. All jobs
//! run from one cooperative scheduler on a single thread.

pub mod metrics;
pub mod recording;
pub mod scheduler;
pub mod sensors;
pub mod storage;

// Re-export commonly used types
pub use metrics::beat::BeatDetector;
pub use recording::aggregator::MinuteAggregator;
pub use recording::exporter_csv::{CsvSink, SummarySink};
pub use scheduler::pipeline::{Scheduler, Telemetry};
pub use storage::config::AppConfig;
