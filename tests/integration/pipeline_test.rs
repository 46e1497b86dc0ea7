//! Integration tests for the scheduled telemetry pipeline.
//!
//! Runs the scheduler on a manual clock with a simulated GPS fed over a
//! channel, one fix half a second before each second boundary.

use crossbeam::channel::{Receiver, Sender};
use pulsetrack::metrics::zones::{HrZone, VelocityZone};
use pulsetrack::recording::exporter_csv::MemorySink;
use pulsetrack::recording::types::{MinuteSummary, SummaryTimestamp};
use pulsetrack::scheduler::{Clock, ManualClock, Scheduler, Telemetry};
use pulsetrack::sensors::simulated::SimulatedGps;
use pulsetrack::sensors::types::SignalSource;
use pulsetrack::storage::config::AppConfig;
use chrono::NaiveDate;
use std::time::Duration;

/// ADC stuck at mid-scale: no beats, BPM stays unknown.
struct FlatAdc;

impl SignalSource for FlatAdc {
    fn read(&mut self) -> u16 {
        2048
    }
}

type TestTelemetry = Telemetry<FlatAdc, SimulatedGps, Receiver<u8>, MemorySink>;

struct Harness {
    clock: ManualClock,
    scheduler: Scheduler<ManualClock>,
    telemetry: TestTelemetry,
    tx: Sender<u8>,
    summaries: Vec<MinuteSummary>,
}

impl Harness {
    fn new(config: &AppConfig, speeds_kmh: Vec<f32>) -> Self {
        Self::with_gps(config, SimulatedGps::new(speeds_kmh))
    }

    fn with_gps(config: &AppConfig, gps: SimulatedGps) -> Self {
        let clock = ManualClock::new();
        let (tx, rx) = crossbeam::channel::unbounded();
        Self {
            scheduler: Scheduler::from_config(clock.clone(), config),
            clock,
            telemetry: Telemetry::new(
                config,
                FlatAdc,
                gps,
                rx,
                MemorySink::new(),
            ),
            tx,
            summaries: Vec::new(),
        }
    }

    /// Advance to `end` in 1 ms steps, sending GPS fixes if `with_gps`.
    fn run_until(&mut self, end: Duration, with_gps: bool) {
        let mut next_fix = Duration::from_millis(500);
        while self.clock.now() < end {
            if with_gps && self.clock.now() >= next_fix {
                self.tx.send(b'$').unwrap();
                next_fix += Duration::from_secs(1);
            }
            if let Some(summary) = self.scheduler.run_pass(&mut self.telemetry).summary {
                self.summaries.push(summary);
            }
            self.clock.advance(Duration::from_millis(1));
        }
    }
}

#[test]
fn test_steady_run_two_minutes() {
    let config = AppConfig::default();
    let mut h = Harness::new(&config, vec![10.0]);
    h.run_until(Duration::from_secs(125), true);

    assert_eq!(h.summaries.len(), 2);
    assert_eq!(h.telemetry.seconds(), 124);
    assert_eq!(h.telemetry.minutes_saved(), 2);

    let first = &h.summaries[0];
    assert_eq!(first.timestamp.to_string(), "2025-03-01 08:30:59");
    assert!((first.distance_m - 166.667).abs() < 0.01);
    assert!((first.total_distance_km - 0.1667).abs() < 1e-3);
    assert!((first.mean_speed_kmh - 10.0).abs() < 1e-3);
    assert_eq!(first.seconds_in(VelocityZone::Jogging), 60);
    assert_eq!(first.seconds_in_hr(HrZone::Z1), 60);
    assert_eq!(first.mean_bpm, 0.0);
    assert!((first.trimp - 1.0).abs() < 1e-3);

    let second = &h.summaries[1];
    assert_eq!(second.timestamp.to_string(), "2025-03-01 08:31:59");
    assert!((second.total_distance_km - 0.3333).abs() < 1e-3);

    // Header plus one row per minute
    let sink = h.telemetry.sink();
    assert_eq!(sink.lines.len(), 3);
    assert!(sink.lines[1].starts_with("2025-03-01 08:30:59,166.7,0.167,10.0,10.0,0.0,0,60,0,0,"));
}

#[test]
fn test_no_gps_uses_uptime_and_stands_still() {
    let config = AppConfig::default();
    let mut h = Harness::new(&config, vec![10.0]);
    h.run_until(Duration::from_secs(121), false);

    assert_eq!(h.summaries.len(), 2);
    assert_eq!(h.summaries[0].timestamp, SummaryTimestamp::Uptime(60));
    assert_eq!(h.summaries[1].timestamp, SummaryTimestamp::Uptime(120));
    for summary in &h.summaries {
        assert_eq!(summary.distance_m, 0.0);
        assert_eq!(summary.seconds_in(VelocityZone::Walking), 60);
    }
    assert_eq!(h.telemetry.speed_kmh(), None);
}

#[test]
fn test_sprint_counted_once_per_burst() {
    // Seconds 21-25 of every minute at 25 km/h
    let mut profile = vec![10.0; 60];
    for speed in &mut profile[20..25] {
        *speed = 25.0;
    }

    let config = AppConfig::default();
    let mut h = Harness::new(&config, profile);
    h.run_until(Duration::from_secs(121), true);

    assert_eq!(h.summaries.len(), 2);

    let first = &h.summaries[0];
    assert_eq!(first.sprints_minute, 1);
    assert_eq!(first.sprints_total, 1);
    assert!((first.peak_speed_kmh - 25.0).abs() < 1e-4);
    // Smoothed over 5 s: 22, 25, 22 km/h are in the sprint band
    assert_eq!(first.seconds_in(VelocityZone::Sprinting), 3);
    assert_eq!(first.seconds_in(VelocityZone::Running), 4);
    assert_eq!(first.seconds_in(VelocityZone::Jogging), 53);

    let second = &h.summaries[1];
    assert_eq!(second.sprints_minute, 1);
    assert_eq!(second.sprints_total, 2);
}

#[test]
fn test_shorter_minute_from_config() {
    let mut config = AppConfig::default();
    config.recording.minute_secs = 10;
    config.recording.utc_offset_hours = 0;

    let mut h = Harness::new(&config, vec![7.2]);
    h.run_until(Duration::from_secs(31), true);

    assert_eq!(h.summaries.len(), 3);
    assert_eq!(h.summaries[0].timestamp.to_string(), "2025-03-01 14:30:09");
    // 7.2 km/h = 2 m/s
    assert!((h.summaries[0].distance_m - 20.0).abs() < 1e-3);
    assert!((h.summaries[2].total_distance_km - 0.06).abs() < 1e-4);
}

#[test]
fn test_sampling_keeps_pace_with_clock() {
    let config = AppConfig::default();
    let mut h = Harness::new(&config, vec![0.0]);

    let mut samples = 0;
    let mut seconds = 0;
    while h.clock.now() < Duration::from_secs(10) {
        let outcome = h.scheduler.run_pass(&mut h.telemetry);
        samples += usize::from(outcome.sampled);
        seconds += usize::from(outcome.second.is_some());
        h.clock.advance(Duration::from_millis(1));
    }

    // 30 Hz for 10 s, within one sample of the ideal count
    assert!((299..=301).contains(&samples));
    assert_eq!(seconds, 9);
}

#[test]
fn test_local_date_rolls_back_across_midnight() {
    // 05:59 UTC is 23:59 of the previous day at UTC-6
    let start = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(5, 59, 0)
        .unwrap();
    let config = AppConfig::default();
    let mut h = Harness::with_gps(&config, SimulatedGps::new(vec![10.0]).with_start(start));

    assert!(!h.telemetry.report_tick().has_fix());
    h.run_until(Duration::from_secs(121), true);
    assert!(h.telemetry.report_tick().has_fix());

    assert_eq!(h.summaries.len(), 2);
    assert_eq!(h.summaries[0].timestamp.to_string(), "2025-02-28 23:59:59");
    assert_eq!(h.summaries[1].timestamp.to_string(), "2025-03-01 00:00:59");
    assert!(h.telemetry.sink().lines[1].starts_with("2025-02-28 23:59:59,"));
}
