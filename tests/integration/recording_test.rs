//! Integration tests for minute summaries persisted to CSV.
//!
//! Drives the full pipeline with the synthetic ECG and simulated GPS, the
//! same way the binary does in accelerated mode.

use crossbeam::channel::Receiver;
use pulsetrack::metrics::zones::HrZone;
use pulsetrack::recording::exporter_csv::{csv_header, CsvSink, MemorySink, SummarySink};
use pulsetrack::recording::types::MinuteSummary;
use pulsetrack::scheduler::{Clock, ManualClock, Scheduler, Telemetry};
use pulsetrack::sensors::simulated::{SimulatedGps, SyntheticEcg};
use pulsetrack::storage::config::AppConfig;
use std::time::Duration;
use tempfile::tempdir;

type DemoTelemetry<K> = Telemetry<SyntheticEcg, SimulatedGps, Receiver<u8>, K>;

fn run_for<K: SummarySink>(
    config: &AppConfig,
    sink: K,
    secs: u64,
) -> (DemoTelemetry<K>, Vec<MinuteSummary>) {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::from_config(clock.clone(), config);
    let (tx, rx) = crossbeam::channel::unbounded();
    let mut telemetry = Telemetry::new(
        config,
        SyntheticEcg::new(30.0, 150.0),
        SimulatedGps::new(vec![12.0]),
        rx,
        sink,
    );
    // A failing sink is reported again at each minute
    let _ = telemetry.prepare_sink();

    let mut summaries = Vec::new();
    let mut next_fix = Duration::from_millis(500);
    while clock.now() < Duration::from_secs(secs) {
        if clock.now() >= next_fix {
            tx.send(b'$').unwrap();
            next_fix += Duration::from_secs(1);
        }
        if let Some(summary) = scheduler.run_pass(&mut telemetry).summary {
            summaries.push(summary);
        }
        clock.advance(Duration::from_millis(1));
    }

    (telemetry, summaries)
}

#[test]
fn test_full_run_writes_one_row_per_minute() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.csv");
    let config = AppConfig::default();

    let (telemetry, summaries) = run_for(&config, CsvSink::new(&path), 121);
    assert_eq!(summaries.len(), 2);
    assert_eq!(telemetry.minutes_saved(), 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], csv_header());

    let columns = csv_header().split(',').count();
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), columns);
    }
    assert!(lines[1].starts_with("2025-03-01 08:30:59,200.0,0.200,12.0,12.0,"));
    assert!(lines[2].starts_with("2025-03-01 08:31:59,200.0,0.400,"));
}

#[test]
fn test_detected_heart_rate_reaches_minute_summary() {
    let config = AppConfig::default();
    let (telemetry, summaries) = run_for(&config, MemorySink::new(), 121);
    assert_eq!(summaries.len(), 2);

    // Before the first valid RR interval the heart rate is unknown (zone 1)
    let first = &summaries[0];
    let unknown = first.seconds_in_hr(HrZone::Z1);
    assert!((1..10).contains(&unknown), "{} s in zone 1", unknown);
    assert!((first.mean_bpm - 150.0).abs() < 5.0);

    // 150 bpm of a 200 bpm maximum is zone 4 for the whole minute
    let second = &summaries[1];
    assert!((second.mean_bpm - 150.0).abs() < 3.0);
    assert_eq!(second.seconds_in_hr(HrZone::Z4), 60);
    assert!((second.trimp - 4.0).abs() < 1e-3);

    let row: Vec<&str> = telemetry.sink().lines[2].split(',').collect();
    let bpm_column: f32 = row[5].parse().unwrap();
    assert!((bpm_column - 150.0).abs() < 3.0);
}

#[test]
fn test_rows_appended_to_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.csv");
    let config = AppConfig::default();

    run_for(&config, CsvSink::new(&path), 61);
    run_for(&config, CsvSink::new(&path), 61);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert_eq!(content.matches("Timestamp").count(), 1);
}

#[test]
fn test_unwritable_sink_does_not_stop_the_pipeline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("datos.csv");
    let config = AppConfig::default();

    let (telemetry, summaries) = run_for(&config, CsvSink::new(&path), 121);

    assert_eq!(summaries.len(), 2);
    assert_eq!(telemetry.minutes_saved(), 0);
    assert!(!path.exists());
    // The failed minute was still reset
    assert!((summaries[1].distance_m - summaries[0].distance_m).abs() < 1e-3);
    assert_eq!(telemetry.aggregator().seconds_in_minute(), 0);
}

#[test]
fn test_foreign_file_left_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.csv");
    std::fs::write(&path, "lap,time\n1,62.3\n").unwrap();
    let config = AppConfig::default();

    let (telemetry, summaries) = run_for(&config, CsvSink::new(&path), 61);

    assert_eq!(summaries.len(), 1);
    assert_eq!(telemetry.minutes_saved(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "lap,time\n1,62.3\n");
}
