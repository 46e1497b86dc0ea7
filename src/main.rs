//! PulseTrack - wearable ECG and GPS training telemetry
//!
//! Main entry point. Runs the full pipeline against simulated sensors,
//! either following the wall clock or as fast as possible.

use anyhow::Context;
use crossbeam::channel::{Receiver, Sender};
use pulsetrack::recording::exporter_csv::CsvSink;
use pulsetrack::scheduler::{Clock, ManualClock, MonotonicClock, Scheduler, Telemetry};
use pulsetrack::sensors::simulated::{SimulatedGps, SyntheticEcg};
use pulsetrack::storage::config::{self, AppConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type DemoTelemetry = Telemetry<SyntheticEcg, SimulatedGps, Receiver<u8>, CsvSink>;

/// Byte sent on the simulated serial line once per GPS fix.
const FIX_BYTE: u8 = b'$';

/// Scheduler resolution.
const TICK: Duration = Duration::from_millis(1);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PulseTrack v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => config::load_config_from(&PathBuf::from(path)),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // First run: leave an editable copy of the defaults behind
    if !config::get_config_path().exists() {
        match config::save_config(&config) {
            Ok(()) => tracing::info!(
                path = %config::get_config_path().display(),
                "Wrote default configuration"
            ),
            Err(e) => tracing::warn!("Could not write default configuration: {}", e),
        }
    }

    let (tx, rx) = crossbeam::channel::unbounded();
    let ecg = SyntheticEcg::new(
        config.sampling.sample_rate_hz as f32,
        config.simulation.heart_rate_bpm,
    );
    let gps = SimulatedGps::new(config.simulation.speed_profile_kmh.clone());
    let sink = CsvSink::new(&config.recording.csv_path);
    let mut telemetry = Telemetry::new(&config, ecg, gps, rx, sink);

    if let Err(e) = telemetry.prepare_sink() {
        tracing::error!("Could not prepare {}: {}", config.recording.csv_path.display(), e);
    }

    let duration = Duration::from_secs(config.simulation.duration_secs);
    if config.simulation.realtime {
        run_realtime(&config, &mut telemetry, tx, duration)?;
    } else {
        run_accelerated(&config, &mut telemetry, tx, duration)?;
    }

    tracing::info!(
        seconds = telemetry.seconds(),
        minutes_saved = telemetry.minutes_saved(),
        total_km = telemetry.aggregator().total_distance_m() / 1000.0,
        "Run complete"
    );

    Ok(())
}

/// Follow the wall clock, with a feeder thread standing in for the GPS
/// module's serial output.
fn run_realtime(
    config: &AppConfig,
    telemetry: &mut DemoTelemetry,
    tx: Sender<u8>,
    duration: Duration,
) -> anyhow::Result<()> {
    let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(0);
    let feeder = std::thread::spawn(move || {
        let ticker = crossbeam::channel::tick(Duration::from_secs(1));
        loop {
            crossbeam::select! {
                recv(ticker) -> _ => {
                    if tx.send(FIX_BYTE).is_err() {
                        break;
                    }
                }
                recv(stop_rx) -> _ => break,
            }
        }
    });

    let mut scheduler = Scheduler::from_config(MonotonicClock::new(), config);
    while scheduler.now() < duration {
        scheduler.run_pass(telemetry);
        std::thread::sleep(TICK);
    }

    drop(stop_tx);
    feeder
        .join()
        .map_err(|_| anyhow::anyhow!("GPS feeder thread panicked"))?;

    Ok(())
}

/// Run on a manual clock, one fix per simulated second, half a second
/// ahead of each second boundary.
fn run_accelerated(
    config: &AppConfig,
    telemetry: &mut DemoTelemetry,
    tx: Sender<u8>,
    duration: Duration,
) -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::from_config(clock.clone(), config);
    let mut next_fix = Duration::from_millis(500);

    while clock.now() < duration {
        if clock.now() >= next_fix {
            tx.send(FIX_BYTE).context("GPS line closed")?;
            next_fix += Duration::from_secs(1);
        }
        scheduler.run_pass(telemetry);
        clock.advance(TICK);
    }

    Ok(())
}
