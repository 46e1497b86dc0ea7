//! The telemetry pipeline and the cooperative scheduler that drives it.
//!
//! `Telemetry` owns every processing stage, the sensors and the summary
//! sink. `Scheduler` decides which of its jobs are due and runs them in a
//! single non-blocking pass:
//!
//! - sample (every 1/30 s): read the ADC, filter, detect beats
//! - serial (every pass): feed pending GPS bytes to the decoder
//! - second (every 1 s): speed, zones, sprints, distance, TRIMP, and the
//!   minute boundary
//! - report (every 1 s): status on the diagnostic log

use crate::metrics::beat::{BeatDetector, BeatEvent};
use crate::metrics::filter::EcgFilter;
use crate::metrics::smoothing::SpeedSmoother;
use crate::metrics::zones::{HrZone, VelocityZone};
use crate::recording::aggregator::{MinuteAggregator, SecondSnapshot};
use crate::recording::exporter_csv::SummarySink;
use crate::recording::types::{MinuteSummary, RecorderError, SummaryTimestamp};
use crate::scheduler::clock::Clock;
use crate::scheduler::task::PeriodicTask;
use crate::sensors::types::{ByteSource, GpsReceiver, GpsStatus, SignalSource};
use crate::storage::config::AppConfig;
use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);

/// Convert a GPS UTC time to local time.
pub fn to_local(utc: NaiveDateTime, offset: FixedOffset) -> NaiveDateTime {
    offset.from_utc_datetime(&utc).naive_local()
}

/// All processing state, owned in one place.
pub struct Telemetry<S, G, B, K> {
    ecg: S,
    gps: G,
    serial: B,
    sink: K,
    filter: EcgFilter,
    detector: BeatDetector,
    smoother: SpeedSmoother,
    aggregator: MinuteAggregator,
    adc_full_scale: u16,
    last_raw: u16,
    utc_offset: FixedOffset,
    minute_secs: u32,
    seconds: u64,
    speed_kmh: Option<f32>,
    minutes_saved: u32,
}

impl<S, G, B, K> Telemetry<S, G, B, K>
where
    S: SignalSource,
    G: GpsReceiver,
    B: ByteSource,
    K: SummarySink,
{
    pub fn new(config: &AppConfig, ecg: S, gps: G, serial: B, sink: K) -> Self {
        let hours = config.recording.utc_offset_hours;
        let utc_offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| {
            tracing::warn!(hours, "UTC offset out of range, using UTC");
            Utc.fix()
        });

        Self {
            ecg,
            gps,
            serial,
            sink,
            filter: EcgFilter::default(),
            detector: BeatDetector::new(config.heart_rate.detector),
            smoother: SpeedSmoother::new(config.velocity.smoothing),
            aggregator: MinuteAggregator::new(
                config.heart_rate.zones.clone(),
                config.velocity.zones.clone(),
                config.velocity.sprint,
            ),
            adc_full_scale: config.sampling.adc_full_scale,
            last_raw: config.sampling.adc_full_scale / 2,
            utc_offset,
            minute_secs: config.recording.minute_secs.max(1),
            seconds: 0,
            speed_kmh: None,
            minutes_saved: 0,
        }
    }

    /// Make sure the sink has its header. The check is repeated before
    /// every minute is written.
    pub fn prepare_sink(&mut self) -> Result<(), RecorderError> {
        self.sink.ensure_header()
    }

    /// Read and process one ECG sample taken at `now_ms`.
    pub fn sample_tick(&mut self, now_ms: u64) -> Option<BeatEvent> {
        let mut raw = self.ecg.read();
        if raw >= self.adc_full_scale {
            // Saturated conversion, hold the last good count
            raw = self.last_raw;
        } else {
            self.last_raw = raw;
        }

        let filtered = self.filter.process(f32::from(raw));
        let event = self.detector.process(filtered, now_ms);
        if let Some(beat) = event.filter(|beat| beat.valid) {
            tracing::info!(rr_ms = beat.rr_ms, "{:.0} bpm", self.detector.bpm());
        }
        event
    }

    /// Feed every pending serial byte to the GPS decoder.
    pub fn drain_gps(&mut self) -> usize {
        let mut count = 0;
        while let Some(byte) = self.serial.read_byte() {
            self.gps.encode(byte);
            count += 1;
        }
        count
    }

    /// Account for one second. Returns the minute summary when this second
    /// closes a minute.
    pub fn second_tick(&mut self, now: Duration) -> (SecondSnapshot, Option<MinuteSummary>) {
        self.seconds += 1;

        // No fix: the second counts as standing still and the window is left alone
        let speed_kmh = match self.gps.speed_kmh() {
            Some(raw) => {
                let smoothed = self.smoother.smooth(raw);
                self.speed_kmh = Some(smoothed);
                smoothed
            }
            None => {
                self.speed_kmh = None;
                0.0
            }
        };

        let snapshot = self.aggregator.record_second(speed_kmh, self.detector.bpm());

        let summary = (self.seconds % u64::from(self.minute_secs) == 0)
            .then(|| self.close_minute(now));

        (snapshot, summary)
    }

    /// Log the per-second status report.
    pub fn report_tick(&self) -> GpsStatus {
        let status = GpsStatus::read(&self.gps);

        let bpm = self.detector.bpm();
        if bpm > 0.0 {
            tracing::info!("Heart rate: {:.0} bpm", bpm);
        } else {
            tracing::info!("Heart rate: ... bpm");
        }

        match status.location {
            Some(p) => tracing::info!("Position: {:.6}, {:.6}", p.lat, p.lon),
            None => tracing::info!("Searching for GPS fix..."),
        }

        if let Some(utc) = status.date_time {
            tracing::info!(
                "UTC: {}  Local: {}",
                utc.format("%Y-%m-%d %H:%M:%S"),
                to_local(utc, self.utc_offset).format("%Y-%m-%d %H:%M:%S")
            );
        }

        let satellites = status
            .satellites
            .map_or_else(|| "N/D".to_string(), |n| n.to_string());
        let hdop = status
            .hdop
            .map_or_else(|| "N/D".to_string(), |h| format!("{:.1}", h));
        tracing::info!("Satellites: {}  HDOP: {}", satellites, hdop);

        if let Some(alt) = status.altitude_m {
            tracing::info!("Altitude: {:.1} m", alt);
        }

        match self.speed_kmh {
            Some(kmh) => tracing::info!("Speed: {:.1} km/h", kmh),
            None => tracing::info!("Speed: N/D"),
        }

        status
    }

    /// Timestamp for a summary: local GPS time when valid, uptime otherwise.
    pub fn timestamp(&self, now: Duration) -> SummaryTimestamp {
        match self.gps.date_time() {
            Some(utc) => SummaryTimestamp::Local(to_local(utc, self.utc_offset)),
            None => SummaryTimestamp::Uptime(now.as_secs()),
        }
    }

    fn close_minute(&mut self, now: Duration) -> MinuteSummary {
        let summary = self.aggregator.finish_minute(self.timestamp(now));
        log_summary(&summary);

        match self.persist(&summary) {
            Ok(()) => {
                self.minutes_saved += 1;
                tracing::info!("Minute summary saved");
            }
            Err(e) => tracing::error!("Failed to save minute summary: {}", e),
        }

        summary
    }

    fn persist(&mut self, summary: &MinuteSummary) -> Result<(), RecorderError> {
        self.sink.ensure_header()?;
        self.sink.append(summary)
    }

    pub fn bpm(&self) -> f32 {
        self.detector.bpm()
    }

    /// Last smoothed speed, `None` while the GPS has no valid speed.
    pub fn speed_kmh(&self) -> Option<f32> {
        self.speed_kmh
    }

    /// Last ADC count fed to the filter.
    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    /// Seconds accounted so far.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Minutes successfully written to the sink.
    pub fn minutes_saved(&self) -> u32 {
        self.minutes_saved
    }

    pub fn aggregator(&self) -> &MinuteAggregator {
        &self.aggregator
    }

    pub fn detector(&self) -> &BeatDetector {
        &self.detector
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn gps(&self) -> &G {
        &self.gps
    }
}

fn log_summary(summary: &MinuteSummary) {
    tracing::info!("===== Minute summary {} =====", summary.timestamp);
    tracing::info!(
        "Distance: {:.1} m (total {:.3} km)",
        summary.distance_m,
        summary.total_distance_km
    );
    tracing::info!(
        "Speed: mean {:.1} km/h, peak {:.1} km/h",
        summary.mean_speed_kmh,
        summary.peak_speed_kmh
    );
    tracing::info!("Mean heart rate: {:.1} bpm", summary.mean_bpm);
    for zone in VelocityZone::ALL {
        tracing::info!(
            "  {} ({}): {} s, {:.0} m",
            zone,
            zone.label(),
            summary.seconds_in(zone),
            summary.velocity_zone_distance_m[zone.index()]
        );
    }
    let hr_zones: Vec<String> = HrZone::ALL
        .iter()
        .map(|&z| format!("{}={}s", z, summary.seconds_in_hr(z)))
        .collect();
    tracing::info!("HR zones: {}", hr_zones.join(" "));
    tracing::info!("TRIMP: {:.2}", summary.trimp);
    tracing::info!(
        "Sprints: {} this minute, {} total",
        summary.sprints_minute,
        summary.sprints_total
    );
}

/// What ran during one scheduler pass.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// An ECG sample was processed
    pub sampled: bool,
    pub beat: Option<BeatEvent>,
    /// Serial bytes fed to the GPS decoder
    pub gps_bytes: usize,
    pub second: Option<SecondSnapshot>,
    pub summary: Option<MinuteSummary>,
    pub reported: bool,
}

/// Cooperative scheduler for the telemetry jobs.
pub struct Scheduler<C: Clock> {
    clock: C,
    sample: PeriodicTask,
    second: PeriodicTask,
    report: PeriodicTask,
}

impl<C: Clock> Scheduler<C> {
    /// Create a scheduler sampling every `sample_period`.
    pub fn new(clock: C, sample_period: Duration) -> Self {
        Self {
            clock,
            sample: PeriodicTask::new(sample_period, Duration::ZERO),
            second: PeriodicTask::new(SECOND, SECOND),
            report: PeriodicTask::new(SECOND, SECOND),
        }
    }

    /// Scheduler configured from the sampling settings.
    pub fn from_config(clock: C, config: &AppConfig) -> Self {
        Self::new(clock, config.sampling.period())
    }

    /// Run every job that is due, once. Never blocks.
    pub fn run_pass<S, G, B, K>(&mut self, telemetry: &mut Telemetry<S, G, B, K>) -> PassOutcome
    where
        S: SignalSource,
        G: GpsReceiver,
        B: ByteSource,
        K: SummarySink,
    {
        let now = self.clock.now();
        let mut outcome = PassOutcome::default();

        // Sampling goes first so a second boundary sees this pass's beat
        if self.sample.poll(now) {
            outcome.sampled = true;
            outcome.beat = telemetry.sample_tick(now.as_millis() as u64);
        }

        outcome.gps_bytes = telemetry.drain_gps();

        if self.second.poll(now) {
            let (snapshot, summary) = telemetry.second_tick(now);
            outcome.second = Some(snapshot);
            outcome.summary = summary;
        }

        if self.report.poll(now) {
            telemetry.report_tick();
            outcome.reported = true;
        }

        outcome
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }
}
