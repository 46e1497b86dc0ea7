//! CSV persistence of minute summaries.
//!
//! The file is append-only: the header is written once when the file is
//! missing or empty, and each minute appends one row.

use crate::metrics::zones::{HrZone, VelocityZone};
use crate::recording::types::{MinuteSummary, RecorderError};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only destination for minute summaries.
pub trait SummarySink {
    /// Write the header if the sink does not have one yet. Calling this
    /// again must not duplicate it.
    fn ensure_header(&mut self) -> Result<(), RecorderError>;

    /// Append one summary record.
    fn append(&mut self, summary: &MinuteSummary) -> Result<(), RecorderError>;
}

/// Column names, in record order.
pub fn csv_header() -> String {
    let mut columns: Vec<String> = [
        "Timestamp",
        "Dist_m",
        "Dist_Total_km",
        "Vel_Prom_kmh",
        "Vel_Max_kmh",
        "BPM_Prom",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    columns.extend(VelocityZone::ALL.iter().map(|z| format!("Seg_{}", z.label())));
    columns.extend(VelocityZone::ALL.iter().map(|z| format!("Dist_{}_m", z.label())));
    columns.extend(HrZone::ALL.iter().map(|z| format!("Seg_{}", z.label())));
    columns.extend(["TRIMP", "Sprints_Min", "Sprints_Total"].iter().map(|c| c.to_string()));

    columns.join(",")
}

/// Format one summary as a CSV row (without line terminator).
pub fn format_row(summary: &MinuteSummary) -> String {
    let mut fields = vec![
        summary.timestamp.to_string(),
        format!("{:.1}", summary.distance_m),
        format!("{:.3}", summary.total_distance_km),
        format!("{:.1}", summary.mean_speed_kmh),
        format!("{:.1}", summary.peak_speed_kmh),
        format!("{:.1}", summary.mean_bpm),
    ];

    fields.extend(summary.velocity_zone_secs.iter().map(|s| s.to_string()));
    // Whole metres, truncated
    fields.extend(
        summary
            .velocity_zone_distance_m
            .iter()
            .map(|d| (d.max(0.0) as u32).to_string()),
    );
    fields.extend(summary.hr_zone_secs.iter().map(|s| s.to_string()));
    fields.push(format!("{:.2}", summary.trimp));
    fields.push(summary.sprints_minute.to_string());
    fields.push(summary.sprints_total.to_string());

    fields.join(",")
}

/// CSV file sink.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn first_line(&self) -> Result<Option<String>, RecorderError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(&self.path)?;
        let mut line = String::new();
        BufReader::new(file).read_line(&mut line)?;
        let line = line.trim_end().to_string();
        Ok((!line.is_empty()).then_some(line))
    }

    fn append_line(&self, line: &str) -> Result<(), RecorderError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }
}

impl SummarySink for CsvSink {
    fn ensure_header(&mut self) -> Result<(), RecorderError> {
        let header = csv_header();
        match self.first_line()? {
            None => {
                self.append_line(&header)?;
                tracing::info!(path = %self.path.display(), "Created CSV file with header");
                Ok(())
            }
            Some(found) if found == header => Ok(()),
            Some(found) => Err(RecorderError::HeaderMismatch {
                path: self.path.display().to_string(),
                found,
            }),
        }
    }

    fn append(&mut self, summary: &MinuteSummary) -> Result<(), RecorderError> {
        self.append_line(&format_row(summary))
    }
}

/// In-memory sink, one entry per CSV line.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
    pub records: Vec<MinuteSummary>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SummarySink for MemorySink {
    fn ensure_header(&mut self) -> Result<(), RecorderError> {
        let header = csv_header();
        if self.lines.first() != Some(&header) {
            self.lines.insert(0, header);
        }
        Ok(())
    }

    fn append(&mut self, summary: &MinuteSummary) -> Result<(), RecorderError> {
        self.lines.push(format_row(summary));
        self.records.push(summary.clone());
        Ok(())
    }
}

impl<S: SummarySink + ?Sized> SummarySink for Box<S> {
    fn ensure_header(&mut self) -> Result<(), RecorderError> {
        (**self).ensure_header()
    }

    fn append(&mut self, summary: &MinuteSummary) -> Result<(), RecorderError> {
        (**self).append(summary)
    }
}
