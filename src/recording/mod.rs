//! Recording module for minute aggregation and CSV persistence.

pub mod aggregator;
pub mod exporter_csv;
pub mod types;

pub use aggregator::{MinuteAggregator, SecondSnapshot};
pub use exporter_csv::{csv_header, format_row, CsvSink, MemorySink, SummarySink};
pub use types::{MinuteSummary, RecorderError, SummaryTimestamp};
