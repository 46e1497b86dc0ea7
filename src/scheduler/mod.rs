//! Cooperative scheduling of the telemetry jobs.

pub mod clock;
pub mod pipeline;
pub mod task;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use pipeline::{to_local, PassOutcome, Scheduler, Telemetry};
pub use task::PeriodicTask;
