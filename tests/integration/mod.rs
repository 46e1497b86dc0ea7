//! Integration test modules.

mod pipeline_test;
mod recording_test;
