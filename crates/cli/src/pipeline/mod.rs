//! Capture pipeline: source + session + sinks.

mod orchestrator;
mod stats;

pub use orchestrator::{Recorder, RecorderConfig, Source};
pub use stats::print_report;
