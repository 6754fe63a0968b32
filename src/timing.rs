//! Scoped timing and the telemetry sink it reports to
//!
//! Components never reach for a global logger to report durations. The caller
//! starts a [`Stopwatch`], stops it around the traced operation, and hands the
//! duration to whichever [`Telemetry`] it was given.

use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// Sink for operation timings
pub trait Telemetry: Send + Sync {
    /// Record that `operation` on `subject` took `elapsed`
    fn record(&self, operation: &str, subject: &str, elapsed: Duration);
}

/// Reports timings through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, operation: &str, subject: &str, elapsed: Duration) {
        info!(
            operation,
            subject,
            elapsed_ms = elapsed.as_millis() as u64,
            "{} ({}) {:.2} secs",
            operation,
            subject,
            elapsed.as_secs_f64()
        );
    }
}

/// Discards every timing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record(&self, _operation: &str, _subject: &str, _elapsed: Duration) {}
}

/// One recorded timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingEntry {
    pub operation: String,
    pub subject: String,
    pub elapsed_ms: u64,
}

/// Keeps every timing in memory
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    entries: Mutex<Vec<TimingEntry>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded timings, in recording order
    pub fn entries(&self) -> Vec<TimingEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Recorded timings of one operation
    pub fn for_operation(&self, operation: &str) -> Vec<TimingEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.operation == operation)
            .collect()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, operation: &str, subject: &str, elapsed: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(TimingEntry {
                operation: operation.to_string(),
                subject: subject.to_string(),
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }
    }
}

/// Explicit start/stop timer
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time elapsed so far
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop timing and return the elapsed duration
    pub fn stop(self) -> Duration {
        self.started.elapsed()
    }

    /// Stop timing and report the duration to `telemetry`
    pub fn stop_and_record(self, telemetry: &dyn Telemetry, operation: &str, subject: &str) -> Duration {
        let elapsed = self.stop();
        telemetry.record(operation, subject, elapsed);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_telemetry_keeps_order() {
        let telemetry = RecordingTelemetry::new();
        telemetry.record("expand", "Derecho", Duration::from_millis(1500));
        telemetry.record("filter", "Derecho", Duration::from_millis(3));

        let entries = telemetry.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, "expand");
        assert_eq!(entries[0].elapsed_ms, 1500);
        assert_eq!(telemetry.for_operation("filter").len(), 1);
    }

    #[test]
    fn test_stopwatch_records_into_sink() {
        let telemetry = RecordingTelemetry::new();
        let watch = Stopwatch::start();
        let elapsed = watch.stop_and_record(&telemetry, "pages", "Brocardos");

        let entries = telemetry.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "Brocardos");
        assert_eq!(entries[0].elapsed_ms, elapsed.as_millis() as u64);
    }
}
