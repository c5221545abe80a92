//! Timing instrumentation hook.
//!
//! The batch driver wraps each pipeline stage in [`time_operation`], which
//! hands a [`TimingEvent`] to an [`Instrumentation`] sink. The image
//! algorithms themselves never log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::error::Result;

/// Stage names recorded by the batch driver.
pub mod op {
    /// Reading and decoding the input file.
    pub const DECODE: &str = "decode";
    /// Building the vignette mask.
    pub const GENERATE_MASK: &str = "generate_mask";
    /// Blending the image over the background.
    pub const COMPOSITE: &str = "composite";
    /// Drawing the debug overlay.
    pub const RENDER_OVERLAY: &str = "render_overlay";
    /// Encoding and writing the output file.
    pub const ENCODE: &str = "encode";
    /// The whole per-image pipeline.
    pub const PROCESS_IMAGE: &str = "process_image";
}

/// A single timed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEvent {
    /// Stage name, one of the [`op`] constants.
    pub operation: &'static str,
    /// Wall-clock duration of the stage.
    pub duration: Duration,
    /// When the stage started.
    pub timestamp: DateTime<Local>,
}

/// Receiver for timing events.
pub trait Instrumentation {
    /// Record one completed operation.
    fn record(&self, event: TimingEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstrumentation;

impl Instrumentation for NoopInstrumentation {
    fn record(&self, _event: TimingEvent) {}
}

/// Emits each event at `debug` level through `log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInstrumentation;

impl Instrumentation for LogInstrumentation {
    fn record(&self, event: TimingEvent) {
        log::debug!(
            "{} took {:.3} ms",
            event.operation,
            event.duration.as_secs_f64() * 1000.0
        );
    }
}

/// Appends events to a CSV file: `timestamp,operation,duration_ms`.
///
/// Write failures are logged and dropped so a full disk never aborts a batch.
#[derive(Debug)]
pub struct CsvTimingLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvTimingLog {
    /// CSV header line.
    pub const HEADER: &'static str = "timestamp,operation,duration_ms";

    /// Open `path` for appending, writing the header if the file is new or
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be opened.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{}", Self::HEADER)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Path of the CSV file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Instrumentation for CsvTimingLog {
    fn record(&self, event: TimingEvent) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(e) = writeln!(
            file,
            "{},{},{:.3}",
            event.timestamp.to_rfc3339(),
            event.operation,
            event.duration.as_secs_f64() * 1000.0
        ) {
            log::warn!("failed to write timing log {}: {e}", self.path.display());
        }
    }
}

/// Run `f`, recording its duration under `operation`.
pub fn time_operation<T>(
    instrumentation: &dyn Instrumentation,
    operation: &'static str,
    f: impl FnOnce() -> T,
) -> T {
    let timestamp = Local::now();
    let start = Instant::now();
    let out = f();
    instrumentation.record(TimingEvent {
        operation,
        duration: start.elapsed(),
        timestamp,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<&'static str>>);

    impl Instrumentation for Recorder {
        fn record(&self, event: TimingEvent) {
            self.0.borrow_mut().push(event.operation);
        }
    }

    #[test]
    fn time_operation_returns_value_and_records() {
        let rec = Recorder::default();
        let v = time_operation(&rec, op::COMPOSITE, || 41 + 1);
        assert_eq!(v, 42);
        assert_eq!(*rec.0.borrow(), vec![op::COMPOSITE]);
    }

    #[test]
    fn csv_log_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("timing.csv");

        let log = CsvTimingLog::create(&path).unwrap();
        time_operation(&log, op::DECODE, || ());
        drop(log);

        let log = CsvTimingLog::create(&path).unwrap();
        time_operation(&log, op::ENCODE, || ());
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CsvTimingLog::HEADER);
        assert!(lines[1].contains(",decode,"));
        assert!(lines[2].contains(",encode,"));
        assert_eq!(content.matches(CsvTimingLog::HEADER).count(), 1);
    }
}
