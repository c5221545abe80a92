//! Sequential batch driver.
//!
//! Files are processed one at a time in sorted order. A failing image is
//! logged and counted but never aborts the batch; a stop request is honored
//! between images, so an in-flight image always completes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::codec::{is_supported_image, output_dir_for};
use crate::engine::VignetteEngine;
use crate::error::{Error, Result};
use crate::timing::{op, time_operation, Instrumentation};

/// Cooperative stop flag and progress counters shared with a control thread.
#[derive(Debug, Default)]
pub struct BatchControl {
    stop: AtomicBool,
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl BatchControl {
    /// A fresh handle with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver to stop before the next image.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// `(completed, total)` images of the current batch.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (
            self.completed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    fn begin(&self, total: usize) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// What happened to one selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Written to the output directory.
    Succeeded,
    /// Decoding or encoding failed; the reason is the error message.
    Failed(String),
    /// Not processed because the batch was stopped first.
    Skipped,
}

/// Result for a single input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    /// Input file path.
    pub path: PathBuf,
    /// Outcome of processing it.
    pub status: OutcomeStatus,
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every selected file was attempted.
    Completed,
    /// A stop request ended the batch early.
    Stopped,
    /// The directory held no eligible image files.
    NoEligibleFiles,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// How the batch ended.
    pub status: BatchStatus,
    /// Images written successfully.
    pub processed: usize,
    /// Images that failed to decode or encode.
    pub failed: usize,
    /// Images left untouched after a stop request.
    pub skipped: usize,
    /// Wall-clock time of the whole batch.
    pub elapsed: Duration,
    /// Where outputs were written, if any file was eligible.
    pub output_dir: Option<PathBuf>,
    /// Per-file outcomes in processing order.
    pub outcomes: Vec<ImageOutcome>,
}

impl BatchReport {
    fn empty(status: BatchStatus) -> Self {
        Self {
            status,
            processed: 0,
            failed: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
            output_dir: None,
            outcomes: Vec::new(),
        }
    }

    /// End-of-batch message for the completion notification.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.status {
            BatchStatus::Completed => format!(
                "Completed: {} processed, {} failed in {:.1}s",
                self.processed,
                self.failed,
                self.elapsed.as_secs_f64()
            ),
            BatchStatus::Stopped => format!(
                "Stopped by user: {} processed, {} failed, {} not started",
                self.processed, self.failed, self.skipped
            ),
            BatchStatus::NoEligibleFiles => "No eligible images found".to_string(),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Supported image files in `dir`, sorted by name, keeping every `step`-th.
///
/// A `step` of zero is treated as one.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] if `dir` is not an existing directory, or
/// [`Error::Io`] if it cannot be listed.
pub fn list_eligible_files(dir: &Path, step: usize) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::PathNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files.into_iter().step_by(step.max(1)).collect())
}

/// Run the vignette over every selected image in `input_dir`.
///
/// Outputs go to `processed/` (or `processed_debug/` in debug mode) under
/// `input_dir`, keeping each file name.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] before touching any file if `input_dir`
/// does not exist, or [`Error::Io`] if the output directory cannot be
/// created. Per-image failures are reported in the [`BatchReport`] instead.
pub fn run_batch(
    engine: &VignetteEngine,
    input_dir: &Path,
    step: usize,
    control: &BatchControl,
    instrumentation: &dyn Instrumentation,
) -> Result<BatchReport> {
    let started = Instant::now();
    let files = list_eligible_files(input_dir, step)?;
    if files.is_empty() {
        log::info!("no eligible images in {}", input_dir.display());
        control.begin(0);
        return Ok(BatchReport::empty(BatchStatus::NoEligibleFiles));
    }

    let output_dir = output_dir_for(input_dir, engine.params().debug_mode());
    fs::create_dir_all(&output_dir)?;
    log::info!(
        "processing {} image(s) from {} into {}",
        files.len(),
        input_dir.display(),
        output_dir.display()
    );

    control.begin(files.len());
    let mut report = BatchReport {
        output_dir: Some(output_dir.clone()),
        ..BatchReport::empty(BatchStatus::Completed)
    };

    for (index, input) in files.iter().enumerate() {
        if control.is_stop_requested() {
            let remaining = &files[index..];
            log::info!("stop requested, leaving {} image(s) untouched", remaining.len());
            report.status = BatchStatus::Stopped;
            report.skipped = remaining.len();
            report.outcomes.extend(remaining.iter().map(|path| ImageOutcome {
                path: path.clone(),
                status: OutcomeStatus::Skipped,
            }));
            break;
        }

        let output = output_dir.join(input.file_name().unwrap_or(input.as_os_str()));
        let result = time_operation(instrumentation, op::PROCESS_IMAGE, || {
            engine.process_file(input, &output, instrumentation)
        });

        let status = match result {
            Ok(()) => {
                log::debug!("wrote {}", output.display());
                report.processed += 1;
                OutcomeStatus::Succeeded
            }
            Err(e) => {
                log::warn!("skipping {}: {e}", input.display());
                report.failed += 1;
                OutcomeStatus::Failed(e.to_string())
            }
        };
        report.outcomes.push(ImageOutcome {
            path: input.clone(),
            status,
        });
        control.advance();
    }

    report.elapsed = started.elapsed();
    log::info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn listing_filters_sorts_and_steps() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["d.bmp", "c.txt", "b.png", "a.jpg"]);

        let all = list_eligible_files(dir.path(), 1).unwrap();
        assert_eq!(names(&all), ["a.jpg", "b.png", "d.bmp"]);

        let every_other = list_eligible_files(dir.path(), 2).unwrap();
        assert_eq!(names(&every_other), ["a.jpg", "d.bmp"]);
    }

    #[test]
    fn zero_step_behaves_like_one() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png", "b.png"]);
        assert_eq!(list_eligible_files(dir.path(), 0).unwrap().len(), 2);
    }

    #[test]
    fn listing_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png"]);
        fs::create_dir(dir.path().join("folder.png")).unwrap();
        assert_eq!(names(&list_eligible_files(dir.path(), 1).unwrap()), ["a.png"]);
    }

    #[test]
    fn missing_directory_is_path_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            list_eligible_files(&missing, 1),
            Err(Error::PathNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn control_tracks_progress_and_stop() {
        let control = BatchControl::new();
        assert!(!control.is_stop_requested());
        control.begin(3);
        control.advance();
        assert_eq!(control.progress(), (1, 3));
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn summaries_distinguish_terminal_states() {
        let mut report = BatchReport::empty(BatchStatus::Completed);
        report.processed = 3;
        report.failed = 1;
        assert!(report.summary().starts_with("Completed: 3 processed, 1 failed"));

        report.status = BatchStatus::Stopped;
        report.skipped = 2;
        assert!(report.summary().starts_with("Stopped by user"));

        let empty = BatchReport::empty(BatchStatus::NoEligibleFiles);
        assert_eq!(empty.to_string(), "No eligible images found");
    }
}
