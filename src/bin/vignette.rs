use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use circular_vignette::settings::{self, Settings};
use circular_vignette::timing::{CsvTimingLog, Instrumentation, LogInstrumentation};
use circular_vignette::{
    run_batch, BatchControl, BatchReport, BatchStatus, Error, ImageOutcome, OutcomeStatus,
    VignetteEngine,
};

/// Exit code for a missing input directory or unusable settings.
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "vignette",
    about = "Apply a circular vignette with radial falloff to every image in a folder",
    version,
    after_help = "Results are written to <INPUT_DIR>/processed (or processed_debug with --debug).\n\
                  Unset options fall back to the saved settings file, then to built-in defaults."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Directory containing the images to process
    input: PathBuf,

    /// Falloff strength (0.1-10.0); higher values give a sharper edge
    #[arg(short, long)]
    strength: Option<f64>,

    /// Clear radius is the image diagonal divided by this value
    #[arg(short, long)]
    radius_divisor: Option<f64>,

    /// Background color as #RRGGBB
    #[arg(short, long)]
    color: Option<String>,

    /// Process every Nth eligible file
    #[arg(long)]
    step: Option<usize>,

    /// Draw the diagnostic overlay on a green background
    #[arg(short, long)]
    debug: bool,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist the effective settings before processing
    #[arg(long)]
    save_settings: bool,

    /// Append per-stage timings to this CSV file
    #[arg(long)]
    timing_log: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(strength) = self.strength {
            settings.vignette_strength = strength;
        }
        if let Some(divisor) = self.radius_divisor {
            settings.diagonal_radius_divisor = divisor;
        }
        if let Some(color) = &self.color {
            settings.vignette_color.clone_from(color);
        }
        if let Some(step) = self.step {
            settings.step_interval = step;
        }
        if self.debug {
            settings.debug_mode = true;
        }
        settings
    }
}

fn init_logger(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {style}{}{style:#}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn load_settings(cli: &Cli) -> Settings {
    let loaded = match &cli.config {
        Some(path) if path.exists() => settings::load_from_path(path),
        Some(_) => Ok(Settings::default()),
        None => settings::load(),
    };
    loaded.unwrap_or_else(|e| {
        log::warn!("could not read settings, using defaults: {e}");
        Settings::default()
    })
}

fn save_settings(cli: &Cli, settings: &Settings) {
    let saved = match &cli.config {
        Some(path) => settings::save_to_path(settings, path),
        None => settings::save(settings),
    };
    if let Err(e) = saved {
        log::warn!("could not save settings: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(&cli);

    let settings = cli.apply_overrides(load_settings(&cli));
    let params = match settings.to_parameters() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(EXIT_USAGE);
        }
    };
    if cli.save_settings {
        save_settings(&cli, &settings);
    }

    let instrumentation: Box<dyn Instrumentation> = match &cli.timing_log {
        Some(path) => match CsvTimingLog::create(path) {
            Ok(log) => Box::new(log),
            Err(e) => {
                log::warn!("timing log disabled: {e}");
                Box::new(LogInstrumentation)
            }
        },
        None => Box::new(LogInstrumentation),
    };

    if !cli.quiet {
        eprintln!(
            "Strength {:.2}, radius = diagonal / {:.2}, background {}{}",
            params.falloff_strength(),
            params.clear_radius_divisor(),
            settings::format_hex_color(params.background_color()),
            if params.debug_mode() { " (debug overlay)" } else { "" }
        );
    }

    let engine = VignetteEngine::new(params);
    if params.debug_mode() && !engine.has_font() {
        log::info!("no system font found, overlay text uses the built-in face");
    }

    let control = Arc::new(BatchControl::new());
    if let Err(e) = ctrlc::set_handler(interrupt_handler(Arc::clone(&control))) {
        log::warn!("Ctrl-C will not stop the batch early: {e}");
    }
    let report = match run_batch(
        &engine,
        &cli.input,
        settings.step(),
        control.as_ref(),
        instrumentation.as_ref(),
    ) {
        Ok(r) => r,
        Err(Error::PathNotFound(path)) => {
            eprintln!("Error: Incorrect path name: {}", path.display());
            eprintln!("Check the input directory and try again.");
            process::exit(EXIT_USAGE);
        }
        Err(e) => {
            eprintln!("Fatal: {e}");
            process::exit(1);
        }
    };

    for outcome in &report.outcomes {
        print_outcome(outcome, cli.quiet);
    }
    print_summary(&report, &cli.input, cli.quiet);

    if report.failed > 0 {
        process::exit(1);
    }
}

/// Handler for Ctrl-C: finish the current image, skip the rest.
fn interrupt_handler(control: Arc<BatchControl>) -> impl FnMut() + Send + 'static {
    move || {
        log::info!("Ctrl-C received, stopping after the current image...");
        control.request_stop();
    }
}

fn print_outcome(outcome: &ImageOutcome, quiet: bool) {
    let filename = outcome.path.file_name().map_or_else(
        || outcome.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    match &outcome.status {
        OutcomeStatus::Succeeded if !quiet => eprintln!("[OK] {filename}"),
        OutcomeStatus::Skipped if !quiet => eprintln!("[SKIP] {filename}: batch stopped"),
        OutcomeStatus::Failed(reason) => eprintln!("[FAIL] {filename}: {reason}"),
        _ => {}
    }
}

fn print_summary(report: &BatchReport, input: &Path, quiet: bool) {
    if quiet && report.failed == 0 {
        return;
    }
    eprintln!();
    match report.status {
        BatchStatus::NoEligibleFiles => {
            eprintln!("[Summary] No eligible images in {}", input.display());
        }
        _ => {
            eprintln!("[Summary] {}", report.summary());
            if let Some(dir) = &report.output_dir {
                eprintln!("Output: {}", dir.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_requests_a_cooperative_stop() {
        let control = Arc::new(BatchControl::new());
        let mut handler = interrupt_handler(Arc::clone(&control));
        assert!(!control.is_stop_requested());
        handler();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn overrides_replace_only_given_options() {
        let cli = Cli::parse_from(["vignette", "photos", "--strength", "7", "--step", "3"]);
        let settings = cli.apply_overrides(Settings::default());
        assert!((settings.vignette_strength - 7.0).abs() < f64::EPSILON);
        assert_eq!(settings.step_interval, 3);
        assert_eq!(settings.vignette_color, Settings::default().vignette_color);
        assert!(!settings.debug_mode);
    }
}
