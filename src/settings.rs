//! Persisted user settings.
//!
//! Settings live in `settings.json` under the platform config directory and
//! are read once at batch start. Missing keys take their defaults, and an
//! unreadable file falls back to defaults entirely.
//!
//! ```no_run
//! use circular_vignette::settings::{self, Settings};
//!
//! let mut settings = settings::load().unwrap_or_default();
//! settings.vignette_strength = 4.0;
//! settings::save(&settings).expect("failed to save settings");
//! let params = settings.to_parameters().expect("invalid settings");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::{VignetteParameters, DEFAULT_RADIUS_DIVISOR, DEFAULT_STRENGTH};

const SETTINGS_FILE: &str = "settings.json";
const APP_NAME: &str = "circular-vignette";

/// User-facing configuration, stored as JSON key/value pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Falloff exponent, clamped to `[0.1, 10.0]` when used.
    pub vignette_strength: f64,
    /// Clear radius is `diagonal / diagonal_radius_divisor`.
    pub diagonal_radius_divisor: f64,
    /// Background color as `#RRGGBB`.
    pub vignette_color: String,
    /// Process every Nth eligible file.
    pub step_interval: usize,
    /// Draw the diagnostic overlay on a green background.
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vignette_strength: DEFAULT_STRENGTH,
            diagonal_radius_divisor: DEFAULT_RADIUS_DIVISOR,
            vignette_color: "#000000".to_string(),
            step_interval: 1,
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Convert into the immutable parameters for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for a malformed color or
    /// [`Error::InvalidParameter`] for a non-positive divisor.
    pub fn to_parameters(&self) -> Result<VignetteParameters> {
        VignetteParameters::new(
            self.diagonal_radius_divisor,
            self.vignette_strength,
            parse_hex_color(&self.vignette_color)?,
            self.debug_mode,
        )
    }

    /// Step interval, at least 1.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step_interval.max(1)
    }
}

/// Default settings file location, if the platform has a config directory.
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(SETTINGS_FILE);
        path
    })
}

/// Load settings from the default location, or defaults if absent.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists but cannot be read.
pub fn load() -> Result<Settings> {
    match default_settings_path() {
        Some(path) if path.exists() => load_from_path(&path),
        _ => Ok(Settings::default()),
    }
}

/// Save settings to the default location.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn save(settings: &Settings) -> Result<()> {
    match default_settings_path() {
        Some(path) => save_to_path(settings, &path),
        None => Ok(()),
    }
}

/// Load settings from `path`. Invalid JSON yields defaults.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("ignoring invalid settings in {}: {e}", path.display());
        Settings::default()
    }))
}

/// Save settings to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be written.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, content)?;
    Ok(())
}

/// Parse `#RRGGBB`, `RRGGBB`, or `#RGB` into an RGB color.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if the string is not one of those forms.
pub fn parse_hex_color(input: &str) -> Result<Rgb<u8>> {
    let invalid = || Error::InvalidColor(input.to_string());
    let hex = input.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        3 => {
            let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
            Ok(Rgb([short(0)?, short(1)?, short(2)?]))
        }
        _ => Err(invalid()),
    }
}

/// Format a color as `#rrggbb`.
#[must_use]
pub fn format_hex_color(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
