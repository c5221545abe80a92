//! Error types for the circular-vignette crate.

use std::path::PathBuf;

/// Errors that can occur while generating, compositing, or saving vignettes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file could not be read or decoded.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        /// Path of the offending input file.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// An output file could not be encoded or written.
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        /// Destination path that failed.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },

    /// The input directory does not exist.
    #[error("input path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The image format is not supported for saving.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// A mask does not match the image it is composited with.
    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    DimensionMismatch {
        /// Image width in pixels.
        image_width: u32,
        /// Image height in pixels.
        image_height: u32,
        /// Mask width in pixels.
        mask_width: u32,
        /// Mask height in pixels.
        mask_height: u32,
    },

    /// A color string could not be parsed as a hex RGB triple.
    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    /// A vignette parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The settings file could not be serialized.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
