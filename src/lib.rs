//! Batch-apply a parametric circular vignette to images.
//!
//! Pixels outside a clear zone, whose radius is a fraction of the image
//! diagonal, are blended toward a solid background color along a power-curve
//! falloff. An optional debug overlay visualizes the mask geometry.
//!
//! # Quick Start
//!
//! ```no_run
//! use circular_vignette::{VignetteEngine, VignetteParameters};
//! use image::Rgb;
//!
//! let params = VignetteParameters::new(4.0, 2.5, Rgb([0, 0, 0]), false).unwrap();
//! let engine = VignetteEngine::new(params);
//! let img = image::open("photo.jpg").unwrap().to_rgb8();
//! let out = engine.apply(&img).unwrap();
//! out.save("vignetted.jpg").unwrap();
//! ```
//!
//! # Batches
//!
//! ```no_run
//! use circular_vignette::{run_batch, BatchControl, VignetteEngine, VignetteParameters};
//! use circular_vignette::timing::LogInstrumentation;
//!
//! let engine = VignetteEngine::new(VignetteParameters::default());
//! let control = BatchControl::new();
//! let report = run_batch(&engine, "photos".as_ref(), 1, &control, &LogInstrumentation).unwrap();
//! println!("{}", report.summary());
//! ```
//!
//! The building blocks are public too: [`mask::generate_mask`] builds the
//! opacity mask and [`composite::composite`] blends through it.

#![deny(missing_docs)]

pub mod batch;
pub mod codec;
pub mod composite;
mod engine;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod overlay;
pub mod params;
pub mod settings;
pub mod timing;

pub use batch::{
    list_eligible_files, run_batch, BatchControl, BatchReport, BatchStatus, ImageOutcome,
    OutcomeStatus,
};
pub use codec::{is_supported_image, save_image};
pub use engine::VignetteEngine;
pub use error::{Error, Result};
pub use params::VignetteParameters;
