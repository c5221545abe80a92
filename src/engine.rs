//! Core vignette engine.

use std::path::Path;

use ab_glyph::FontVec;
use image::RgbImage;

use crate::codec;
use crate::composite::composite;
use crate::error::Result;
use crate::mask::generate_mask;
use crate::overlay::{self, OverlayParams};
use crate::params::VignetteParameters;
use crate::timing::{op, time_operation, Instrumentation, NoopInstrumentation};

/// The vignette engine: one parameter set plus the overlay font, if any.
///
/// Create once per batch with [`VignetteEngine::new()`] and reuse it for
/// every image. In debug mode the overlay font is looked up at construction.
pub struct VignetteEngine {
    params: VignetteParameters,
    font: Option<FontVec>,
}

impl VignetteEngine {
    /// Create an engine, loading a system font when debug mode is on.
    #[must_use]
    pub fn new(params: VignetteParameters) -> Self {
        let font = if params.debug_mode() {
            overlay::font::load_overlay_font()
        } else {
            None
        };
        Self::with_font(params, font)
    }

    /// Create an engine with an explicit overlay font (or none).
    #[must_use]
    pub fn with_font(params: VignetteParameters, font: Option<FontVec>) -> Self {
        Self { params, font }
    }

    /// The parameters this engine applies.
    #[must_use]
    pub fn params(&self) -> &VignetteParameters {
        &self.params
    }

    /// Whether overlay labels can be drawn.
    #[must_use]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Apply the vignette (and the overlay in debug mode) to an image.
    ///
    /// # Errors
    ///
    /// Only fails if the internal mask does not match the image, which
    /// indicates a bug.
    pub fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        self.apply_instrumented(image, &NoopInstrumentation)
    }

    /// [`Self::apply`], recording a timing event per stage.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn apply_instrumented(
        &self,
        image: &RgbImage,
        instrumentation: &dyn Instrumentation,
    ) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let params = &self.params;

        let mask = time_operation(instrumentation, op::GENERATE_MASK, || {
            generate_mask(
                width,
                height,
                params.clear_radius(width, height),
                params.falloff_strength(),
            )
        });

        let mut output = time_operation(instrumentation, op::COMPOSITE, || {
            composite(image, &mask, params.effective_background())
        })?;

        if params.debug_mode() {
            let overlay_params = OverlayParams::new(
                width,
                height,
                params.falloff_strength(),
                params.clear_radius_divisor(),
            );
            time_operation(instrumentation, op::RENDER_OVERLAY, || {
                overlay::render_overlay(&mut output, &overlay_params, self.font.as_ref());
            });
        }

        Ok(output)
    }

    /// Process a single image file: decode, apply, encode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the input cannot be
    /// read, or [`Error::Encode`](crate::Error::Encode) /
    /// [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat) if the
    /// output cannot be written.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        instrumentation: &dyn Instrumentation,
    ) -> Result<()> {
        let image = time_operation(instrumentation, op::DECODE, || codec::load_image(input))?;
        let result = self.apply_instrumented(&image, instrumentation)?;
        time_operation(instrumentation, op::ENCODE, || codec::save_image(&result, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::cell::RefCell;

    use crate::timing::TimingEvent;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<&'static str>>);

    impl Instrumentation for Recorder {
        fn record(&self, event: TimingEvent) {
            self.0.borrow_mut().push(event.operation);
        }
    }

    fn params(debug: bool) -> VignetteParameters {
        VignetteParameters::new(4.0, 2.5, Rgb([0, 0, 255]), debug).unwrap()
    }

    #[test]
    fn apply_keeps_center_and_tints_corners() {
        let engine = VignetteEngine::with_font(params(false), None);
        let img = RgbImage::from_pixel(201, 151, Rgb([200, 200, 200]));
        let out = engine.apply(&img).unwrap();

        assert_eq!(out.dimensions(), (201, 151));
        assert_eq!(*out.get_pixel(100, 75), Rgb([200, 200, 200]));
        let corner = out.get_pixel(0, 0);
        assert!(corner[0] < 200);
        assert!(corner[2] > corner[0]);
    }

    #[test]
    fn debug_mode_uses_green_background_and_overlay() {
        let engine = VignetteEngine::with_font(params(true), None);
        let img = RgbImage::from_pixel(801, 601, Rgb([200, 200, 200]));
        let out = engine.apply(&img).unwrap();

        let corner = out.get_pixel(790, 590);
        assert!(corner[1] > corner[0]);
        assert!(corner[1] > corner[2]);

        // Inside the clear zone the image is untouched, so green pixels at
        // the clear radius come from the overlay circle.
        let r = f64::from(params(true).clear_radius(801, 601));
        let on_circle = out
            .enumerate_pixels()
            .filter(|&(x, y, p)| {
                let d = (f64::from(x) - 400.0).hypot(f64::from(y) - 300.0);
                (d - r).abs() <= 1.5 && *p == overlay::CLEAR_COLOR
            })
            .count();
        assert!(on_circle > 500, "only {on_circle} circle pixels");
    }

    #[test]
    fn stages_are_instrumented_in_order() {
        let rec = Recorder::default();
        let engine = VignetteEngine::with_font(params(true), None);
        engine
            .apply_instrumented(&RgbImage::new(40, 30), &rec)
            .unwrap();
        assert_eq!(
            *rec.0.borrow(),
            vec![op::GENERATE_MASK, op::COMPOSITE, op::RENDER_OVERLAY]
        );
    }

    #[test]
    fn process_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbImage::from_pixel(64, 48, Rgb([50, 100, 150]))
            .save(&input)
            .unwrap();

        let engine = VignetteEngine::with_font(params(false), None);
        engine
            .process_file(&input, &output, &NoopInstrumentation)
            .unwrap();
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (64, 48));
    }
}
