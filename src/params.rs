//! Immutable per-batch vignette parameters.

use image::Rgb;

use crate::composite::DEBUG_BACKGROUND;
use crate::error::{Error, Result};
use crate::geometry::{self, VignetteGeometry};

/// Default falloff strength.
pub const DEFAULT_STRENGTH: f64 = 2.5;

/// Default diagonal divisor for the clear radius.
pub const DEFAULT_RADIUS_DIVISOR: f64 = 4.0;

/// Parameters shared by every image of a batch.
///
/// Built once at batch start; the strength is clamped to `[0.1, 10.0]` and
/// the divisor is validated on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignetteParameters {
    clear_radius_divisor: f64,
    falloff_strength: f64,
    background_color: Rgb<u8>,
    debug_mode: bool,
}

impl VignetteParameters {
    /// Create a parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `clear_radius_divisor` is not a
    /// finite number greater than zero.
    pub fn new(
        clear_radius_divisor: f64,
        falloff_strength: f64,
        background_color: Rgb<u8>,
        debug_mode: bool,
    ) -> Result<Self> {
        if !clear_radius_divisor.is_finite() || clear_radius_divisor <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "radius divisor must be > 0, got {clear_radius_divisor}"
            )));
        }
        Ok(Self {
            clear_radius_divisor,
            falloff_strength: geometry::clamp_strength(falloff_strength),
            background_color,
            debug_mode,
        })
    }

    /// Diagonal divisor for the clear radius.
    #[must_use]
    pub fn clear_radius_divisor(&self) -> f64 {
        self.clear_radius_divisor
    }

    /// Clamped falloff strength.
    #[must_use]
    pub fn falloff_strength(&self) -> f64 {
        self.falloff_strength
    }

    /// The configured background color.
    #[must_use]
    pub fn background_color(&self) -> Rgb<u8> {
        self.background_color
    }

    /// Whether the diagnostic overlay is drawn.
    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Background actually composited: diagnostic green in debug mode.
    #[must_use]
    pub fn effective_background(&self) -> Rgb<u8> {
        if self.debug_mode {
            DEBUG_BACKGROUND
        } else {
            self.background_color
        }
    }

    /// Clear radius for a `width` x `height` image.
    #[must_use]
    pub fn clear_radius(&self, width: u32, height: u32) -> u32 {
        geometry::clear_radius(width, height, self.clear_radius_divisor)
    }

    /// Full geometry for a `width` x `height` image.
    #[must_use]
    pub fn geometry_for(&self, width: u32, height: u32) -> VignetteGeometry {
        VignetteGeometry::from_divisor(
            width,
            height,
            self.clear_radius_divisor,
            self.falloff_strength,
        )
    }
}

impl Default for VignetteParameters {
    fn default() -> Self {
        Self {
            clear_radius_divisor: DEFAULT_RADIUS_DIVISOR,
            falloff_strength: DEFAULT_STRENGTH,
            background_color: Rgb([0, 0, 0]),
            debug_mode: false,
        }
    }
}
