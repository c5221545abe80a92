//! Shared vignette geometry.
//!
//! The mask generator and the debug overlay both derive their distances from
//! [`VignetteGeometry`], so a tuning change here moves the drawn rings and the
//! actual falloff together.

/// Lowest accepted falloff strength.
pub const MIN_STRENGTH: f64 = 0.1;

/// Highest accepted falloff strength.
pub const MAX_STRENGTH: f64 = 10.0;

/// Strength at which the fade band starts to shrink.
pub const SHARPEN_ONSET: f64 = 5.0;

/// Strength at and above which the edge blur is skipped.
///
/// Intentionally distinct from [`SHARPEN_ONSET`].
pub const BLUR_SKIP_STRENGTH: f64 = 8.0;

/// Narrowest fade band, as a fraction of the unsharpened band.
const MIN_FADE_FRACTION: f64 = 0.05;

/// Fade band used when the clear radius reaches past the corners.
const FALLBACK_FADE_FRACTION: f64 = 0.3;

/// Fade range pixels per pixel of blur radius.
const BLUR_DIVISOR: f64 = 25.0;

/// Clamp a falloff strength into `[MIN_STRENGTH, MAX_STRENGTH]`.
///
/// NaN maps to [`MIN_STRENGTH`].
#[must_use]
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        return MIN_STRENGTH;
    }
    strength.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

/// Length of the image diagonal in pixels.
#[must_use]
pub fn diagonal(width: u32, height: u32) -> f64 {
    f64::from(width).hypot(f64::from(height))
}

/// Clear-zone radius: `floor(diagonal / divisor)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clear_radius(width: u32, height: u32, divisor: f64) -> u32 {
    (diagonal(width, height) / divisor).floor() as u32
}

/// Pixel-index center of an image: `((w - 1) / 2, (h - 1) / 2)`.
#[must_use]
pub fn center(width: u32, height: u32) -> (f64, f64) {
    (
        (f64::from(width) - 1.0).max(0.0) / 2.0,
        (f64::from(height) - 1.0).max(0.0) / 2.0,
    )
}

/// Width of the band over which the mask fades from opaque to clear.
///
/// Strengths at or above [`SHARPEN_ONSET`] shrink the band linearly down to
/// 5% at strength 10. A non-positive band falls back to 30% of the corner
/// distance.
#[must_use]
pub fn fade_range(corner_distance: f64, radius: f64, strength: f64) -> f64 {
    let base = corner_distance - radius;
    let range = if strength < SHARPEN_ONSET {
        base
    } else {
        base * ((MAX_STRENGTH - strength) / 5.0).max(MIN_FADE_FRACTION)
    };
    if range <= 0.0 {
        corner_distance * FALLBACK_FADE_FRACTION
    } else {
        range
    }
}

/// Gaussian blur radius for the mask edge, or `None` when the strength is
/// high enough that the edge should stay sharp.
#[must_use]
pub fn blur_radius(fade_range: f64, strength: f64) -> Option<f64> {
    if strength >= BLUR_SKIP_STRENGTH {
        None
    } else {
        Some((fade_range / BLUR_DIVISOR).floor().max(1.0))
    }
}

/// All derived distances for one image and parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignetteGeometry {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Horizontal center in pixel coordinates.
    pub center_x: f64,
    /// Vertical center in pixel coordinates.
    pub center_y: f64,
    /// Image diagonal in pixels.
    pub diagonal: f64,
    /// Clear-zone radius in pixels.
    pub radius: f64,
    /// Distance from the center to the farthest corner.
    pub corner_distance: f64,
    /// Width of the fade band in pixels.
    pub fade_range: f64,
    /// Clamped falloff strength.
    pub strength: f64,
}

impl VignetteGeometry {
    /// Build the geometry from an explicit clear radius.
    #[must_use]
    pub fn new(width: u32, height: u32, radius: u32, strength: f64) -> Self {
        let strength = clamp_strength(strength);
        let (center_x, center_y) = center(width, height);
        let corner_distance = center_x.hypot(center_y);
        let radius = f64::from(radius);
        Self {
            width,
            height,
            center_x,
            center_y,
            diagonal: diagonal(width, height),
            radius,
            corner_distance,
            fade_range: fade_range(corner_distance, radius, strength),
            strength,
        }
    }

    /// Build the geometry from a diagonal divisor, as the batch driver does.
    #[must_use]
    pub fn from_divisor(width: u32, height: u32, divisor: f64, strength: f64) -> Self {
        Self::new(width, height, clear_radius(width, height, divisor), strength)
    }

    /// Distance of pixel `(x, y)` from the center.
    #[must_use]
    pub fn distance(&self, x: u32, y: u32) -> f64 {
        self.distance_to(f64::from(x), f64::from(y))
    }

    /// Distance of an arbitrary point from the center, which may lie
    /// outside the image.
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (x - self.center_x).hypot(y - self.center_y)
    }

    /// Opacity of the source image at `distance`, in `[0, 1]`.
    ///
    /// `1.0` inside the clear radius, decaying as `1 - t^strength` across
    /// the fade band.
    #[must_use]
    pub fn opacity_at(&self, distance: f64) -> f64 {
        // Single-pixel images have no band to fade across.
        if self.fade_range <= 0.0 {
            return if distance <= self.radius { 1.0 } else { 0.0 };
        }
        let d = distance.max(self.radius);
        let normalized = ((d - self.radius) / self.fade_range).clamp(0.0, 1.0);
        1.0 - normalized.powf(self.strength)
    }

    /// Distance at which the background covers `fraction` of the pixel.
    ///
    /// Inverse of [`Self::opacity_at`] inside the fade band.
    #[must_use]
    pub fn threshold_distance(&self, fraction: f64) -> f64 {
        self.radius + fraction.clamp(0.0, 1.0).powf(1.0 / self.strength) * self.fade_range
    }

    /// Blur radius for this geometry, `None` when blur is skipped.
    #[must_use]
    pub fn blur_radius(&self) -> Option<f64> {
        blur_radius(self.fade_range, self.strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_is_clamped() {
        assert!((clamp_strength(0.0) - MIN_STRENGTH).abs() < f64::EPSILON);
        assert!((clamp_strength(42.0) - MAX_STRENGTH).abs() < f64::EPSILON);
        assert!((clamp_strength(2.5) - 2.5).abs() < f64::EPSILON);
        assert!((clamp_strength(f64::NAN) - MIN_STRENGTH).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_radius_floors_diagonal_over_divisor() {
        // 300x400 has a 500px diagonal.
        assert_eq!(clear_radius(300, 400, 4.0), 125);
        assert_eq!(clear_radius(300, 400, 3.0), 166);
        assert_eq!(clear_radius(300, 400, 1.0), 500);
    }

    #[test]
    fn center_uses_pixel_index_centering() {
        assert_eq!(center(4, 6), (1.5, 2.5));
        assert_eq!(center(5, 5), (2.0, 2.0));
        assert_eq!(center(1, 1), (0.0, 0.0));
    }

    #[test]
    fn fade_range_is_full_band_below_sharpen_onset() {
        assert!((fade_range(100.0, 40.0, 2.5) - 60.0).abs() < 1e-9);
        assert!((fade_range(100.0, 40.0, 4.99) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn fade_range_shrinks_linearly_above_sharpen_onset() {
        assert!((fade_range(100.0, 40.0, 5.0) - 60.0).abs() < 1e-9);
        assert!((fade_range(100.0, 40.0, 7.5) - 30.0).abs() < 1e-9);
        assert!((fade_range(100.0, 40.0, 10.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fade_range_falls_back_when_radius_exceeds_corner() {
        assert!((fade_range(100.0, 150.0, 2.0) - 30.0).abs() < 1e-9);
        assert!((fade_range(100.0, 100.0, 9.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn blur_skips_at_eight_not_at_five() {
        assert_eq!(blur_radius(100.0, 5.0), Some(4.0));
        assert_eq!(blur_radius(100.0, 7.99), Some(4.0));
        assert_eq!(blur_radius(100.0, 8.0), None);
        assert_eq!(blur_radius(10.0, 1.0), Some(1.0));
    }

    #[test]
    fn opacity_is_full_inside_radius_and_zero_past_band() {
        let geom = VignetteGeometry::new(201, 201, 50, 2.0);
        assert!((geom.opacity_at(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((geom.opacity_at(50.0) - 1.0).abs() < f64::EPSILON);
        assert!(geom.opacity_at(geom.radius + geom.fade_range).abs() < f64::EPSILON);
        assert!(geom.opacity_at(1e6).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_distance_inverts_opacity() {
        let geom = VignetteGeometry::new(640, 480, 100, 3.0);
        for fraction in [0.25, 0.5, 0.75, 1.0] {
            let d = geom.threshold_distance(fraction);
            assert!((1.0 - geom.opacity_at(d) - fraction).abs() < 1e-9);
        }
    }

    #[test]
    fn corner_distance_matches_center_hypot() {
        let geom = VignetteGeometry::from_divisor(300, 400, 4.0, 2.5);
        assert!((geom.corner_distance - 149.5f64.hypot(199.5)).abs() < 1e-9);
        assert!((geom.diagonal - 500.0).abs() < 1e-9);
        assert!((geom.radius - 125.0).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_extends_past_the_image() {
        let geom = VignetteGeometry::new(5, 5, 1, 2.5);
        assert!((geom.distance_to(-1.0, 2.0) - 3.0).abs() < 1e-12);
        assert!((geom.distance(4, 2) - geom.distance_to(4.0, 2.0)).abs() < f64::EPSILON);
    }
}
