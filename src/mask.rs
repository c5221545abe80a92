//! Radial falloff mask generation.
//!
//! The mask is a single-channel opacity raster: 255 keeps the source pixel,
//! 0 shows the background. Values are computed in floating point, softened
//! with a Gaussian blur when the strength allows it, and only then
//! quantized to 8 bits.

use image::{imageops, GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;

use crate::geometry::VignetteGeometry;

type Field = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Generate the vignette mask for a `width` x `height` image.
///
/// `radius` is the clear-zone radius in pixels (see
/// [`geometry::clear_radius`](crate::geometry::clear_radius)); `strength`
/// is clamped to `[0.1, 10.0]`. Never fails: a radius beyond the corners
/// falls back to a fade band of 30% of the corner distance.
#[must_use]
pub fn generate_mask(width: u32, height: u32, radius: u32, strength: f64) -> GrayImage {
    mask_from_geometry(&VignetteGeometry::new(width, height, radius, strength))
}

/// Generate the mask for an already-derived geometry.
///
/// The blurred field is evaluated on a canvas padded by the kernel support,
/// so pixels near the border see the true falloff beyond the edge instead
/// of replicated border values. Pixels inside the clear radius stay 255.
#[must_use]
pub fn mask_from_geometry(geometry: &VignetteGeometry) -> GrayImage {
    let (width, height) = (geometry.width, geometry.height);
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let field = match geometry.blur_radius() {
        Some(sigma) => blurred_field(geometry, sigma),
        None => falloff_field(geometry, 0),
    };

    GrayImage::from_fn(width, height, |x, y| {
        if geometry.distance(x, y) <= geometry.radius {
            Luma([u8::MAX])
        } else {
            Luma([quantize(field.get_pixel(x, y)[0])])
        }
    })
}

/// Opacity field in `[0, 255]`, extended by `pad` pixels on every side.
#[allow(clippy::cast_possible_truncation)]
fn falloff_field(geometry: &VignetteGeometry, pad: u32) -> Field {
    let offset = f64::from(pad);
    ImageBuffer::from_fn(
        geometry.width + 2 * pad,
        geometry.height + 2 * pad,
        |x, y| {
            let d = geometry.distance_to(f64::from(x) - offset, f64::from(y) - offset);
            Luma([(255.0 * geometry.opacity_at(d)) as f32])
        },
    )
}

/// Blur the padded field and crop it back to the image.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blurred_field(geometry: &VignetteGeometry, sigma: f64) -> Field {
    let sigma = sigma as f32;
    let pad = kernel_support(sigma);
    let blurred = gaussian_blur_f32(&falloff_field(geometry, pad), sigma);
    imageops::crop_imm(&blurred, pad, pad, geometry.width, geometry.height).to_image()
}

/// Padding that keeps the kernel's edge clamping out of the cropped area.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn kernel_support(sigma: f32) -> u32 {
    (2.0 * sigma).ceil() as u32 + 1
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
