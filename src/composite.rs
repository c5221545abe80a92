//! Mask compositing.
//!
//! The source image is laid over a solid background using the mask as the
//! foreground opacity:
//! `output = (image * mask + background * (255 - mask)) / 255`

use image::{GrayImage, Rgb, RgbImage};

use crate::error::{Error, Result};

/// Fixed background used in debug mode so the faded region stands out.
pub const DEBUG_BACKGROUND: Rgb<u8> = Rgb([0, 255, 0]);

/// Blend `image` over a solid `background` through `mask`.
///
/// A mask value of 255 keeps the source pixel exactly, 0 yields the
/// background exactly. The output has the same dimensions as `image`.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the mask and image sizes differ.
pub fn composite(image: &RgbImage, mask: &GrayImage, background: Rgb<u8>) -> Result<RgbImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(Error::DimensionMismatch {
            image_width: image.width(),
            image_height: image.height(),
            mask_width: mask.width(),
            mask_height: mask.height(),
        });
    }

    let mut output = image.clone();
    for (px, alpha) in output.pixels_mut().zip(mask.pixels()) {
        let alpha = u32::from(alpha[0]);
        for ch in 0..3 {
            px[ch] = blend_channel(px[ch], background[ch], alpha);
        }
    }
    Ok(output)
}

#[allow(clippy::cast_possible_truncation)]
fn blend_channel(foreground: u8, background: u8, alpha: u32) -> u8 {
    let mixed = u32::from(foreground) * alpha + u32::from(background) * (255 - alpha);
    // Rounded division by 255; never exceeds 255.
    ((mixed + 127) / 255) as u8
}
