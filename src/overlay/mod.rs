//! Diagnostic overlay for debug-mode output.
//!
//! Draws the clear-zone circle, the fade-threshold rings, a crosshair with
//! radial guides, corner ticks, and an info panel listing the geometry. All
//! distances come from [`VignetteGeometry`], the same source the mask uses.
//! The overlay is purely presentational and never feeds back into the mask.

pub mod font;

use ab_glyph::{Font, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut, text_size};

use crate::geometry::VignetteGeometry;

/// Clear-zone circle color.
pub const CLEAR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const CROSSHAIR_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const GUIDE_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Fade thresholds drawn as rings, with their colors.
pub const FADE_THRESHOLDS: [(f64, Rgb<u8>); 4] = [
    (0.25, Rgb([255, 255, 0])),
    (0.50, Rgb([255, 165, 0])),
    (0.75, Rgb([255, 0, 0])),
    (1.00, Rgb([255, 0, 255])),
];

/// Darkening factor applied under the info panel.
const PANEL_DIM: u8 = 3;

/// A ring marking where the background reaches a given coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRing {
    /// Background coverage at this ring, in `(0, 1]`.
    pub fraction: f64,
    /// Ring radius in pixels.
    pub radius: f64,
    /// Ring color.
    pub color: Rgb<u8>,
    /// Whether any part of the ring lies inside the image.
    pub visible: bool,
}

/// Inputs needed to draw the overlay for one image.
#[derive(Debug, Clone, Copy)]
pub struct OverlayParams {
    geometry: VignetteGeometry,
    radius_divisor: f64,
}

impl OverlayParams {
    /// Derive overlay geometry for a `width` x `height` image.
    #[must_use]
    pub fn new(width: u32, height: u32, strength: f64, radius_divisor: f64) -> Self {
        Self {
            geometry: VignetteGeometry::from_divisor(width, height, radius_divisor, strength),
            radius_divisor,
        }
    }

    /// The shared vignette geometry.
    #[must_use]
    pub fn geometry(&self) -> &VignetteGeometry {
        &self.geometry
    }

    /// The four fade-threshold rings.
    #[must_use]
    pub fn rings(&self) -> [FadeRing; 4] {
        let g = &self.geometry;
        FADE_THRESHOLDS.map(|(fraction, color)| {
            let radius = g.threshold_distance(fraction);
            FadeRing {
                fraction,
                radius,
                color,
                // Half a pixel of slack for the 100% ring, which lands on the corner.
                visible: radius <= g.corner_distance + 0.5,
            }
        })
    }

    fn info_lines(&self) -> Vec<(String, Rgb<u8>)> {
        let g = &self.geometry;
        let mut lines = vec![
            ("Mode: DEBUG".to_string(), TEXT_COLOR),
            (format!("Image: {} x {} px", g.width, g.height), TEXT_COLOR),
            (format!("Diagonal: {:.1} px", g.diagonal), TEXT_COLOR),
            (format!("Strength: {:.2}", g.strength), TEXT_COLOR),
            (format!("Radius divisor: {:.2}", self.radius_divisor), TEXT_COLOR),
            (format!("Clear zone: {:.0} px", g.radius), TEXT_COLOR),
            (format!("Fade range: {:.1} px", g.fade_range), TEXT_COLOR),
            (format!("Corner distance: {:.1} px", g.corner_distance), TEXT_COLOR),
            ("Legend:".to_string(), TEXT_COLOR),
            ("  clear radius".to_string(), CLEAR_COLOR),
        ];
        lines.extend(
            self.rings()
                .iter()
                .map(|r| (format!("  {:.0}% fade", r.fraction * 100.0), r.color)),
        );
        lines.push(("Corners to center:".to_string(), TEXT_COLOR));
        for (label, x, y) in corners(g.width, g.height) {
            lines.push((format!("  {label}: {:.1} px", g.distance(x, y)), TEXT_COLOR));
        }
        lines
    }
}

fn corners(width: u32, height: u32) -> [(&'static str, u32, u32); 4] {
    let (right, bottom) = (width.saturating_sub(1), height.saturating_sub(1));
    [
        ("top-left", 0, 0),
        ("top-right", right, 0),
        ("bottom-left", 0, bottom),
        ("bottom-right", right, bottom),
    ]
}

/// Draw the diagnostic overlay onto `image` in place.
///
/// Labels and the info panel use `font`, or the built-in face when `None`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn render_overlay(image: &mut RgbImage, params: &OverlayParams, font: Option<&FontVec>) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let g = params.geometry();
    let short_side = width.min(height);
    let thickness = (short_side / 400).max(2);
    let (cx, cy) = (g.center_x as f32, g.center_y as f32);
    let (w, h) = ((width - 1) as f32, (height - 1) as f32);

    draw_ring(image, (cx, cy), g.radius, thickness, CLEAR_COLOR);
    for ring in params.rings().iter().filter(|r| r.visible) {
        draw_ring(image, (cx, cy), ring.radius, thickness, ring.color);
    }

    // Radial guides to the edge midpoints.
    for end in [(cx, 0.0), (cx, h), (0.0, cy), (w, cy)] {
        draw_line_segment_mut(image, (cx, cy), end, GUIDE_COLOR);
    }

    let arm = (short_side / 20).max(10) as f32;
    draw_thick_line(image, (cx - arm, cy), (cx + arm, cy), thickness, CROSSHAIR_COLOR);
    draw_thick_line(image, (cx, cy - arm), (cx, cy + arm), thickness, CROSSHAIR_COLOR);

    let tick = (short_side / 15).max(10) as f32;
    for (_, x, y) in corners(width, height) {
        let (x, y) = (x as f32, y as f32);
        let dx = if x > 0.0 { -tick } else { tick };
        let dy = if y > 0.0 { -tick } else { tick };
        draw_thick_line(image, (x, y), (x + dx, y), thickness, CROSSHAIR_COLOR);
        draw_thick_line(image, (x, y), (x, y + dy), thickness, CROSSHAIR_COLOR);
    }

    if let Some(font) = font {
        draw_labels(image, params, font);
    } else if let Some(font) = font::embedded_font() {
        draw_labels(image, params, font);
    }
}

/// Radius labels plus the info panel.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn draw_labels(image: &mut RgbImage, params: &OverlayParams, font: &impl Font) {
    let g = params.geometry();
    let short_side = image.width().min(image.height());
    let scale = PxScale::from((short_side as f32 / 45.0).clamp(12.0, 48.0));
    let (cx, cy) = (g.center_x as f32, g.center_y as f32);

    let label_y = (g.center_y - g.radius) as f32 - scale.y - 4.0;
    draw_text_mut(
        image,
        CLEAR_COLOR,
        (cx + 6.0) as i32,
        label_y.max(0.0) as i32,
        scale,
        font,
        &format!("r = {:.0} px", g.radius),
    );
    for ring in params.rings().iter().filter(|r| r.visible) {
        let offset = (ring.radius * std::f64::consts::FRAC_1_SQRT_2) as f32;
        draw_text_mut(
            image,
            ring.color,
            (cx + offset + 4.0) as i32,
            (cy + offset) as i32,
            scale,
            font,
            &format!("{:.0}%", ring.fraction * 100.0),
        );
    }

    draw_info_panel(image, &params.info_lines(), scale, font);
}

/// Dim the top-left corner and list the geometry on top of it.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
fn draw_info_panel(
    image: &mut RgbImage,
    lines: &[(String, Rgb<u8>)],
    scale: PxScale,
    font: &impl Font,
) {
    let padding = (scale.y / 2.0) as u32;
    let line_height = (scale.y * 1.2).ceil() as u32;
    let text_width = lines
        .iter()
        .map(|(text, _)| text_size(scale, font, text).0)
        .max()
        .unwrap_or(0);

    let panel_w = (text_width + 2 * padding).min(image.width());
    let panel_h = (line_height * lines.len() as u32 + 2 * padding).min(image.height());
    for y in 0..panel_h {
        for x in 0..panel_w {
            let px = image.get_pixel_mut(x, y);
            for ch in 0..3 {
                px[ch] /= PANEL_DIM;
            }
        }
    }

    for (i, (text, color)) in lines.iter().enumerate() {
        let y = padding + line_height * i as u32;
        draw_text_mut(image, *color, padding as i32, y as i32, scale, font, text);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn draw_ring(
    image: &mut RgbImage,
    center: (f32, f32),
    radius: f64,
    thickness: u32,
    color: Rgb<u8>,
) {
    let center = (center.0.round() as i32, center.1.round() as i32);
    let base = radius.round() as i32 - (thickness / 2) as i32;
    for k in 0..thickness as i32 {
        let r = base + k;
        if r > 0 {
            draw_hollow_circle_mut(image, center, r, color);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn draw_thick_line(
    image: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    thickness: u32,
    color: Rgb<u8>,
) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return;
    }
    let (nx, ny) = (-dy / len, dx / len);
    let half = (thickness as f32 - 1.0) / 2.0;
    for k in 0..thickness {
        let off = k as f32 - half;
        draw_line_segment_mut(
            image,
            (start.0 + nx * off, start.1 + ny * off),
            (end.0 + nx * off, end.1 + ny * off),
            color,
        );
    }
}
