//! Drawing requests -> surface calls.
//!
//! Every function here sets the paint state it needs and issues its primitives; nothing
//! is remembered between calls except what the surface itself keeps (the line width in
//! particular).

pub mod color;

use std::f32::consts::TAU;
use std::sync::Arc;

use fontdue::Font;

use crate::memory::{Rectangle, Vector2};
use crate::surface::{Color, FontFace, FontSpec, Image, Paint, Surface};

/// The built-in face renders larger than raylib's own bitmap font; every default-font
/// size is scaled by this factor.
pub const FONT_SCALE_MAGIC: f32 = 0.65;

pub fn clear_background(surface: &mut dyn Surface, color: Color) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    surface.set_fill(Paint::Solid(color));
    surface.fill_rect(0.0, 0.0, w, h);
}

pub fn circle(surface: &mut dyn Surface, center: Vector2, radius: f32, color: Color) {
    surface.begin_path();
    surface.arc(center.x, center.y, radius, 0.0, TAU);
    surface.set_fill(Paint::Solid(color));
    surface.fill();
}

pub fn circle_lines(surface: &mut dyn Surface, center: Vector2, radius: f32, color: Color) {
    surface.begin_path();
    surface.arc(center.x, center.y, radius, 0.0, TAU);
    surface.set_stroke(Paint::Solid(color));
    surface.set_line_width(1.0);
    surface.stroke();
}

/// Ring between two radii, drawn as one stroke at the mid radius. Angles are degrees;
/// `segments` only matters to tessellating renderers and is ignored.
pub fn ring(
    surface: &mut dyn Surface,
    center: Vector2,
    inner: f32,
    outer: f32,
    start_deg: f32,
    end_deg: f32,
    color: Color,
) {
    let thickness = outer - inner;
    let radius = inner + thickness / 2.0;
    let mut start = (start_deg % 360.0).to_radians();
    let mut end = (end_deg % 360.0).to_radians();
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    surface.begin_path();
    surface.arc(center.x, center.y, radius, start, end);
    surface.set_stroke(Paint::Solid(color));
    surface.set_line_width(thickness);
    surface.stroke();
}

pub fn circle_gradient(
    surface: &mut dyn Surface,
    center: Vector2,
    radius: f32,
    inner: Color,
    outer: Color,
) {
    let gradient = Paint::RadialGradient {
        center,
        inner: radius / 2.0,
        outer: radius,
        stops: vec![(0.0, inner), (0.5, outer)],
    };
    surface.begin_path();
    surface.arc(center.x, center.y, radius, 0.0, TAU);
    surface.set_fill(gradient);
    surface.fill();
}

pub fn rectangle(surface: &mut dyn Surface, rec: Rectangle, color: Color) {
    surface.set_fill(Paint::Solid(color));
    surface.fill_rect(rec.x, rec.y, rec.width, rec.height);
}

/// Outline with whatever line width the surface currently has.
pub fn rectangle_lines(surface: &mut dyn Surface, rec: Rectangle, color: Color) {
    surface.set_stroke(Paint::Solid(color));
    surface.stroke_rect(rec.x, rec.y, rec.width, rec.height);
}

/// Outline of width `thick` kept entirely inside `rec`.
pub fn rectangle_lines_ex(surface: &mut dyn Surface, rec: Rectangle, thick: f32, color: Color) {
    surface.set_stroke(Paint::Solid(color));
    surface.set_line_width(thick);
    surface.stroke_rect(
        rec.x + thick / 2.0,
        rec.y + thick / 2.0,
        rec.width - thick,
        rec.height - thick,
    );
}

pub fn triangle(surface: &mut dyn Surface, v1: Vector2, v2: Vector2, v3: Vector2, color: Color) {
    surface.begin_path();
    surface.move_to(v1.x, v1.y);
    surface.line_to(v2.x, v2.y);
    surface.line_to(v3.x, v3.y);
    surface.set_fill(Paint::Solid(color));
    surface.fill();
}

fn default_font(size: f32, glyphs: Option<Arc<Font>>) -> FontSpec {
    FontSpec::new(size * FONT_SCALE_MAGIC, FontFace::Default, glyphs)
}

/// Default-font text. Lines split on `\n`; line `i` sits on baseline `y + size * (i + 1)`
/// where `size` is the scaled size.
pub fn text(
    surface: &mut dyn Surface,
    text: &str,
    pos: Vector2,
    size: f32,
    color: Color,
    glyphs: Option<Arc<Font>>,
) {
    let font = default_font(size, glyphs);
    let line_height = font.size;
    surface.set_fill(Paint::Solid(color));
    surface.set_font(font);
    for (i, line) in text.split('\n').enumerate() {
        surface.fill_text(line, pos.x, pos.y + line_height + i as f32 * line_height);
    }
}

/// Width of `text` in the scaled default font, truncated like the guest's `int`.
pub fn measure_text(
    surface: &mut dyn Surface,
    text: &str,
    size: f32,
    glyphs: Option<Arc<Font>>,
) -> i32 {
    surface.set_font(default_font(size, glyphs));
    surface.measure_text(text) as i32
}

/// Text in a loaded face on a single baseline at `pos.y + size`. Spacing is not applied.
pub fn text_ex(
    surface: &mut dyn Surface,
    font: FontSpec,
    text: &str,
    pos: Vector2,
    tint: Color,
) {
    let baseline = pos.y + font.size;
    surface.set_fill(Paint::Solid(tint));
    surface.set_font(font);
    surface.fill_text(text, pos.x, baseline);
}

/// `(width, size)` of `text` in a loaded face.
pub fn measure_text_ex(surface: &mut dyn Surface, font: FontSpec, text: &str) -> Vector2 {
    let size = font.size;
    surface.set_font(font);
    Vector2 {
        x: surface.measure_text(text),
        y: size,
    }
}

/// Blit at the given position. Tinting is not supported.
pub fn texture(surface: &mut dyn Surface, image: &Image, pos: Vector2) {
    surface.draw_image(image, pos.x, pos.y);
}
