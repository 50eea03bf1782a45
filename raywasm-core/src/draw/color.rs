//! raylib color helpers. Channel results are truncated toward zero and saturate at the
//! `u8` range.

use crate::surface::Color;

fn channel(v: f32) -> u8 {
    v as u8
}

pub fn lerp(a: Color, b: Color, factor: f32) -> Color {
    let f = factor.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| channel(((1.0 - f) * x as f32 + f * y as f32).floor());
    Color::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

/// Negative factors darken toward black, positive ones lighten toward white. Alpha is kept.
pub fn brightness(c: Color, factor: f32) -> Color {
    let f = factor.clamp(-1.0, 1.0);
    let adjust = |v: u8| {
        let v = v as f32;
        if f < 0.0 {
            channel(v * (1.0 + f))
        } else {
            channel((255.0 - v) * f + v)
        }
    };
    Color::new(adjust(c.r), adjust(c.g), adjust(c.b), c.a)
}

pub fn fade(c: Color, alpha: f32) -> Color {
    Color::new(c.r, c.g, c.b, channel((255.0 * alpha).clamp(0.0, 255.0)))
}

pub fn with_alpha(c: Color, alpha: f32) -> Color {
    Color::new(c.r, c.g, c.b, channel(255.0 * alpha.clamp(0.0, 1.0)))
}

/// Hue in degrees, saturation and value in `[0, 1]`. Alpha is always opaque.
pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Color {
    let component = |offset: f32| {
        let k = (offset + hue / 60.0) % 6.0;
        let k = k.min(4.0 - k).clamp(0.0, 1.0);
        channel((value - value * saturation * k) * 255.0)
    };
    Color::new(component(5.0), component(3.0), component(1.0), 255)
}
