//! Immediate-mode 2D drawing surfaces.
//!
//! [`Surface`] is a small canvas-like contract: paint state (fill, stroke, line width,
//! font), a current path, and a handful of primitives. Paint state persists across calls
//! until overwritten, which is what lets `DrawRectangleLines` pick up whatever line width
//! an earlier call left behind.

mod framebuffer;
mod recording;

pub use framebuffer::FramebufferSurface;
pub use recording::{PaintLog, PaintOp, RecordingSurface};

use std::fmt;
use std::sync::Arc;

use crate::memory::Vector2;

/// RGBA8 color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Renders as `#rrggbbaa`, lower-case.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Fill or stroke style.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Two concentric circles sharing `center`; `stops` are `(offset, color)` pairs with
    /// offsets in `[0, 1]` measured from `inner` to `outer`.
    RadialGradient {
        center: Vector2,
        inner: f32,
        outer: f32,
        stops: Vec<(f32, Color)>,
    },
}

impl Paint {
    /// Color of this paint at `p`.
    pub fn color_at(&self, p: Vector2) -> Color {
        match self {
            Paint::Solid(c) => *c,
            Paint::RadialGradient {
                center,
                inner,
                outer,
                stops,
            } => {
                let d = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
                let span = outer - inner;
                let t = if span.abs() < f32::EPSILON {
                    if d < *inner { 0.0 } else { 1.0 }
                } else {
                    ((d - inner) / span).clamp(0.0, 1.0)
                };
                gradient_at(stops, t)
            }
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Color::BLACK)
    }
}

fn gradient_at(stops: &[(f32, Color)], t: f32) -> Color {
    let Some(&(first_at, first)) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if t <= first_at {
        return first;
    }
    for pair in stops.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if t <= b_at {
            let f = if b_at > a_at {
                (t - a_at) / (b_at - a_at)
            } else {
                1.0
            };
            let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round() as u8;
            return Color::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a));
        }
    }
    // Past the last stop the last color holds.
    stops[stops.len() - 1].1
}

/// Which face text is drawn with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FontFace {
    /// The host's built-in face.
    #[default]
    Default,
    /// A face loaded with `LoadFontEx`, by handle.
    Custom(u32),
}

/// Font state of a surface: pixel size, face, and the glyph source if one is loaded.
#[derive(Clone, Default)]
pub struct FontSpec {
    pub size: f32,
    pub face: FontFace,
    pub glyphs: Option<Arc<fontdue::Font>>,
}

impl FontSpec {
    pub fn new(size: f32, face: FontFace, glyphs: Option<Arc<fontdue::Font>>) -> Self {
        Self { size, face, glyphs }
    }
}

impl fmt::Debug for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSpec")
            .field("size", &self.size)
            .field("face", &self.face)
            .field("glyphs", &self.glyphs.is_some())
            .finish()
    }
}

impl PartialEq for FontSpec {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.face == other.face
    }
}

/// Decoded RGBA8 pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.rgba.get(i..i + 4)?;
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }
}

/// A 2D drawing target.
///
/// Angles are radians, clockwise from the positive x axis (y grows downward).
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Resize the backing store. Contents after a resize are cleared.
    fn resize(&mut self, width: u32, height: u32);
    /// Top-left corner of the surface in host (pointer) coordinates.
    fn origin(&self) -> Vector2;

    fn set_fill(&mut self, paint: Paint);
    fn set_stroke(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);
    fn line_width(&self) -> f32;
    fn set_font(&mut self, font: FontSpec);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    /// Append a clockwise arc from `start` to `end` around `(cx, cy)`.
    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    /// Reset the area to transparent black.
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    /// Draw `text` with its alphabetic baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    /// Advance width of `text` in the current font.
    fn measure_text(&self, text: &str) -> f32;
    fn draw_image(&mut self, image: &Image, x: f32, y: f32);

    /// Current pixels, when the surface has any.
    fn snapshot(&self) -> Option<Image>;
}
