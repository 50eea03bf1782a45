use std::f32::consts::TAU;

use super::{Color, FontSpec, Image, Paint, Surface};
use crate::memory::Vector2;

/// Software RGBA8 surface with source-over blending.
///
/// Paths are flattened to polylines. Fills use the even-odd rule sampled at pixel
/// centers; strokes cover every pixel whose center lies within half the line width of
/// a segment.
pub struct FramebufferSurface {
    width: u32,
    height: u32,
    origin: Vector2,
    pixels: Vec<u8>,
    fill: Paint,
    stroke: Paint,
    line_width: f32,
    font: FontSpec,
    path: Vec<Vec<Vector2>>,
}

impl FramebufferSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            origin: Vector2::default(),
            pixels: vec![0; width as usize * height as usize * 4],
            fill: Paint::default(),
            stroke: Paint::default(),
            line_width: 1.0,
            font: FontSpec::new(10.0, Default::default(), None),
            path: Vec::new(),
        }
    }

    pub fn with_origin(mut self, origin: Vector2) -> Self {
        self.origin = origin;
        self
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        let p = &self.pixels[i..i + 4];
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Blend `src` over the pixel at (x, y), scaled by `coverage` in `[0, 1]`.
    fn blend(&mut self, x: i32, y: i32, src: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = self.index(x as u32, y as u32);
        let dst = &mut self.pixels[i..i + 4];

        let sa = (src.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            dst.copy_from_slice(&[0, 0, 0, 0]);
            return;
        }
        let mix = |s: u8, d: u8| {
            let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        dst[0] = mix(src.r, dst[0]);
        dst[1] = mix(src.g, dst[1]);
        dst[2] = mix(src.b, dst[2]);
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Pixel index range whose centers fall inside `[lo, hi)`, clipped to `0..limit`.
    fn span(lo: f32, hi: f32, limit: u32) -> std::ops::Range<i32> {
        let start = (lo - 0.5).ceil().max(0.0) as i32;
        let end = (hi - 0.5).ceil().min(limit as f32).max(0.0) as i32;
        start..end.max(start)
    }

    fn current_subpath(&mut self) -> &mut Vec<Vector2> {
        if self.path.is_empty() {
            self.path.push(Vec::new());
        }
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    fn fill_polygons(&mut self, polygons: &[Vec<Vector2>]) {
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in polygons.iter().flatten() {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        if !min_y.is_finite() {
            return;
        }
        let paint = self.fill.clone();
        let mut crossings = Vec::new();
        for row in Self::span(min_y, max_y, self.height) {
            let yc = row as f32 + 0.5;
            crossings.clear();
            for poly in polygons.iter().filter(|p| p.len() >= 3) {
                for (i, a) in poly.iter().enumerate() {
                    let b = poly[(i + 1) % poly.len()];
                    if (a.y <= yc) != (b.y <= yc) {
                        crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(f32::total_cmp);
            for pair in crossings.chunks_exact(2) {
                for col in Self::span(pair[0], pair[1], self.width) {
                    let c = paint.color_at(Vector2 {
                        x: col as f32 + 0.5,
                        y: yc,
                    });
                    self.blend(col, row, c, 1.0);
                }
            }
        }
    }

    fn stroke_polylines(&mut self, lines: &[Vec<Vector2>]) {
        let half = (self.line_width / 2.0).max(0.5);
        let segments: Vec<(Vector2, Vector2)> = lines
            .iter()
            .flat_map(|l| {
                let single = (l.len() == 1).then(|| (l[0], l[0]));
                l.windows(2).map(|w| (w[0], w[1])).chain(single)
            })
            .collect();
        if segments.is_empty() {
            return;
        }

        // Each pixel is painted once even where segments overlap.
        let w = self.width as usize;
        let mut covered = vec![false; w * self.height as usize];
        let mut hits = Vec::new();
        for &(a, b) in &segments {
            let rows = Self::span(a.y.min(b.y) - half, a.y.max(b.y) + half, self.height);
            let cols = Self::span(a.x.min(b.x) - half, a.x.max(b.x) + half, self.width);
            for row in rows {
                for col in cols.clone() {
                    let p = Vector2 {
                        x: col as f32 + 0.5,
                        y: row as f32 + 0.5,
                    };
                    let i = row as usize * w + col as usize;
                    if !covered[i] && distance_to_segment(p, a, b) <= half {
                        covered[i] = true;
                        hits.push((col, row));
                    }
                }
            }
        }

        let paint = self.stroke.clone();
        for (col, row) in hits {
            let p = Vector2 {
                x: col as f32 + 0.5,
                y: row as f32 + 0.5,
            };
            self.blend(col, row, paint.color_at(p), 1.0);
        }
    }
}

fn distance_to_segment(p: Vector2, a: Vector2, b: Vector2) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Clockwise sweep from `start` to `end`, normalized the way a canvas does it.
fn arc_sweep(start: f32, end: f32) -> f32 {
    let sweep = end - start;
    if sweep >= TAU { TAU } else { sweep.rem_euclid(TAU) }
}

impl Surface for FramebufferSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
    }

    fn origin(&self) -> Vector2 {
        self.origin
    }

    fn set_fill(&mut self, paint: Paint) {
        self.fill = paint;
    }

    fn set_stroke(&mut self, paint: Paint) {
        self.stroke = paint;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn line_width(&self) -> f32 {
        self.line_width
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.push(vec![Vector2 { x, y }]);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current_subpath().push(Vector2 { x, y });
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        let sweep = arc_sweep(start, end);
        let steps = ((sweep * radius.abs() / 2.0).ceil() as usize).clamp(8, 720);
        let sub = self.current_subpath();
        for i in 0..=steps {
            let t = start + sweep * i as f32 / steps as f32;
            sub.push(Vector2 {
                x: cx + radius * t.cos(),
                y: cy + radius * t.sin(),
            });
        }
    }

    fn fill(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.fill_polygons(&path);
        self.path = path;
    }

    fn stroke(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.stroke_polylines(&path);
        self.path = path;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x0, x1) = (x.min(x + w), x.max(x + w));
        let (y0, y1) = (y.min(y + h), y.max(y + h));
        let paint = self.fill.clone();
        for row in Self::span(y0, y1, self.height) {
            for col in Self::span(x0, x1, self.width) {
                let c = paint.color_at(Vector2 {
                    x: col as f32 + 0.5,
                    y: row as f32 + 0.5,
                });
                self.blend(col, row, c, 1.0);
            }
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let corners = vec![
            Vector2 { x, y },
            Vector2 { x: x + w, y },
            Vector2 { x: x + w, y: y + h },
            Vector2 { x, y: y + h },
            Vector2 { x, y },
        ];
        self.stroke_polylines(&[corners]);
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x0, x1) = (x.min(x + w), x.max(x + w));
        let (y0, y1) = (y.min(y + h), y.max(y + h));
        for row in Self::span(y0, y1, self.height) {
            for col in Self::span(x0, x1, self.width) {
                let i = self.index(col as u32, row as u32);
                self.pixels[i..i + 4].copy_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let Some(font) = self.font.glyphs.clone() else {
            return;
        };
        let size = self.font.size;
        let paint = self.fill.clone();
        let mut pen = x;
        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, size);
            let left = (pen + metrics.xmin as f32).round() as i32;
            let top = (y - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            for (i, &alpha) in coverage.iter().enumerate() {
                if alpha == 0 {
                    continue;
                }
                let gx = left + (i % metrics.width) as i32;
                let gy = top + (i / metrics.width) as i32;
                let c = paint.color_at(Vector2 {
                    x: gx as f32 + 0.5,
                    y: gy as f32 + 0.5,
                });
                self.blend(gx, gy, c, alpha as f32 / 255.0);
            }
            pen += metrics.advance_width;
        }
    }

    fn measure_text(&self, text: &str) -> f32 {
        match &self.font.glyphs {
            Some(font) => text
                .chars()
                .map(|ch| font.metrics(ch, self.font.size).advance_width)
                .sum(),
            None => 0.5 * self.font.size * text.chars().count() as f32,
        }
    }

    fn draw_image(&mut self, image: &Image, x: f32, y: f32) {
        let (left, top) = (x.round() as i32, y.round() as i32);
        for iy in 0..image.height {
            for ix in 0..image.width {
                if let Some(c) = image.pixel(ix, iy) {
                    self.blend(left + ix as i32, top + iy as i32, c, 1.0);
                }
            }
        }
    }

    fn snapshot(&self) -> Option<Image> {
        Some(Image {
            width: self.width,
            height: self.height,
            rgba: self.pixels.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(255, 0, 0, 255);

    #[test]
    fn fill_rect_covers_exactly_its_pixels() {
        let mut fb = FramebufferSurface::new(8, 8);
        fb.set_fill(Paint::Solid(RED));
        fb.fill_rect(2.0, 2.0, 3.0, 2.0);

        assert_eq!(fb.pixel(2, 2), Some(RED));
        assert_eq!(fb.pixel(4, 3), Some(RED));
        assert_eq!(fb.pixel(5, 3), Some(Color::TRANSPARENT));
        assert_eq!(fb.pixel(2, 4), Some(Color::TRANSPARENT));
    }

    #[test]
    fn rects_are_clipped_to_the_surface() {
        let mut fb = FramebufferSurface::new(4, 4);
        fb.set_fill(Paint::Solid(RED));
        fb.fill_rect(-10.0, -10.0, 100.0, 100.0);
        assert_eq!(fb.pixel(0, 0), Some(RED));
        assert_eq!(fb.pixel(3, 3), Some(RED));
    }

    #[test]
    fn translucent_fill_blends_source_over() {
        let mut fb = FramebufferSurface::new(1, 1);
        fb.set_fill(Paint::Solid(Color::WHITE));
        fb.fill_rect(0.0, 0.0, 1.0, 1.0);
        fb.set_fill(Paint::Solid(Color::new(0, 0, 0, 128)));
        fb.fill_rect(0.0, 0.0, 1.0, 1.0);

        let p = fb.pixel(0, 0).unwrap();
        assert_eq!(p.a, 255);
        assert!((126..=128).contains(&p.r), "{p}");
    }

    #[test]
    fn clear_rect_resets_to_transparent() {
        let mut fb = FramebufferSurface::new(2, 2);
        fb.set_fill(Paint::Solid(RED));
        fb.fill_rect(0.0, 0.0, 2.0, 2.0);
        fb.clear_rect(0.0, 0.0, 2.0, 2.0);
        assert_eq!(fb.pixel(1, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn filled_circle_covers_center_not_corners() {
        let mut fb = FramebufferSurface::new(20, 20);
        fb.set_fill(Paint::Solid(RED));
        fb.begin_path();
        fb.arc(10.0, 10.0, 6.0, 0.0, TAU);
        fb.fill();

        assert_eq!(fb.pixel(10, 10), Some(RED));
        assert_eq!(fb.pixel(14, 10), Some(RED));
        assert_eq!(fb.pixel(1, 1), Some(Color::TRANSPARENT));
        assert_eq!(fb.pixel(18, 18), Some(Color::TRANSPARENT));
    }

    #[test]
    fn triangle_fill_uses_even_odd_rule() {
        let mut fb = FramebufferSurface::new(10, 10);
        fb.set_fill(Paint::Solid(RED));
        fb.begin_path();
        fb.move_to(0.0, 0.0);
        fb.line_to(10.0, 0.0);
        fb.line_to(0.0, 10.0);
        fb.fill();

        assert_eq!(fb.pixel(1, 1), Some(RED));
        assert_eq!(fb.pixel(8, 8), Some(Color::TRANSPARENT));
    }

    #[test]
    fn stroked_circle_leaves_the_center_empty() {
        let mut fb = FramebufferSurface::new(20, 20);
        fb.set_stroke(Paint::Solid(RED));
        fb.begin_path();
        fb.arc(10.0, 10.0, 6.0, 0.0, TAU);
        fb.stroke();

        assert_eq!(fb.pixel(10, 10), Some(Color::TRANSPARENT));
        assert_eq!(fb.pixel(15, 9), Some(RED));
    }

    #[test]
    fn polyline_joints_blend_once_and_stay_near_their_segments() {
        let mut fb = FramebufferSurface::new(12, 12);
        fb.set_fill(Paint::Solid(Color::WHITE));
        fb.fill_rect(0.0, 0.0, 12.0, 12.0);
        fb.set_stroke(Paint::Solid(Color::new(0, 0, 0, 128)));
        fb.set_line_width(1.0);
        fb.begin_path();
        fb.move_to(2.5, 5.5);
        fb.line_to(8.5, 5.5);
        fb.line_to(8.5, 10.5);
        fb.stroke();

        let joint = fb.pixel(8, 5).unwrap();
        assert_eq!(joint, fb.pixel(5, 5).unwrap());
        assert_eq!(joint, fb.pixel(8, 9).unwrap());
        assert_ne!(joint, Color::WHITE);
        // Inside the path's bounds but away from both segments.
        assert_eq!(fb.pixel(3, 9), Some(Color::WHITE));
    }

    #[test]
    fn stroke_rect_outlines_only() {
        let mut fb = FramebufferSurface::new(10, 10);
        fb.set_stroke(Paint::Solid(RED));
        fb.set_line_width(1.0);
        fb.stroke_rect(2.5, 2.5, 5.0, 5.0);

        assert_eq!(fb.pixel(2, 2), Some(RED));
        assert_eq!(fb.pixel(7, 5), Some(RED));
        assert_eq!(fb.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn arc_sweep_matches_canvas_normalization() {
        assert_eq!(arc_sweep(0.0, TAU), TAU);
        assert_eq!(arc_sweep(0.0, 3.0 * TAU), TAU);
        assert!((arc_sweep(1.0, 0.5) - (TAU - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn draw_image_blits_at_rounded_position() {
        let mut img = Image::new(2, 1);
        img.rgba.copy_from_slice(&[255, 0, 0, 255, 0, 0, 0, 0]);
        let mut fb = FramebufferSurface::new(4, 4);
        fb.draw_image(&img, 1.2, 2.0);

        assert_eq!(fb.pixel(1, 2), Some(RED));
        assert_eq!(fb.pixel(2, 2), Some(Color::TRANSPARENT));
    }

    #[test]
    fn snapshot_copies_pixels_and_resize_clears() {
        let mut fb = FramebufferSurface::new(2, 2);
        fb.set_fill(Paint::Solid(RED));
        fb.fill_rect(0.0, 0.0, 2.0, 2.0);
        let snap = fb.snapshot().unwrap();
        assert_eq!(snap.pixel(1, 1), Some(RED));

        fb.resize(3, 1);
        assert_eq!(fb.width(), 3);
        assert_eq!(fb.pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn text_without_glyphs_measures_by_size_and_draws_nothing() {
        let mut fb = FramebufferSurface::new(10, 10);
        fb.set_font(FontSpec::new(10.0, Default::default(), None));
        assert_eq!(fb.measure_text("abc"), 15.0);
        fb.fill_text("abc", 0.0, 10.0);
        assert_eq!(fb.pixel(1, 5), Some(Color::TRANSPARENT));
    }
}
