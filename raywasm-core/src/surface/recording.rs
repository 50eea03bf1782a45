use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{FontFace, FontSpec, Image, Paint, Surface};
use crate::memory::Vector2;

/// One call made on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    Resize { width: u32, height: u32 },
    SetFill(Paint),
    SetStroke(Paint),
    SetLineWidth(f32),
    SetFont { size: f32, face: FontFace },
    BeginPath,
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    Arc { cx: f32, cy: f32, radius: f32, start: f32, end: f32 },
    Fill,
    Stroke,
    FillRect { x: f32, y: f32, w: f32, h: f32 },
    StrokeRect { x: f32, y: f32, w: f32, h: f32 },
    ClearRect { x: f32, y: f32, w: f32, h: f32 },
    FillText { text: String, x: f32, y: f32 },
    DrawImage { width: u32, height: u32, x: f32, y: f32 },
}

/// Shared, append-only op list. Clone it before handing the surface away to read it later.
#[derive(Clone, Debug, Default)]
pub struct PaintLog(Arc<Mutex<Vec<PaintOp>>>);

impl PaintLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PaintOp>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, op: PaintOp) {
        self.lock().push(op);
    }

    pub fn ops(&self) -> Vec<PaintOp> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<PaintOp> {
        std::mem::take(&mut *self.lock())
    }
}

/// A surface that draws nothing and remembers every call.
///
/// Text is measured as half the font size per character, which keeps layout-dependent
/// guest code deterministic without a font.
#[derive(Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    origin: Vector2,
    line_width: f32,
    font_size: f32,
    log: PaintLog,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32, log: PaintLog) -> Self {
        Self {
            width,
            height,
            origin: Vector2::default(),
            line_width: 1.0,
            font_size: 10.0,
            log,
        }
    }

    pub fn with_origin(mut self, origin: Vector2) -> Self {
        self.origin = origin;
        self
    }

    pub fn log(&self) -> &PaintLog {
        &self.log
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.log.push(PaintOp::Resize { width, height });
    }

    fn origin(&self) -> Vector2 {
        self.origin
    }

    fn set_fill(&mut self, paint: Paint) {
        self.log.push(PaintOp::SetFill(paint));
    }

    fn set_stroke(&mut self, paint: Paint) {
        self.log.push(PaintOp::SetStroke(paint));
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
        self.log.push(PaintOp::SetLineWidth(width));
    }

    fn line_width(&self) -> f32 {
        self.line_width
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font_size = font.size;
        self.log.push(PaintOp::SetFont {
            size: font.size,
            face: font.face,
        });
    }

    fn begin_path(&mut self) {
        self.log.push(PaintOp::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.log.push(PaintOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.log.push(PaintOp::LineTo { x, y });
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        self.log.push(PaintOp::Arc {
            cx,
            cy,
            radius,
            start,
            end,
        });
    }

    fn fill(&mut self) {
        self.log.push(PaintOp::Fill);
    }

    fn stroke(&mut self) {
        self.log.push(PaintOp::Stroke);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.log.push(PaintOp::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.log.push(PaintOp::StrokeRect { x, y, w, h });
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.log.push(PaintOp::ClearRect { x, y, w, h });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.log.push(PaintOp::FillText {
            text: text.to_owned(),
            x,
            y,
        });
    }

    fn measure_text(&self, text: &str) -> f32 {
        0.5 * self.font_size * text.chars().count() as f32
    }

    fn draw_image(&mut self, image: &Image, x: f32, y: f32) {
        self.log.push(PaintOp::DrawImage {
            width: image.width,
            height: image.height,
            x,
            y,
        });
    }

    fn snapshot(&self) -> Option<Image> {
        None
    }
}
