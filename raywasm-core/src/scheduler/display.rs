//! Displays: where surfaces come from and what paces the frames.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::HostConfig;
use crate::memory::Vector2;
use crate::surface::{FramebufferSurface, PaintLog, RecordingSurface, Surface};

pub trait Display {
    /// A fresh 2D surface for the element named `target`, or `None` if there is none.
    fn acquire_surface(&mut self, target: &str) -> Option<Box<dyn Surface>>;
    /// Block until the next refresh and return its timestamp in milliseconds.
    fn next_refresh(&mut self) -> f64;
    /// Extent a guest gets when it asks for a 0-sized window.
    fn viewport(&self) -> (u32, u32);
}

/// What kind of surface a display hands out.
#[derive(Clone, Debug)]
pub enum SurfaceKind {
    Framebuffer,
    /// Recording surfaces that all append to this log.
    Recording(PaintLog),
}

impl SurfaceKind {
    fn build(&self, width: u32, height: u32, origin: Vector2) -> Box<dyn Surface> {
        match self {
            SurfaceKind::Framebuffer => {
                Box::new(FramebufferSurface::new(width, height).with_origin(origin))
            }
            SurfaceKind::Recording(log) => {
                Box::new(RecordingSurface::new(width, height, log.clone()).with_origin(origin))
            }
        }
    }
}

/// Fixed-step display that never sleeps. Timestamps advance by one interval per refresh.
#[derive(Clone, Debug)]
pub struct HeadlessDisplay {
    target: String,
    viewport: (u32, u32),
    origin: Vector2,
    interval_ms: f64,
    now_ms: f64,
    kind: SurfaceKind,
}

impl HeadlessDisplay {
    pub fn new(target: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            target: target.into(),
            viewport: (width, height),
            origin: Vector2::default(),
            interval_ms: HostConfig::default().frame_interval_ms(),
            now_ms: 0.0,
            kind: SurfaceKind::Framebuffer,
        }
    }

    pub fn recording(mut self, log: PaintLog) -> Self {
        self.kind = SurfaceKind::Recording(log);
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: f64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Place the surface inside the host's pointer coordinate space.
    pub fn with_origin(mut self, origin: Vector2) -> Self {
        self.origin = origin;
        self
    }
}

impl Display for HeadlessDisplay {
    fn acquire_surface(&mut self, target: &str) -> Option<Box<dyn Surface>> {
        (target == self.target).then(|| {
            let (w, h) = self.viewport;
            self.kind.build(w, h, self.origin)
        })
    }

    fn next_refresh(&mut self) -> f64 {
        self.now_ms += self.interval_ms;
        self.now_ms
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

/// Wall-clock display: sleeps until the next refresh boundary.
#[derive(Debug)]
pub struct PacedDisplay {
    inner: HeadlessDisplay,
    started: Instant,
    interval: Duration,
    next: Duration,
}

impl PacedDisplay {
    pub fn new(target: impl Into<String>, width: u32, height: u32, refresh_hz: f64) -> Self {
        let interval = Duration::from_secs_f64(1.0 / refresh_hz.max(1.0));
        Self {
            inner: HeadlessDisplay::new(target, width, height),
            started: Instant::now(),
            interval,
            next: Duration::ZERO,
        }
    }
}

impl Display for PacedDisplay {
    fn acquire_surface(&mut self, target: &str) -> Option<Box<dyn Surface>> {
        self.inner.acquire_surface(target)
    }

    fn next_refresh(&mut self) -> f64 {
        let elapsed = self.started.elapsed();
        if elapsed < self.next {
            thread::sleep(self.next - elapsed);
        }
        // Skip boundaries that already passed rather than bursting to catch up.
        let now = self.started.elapsed();
        while self.next <= now {
            self.next += self.interval;
        }
        now.as_secs_f64() * 1000.0
    }

    fn viewport(&self) -> (u32, u32) {
        self.inner.viewport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_only_serves_its_target() {
        let mut display = HeadlessDisplay::new("canvas", 320, 200);
        assert!(display.acquire_surface("other").is_none());
        let surface = display.acquire_surface("canvas").unwrap();
        assert_eq!((surface.width(), surface.height()), (320, 200));
        assert!(surface.snapshot().is_some());
    }

    #[test]
    fn headless_timestamps_step_by_the_interval() {
        let mut display = HeadlessDisplay::new("canvas", 1, 1).with_interval_ms(10.0);
        assert_eq!(display.next_refresh(), 10.0);
        assert_eq!(display.next_refresh(), 20.0);
    }

    #[test]
    fn recording_display_shares_its_log_and_origin() {
        let log = PaintLog::new();
        let origin = Vector2 { x: 8.0, y: 16.0 };
        let mut display = HeadlessDisplay::new("game", 10, 10)
            .recording(log.clone())
            .with_origin(origin);
        let mut surface = display.acquire_surface("game").unwrap();
        surface.begin_path();
        assert_eq!(log.len(), 1);
        assert_eq!(surface.origin(), origin);
        assert!(surface.snapshot().is_none());
    }

    #[test]
    fn paced_display_is_monotonic() {
        let mut display = PacedDisplay::new("canvas", 1, 1, 1000.0);
        let a = display.next_refresh();
        let b = display.next_refresh();
        assert!(b > a);
    }
}
