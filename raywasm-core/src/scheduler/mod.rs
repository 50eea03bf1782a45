//! Frame scheduling and session lifecycle.
//!
//! A [`Runner`] moves through `Idle -> Starting -> Running -> Stopping -> Idle`. At most
//! one session exists at a time. Frames are cooperative: each tick waits for the
//! display's next refresh, runs the guest's per-frame callback to completion, then rolls
//! the input state over. A stop request is only observed at the top of a tick.

pub mod display;

#[cfg(test)]
mod tests;

pub use display::{Display, HeadlessDisplay, PacedDisplay, SurfaceKind};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};
use wasmtime::Engine;

use crate::config::HostConfig;
use crate::error::HostError;
use crate::input::{self, InputHandle};
use crate::loader;
use crate::runtime::{self, GuestInstance, HostState};
use crate::surface::Image;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Requests a stop from anywhere. The flag is cleared when the session is torn down.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Session {
    guest: GuestInstance,
    /// Timestamp of the previous refresh, in milliseconds.
    previous: f64,
}

pub struct Runner {
    config: HostConfig,
    display: Box<dyn Display>,
    engine: Engine,
    phase: Phase,
    session: Option<Session>,
    stop: StopHandle,
}

impl Runner {
    pub fn new(config: HostConfig, display: impl Display + 'static) -> Result<Self, HostError> {
        Ok(Self {
            config,
            display: Box::new(display),
            engine: runtime::new_engine()?,
            phase: Phase::Idle,
            session: None,
            stop: StopHandle::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Ask the running session to stop at the top of the next tick.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Listener-side handle for the current session's input. It detaches when the
    /// session ends.
    pub fn input_handle(&self) -> Option<InputHandle> {
        self.session
            .as_ref()
            .map(|s| InputHandle::attach(&s.guest.state().input))
    }

    /// Window title set by the guest.
    pub fn title(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.guest.state().title.as_str())
    }

    pub fn snapshot(&self) -> Option<Image> {
        self.session
            .as_ref()
            .and_then(|s| s.guest.state().surface.snapshot())
    }

    /// Wait for every outstanding asset load of the current session.
    pub fn settle_assets(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.guest.state_mut().assets.settle();
        }
    }

    pub fn start(&mut self, wasm_path: impl AsRef<Path>, target: &str) -> Result<(), HostError> {
        let path = wasm_path.as_ref();
        self.ensure_idle()?;
        let bytes = std::fs::read(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.start_bytes(&bytes, target)
    }

    pub fn start_bytes(&mut self, bytes: &[u8], target: &str) -> Result<(), HostError> {
        self.ensure_idle()?;
        self.phase = Phase::Starting;
        match self.open_session(bytes, target) {
            Ok(session) => {
                self.session = Some(session);
                self.phase = Phase::Running;
                info!(%target, "session running");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, %target, "session failed to start");
                self.stop.reset();
                self.phase = Phase::Idle;
                Err(err)
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), HostError> {
        if self.session.is_some() || self.phase != Phase::Idle {
            error!("The game is already running. Please stop() it first.");
            return Err(HostError::AlreadyRunning);
        }
        Ok(())
    }

    fn open_session(&mut self, bytes: &[u8], target: &str) -> Result<Session, HostError> {
        let surface = self
            .display
            .acquire_surface(target)
            .ok_or_else(|| HostError::SurfaceUnavailable(target.to_owned()))?;
        let module = loader::compile_module(&self.engine, bytes)?;

        let mut state = HostState::new(
            surface,
            &self.config,
            self.display.viewport(),
            self.stop.clone(),
        );
        if let Some(font) = &self.config.default_font {
            if let Err(err) = state.assets.set_default_font(font) {
                warn!(error = %err, "default font unavailable, text will not be rasterized");
            }
        }

        let mut guest = GuestInstance::instantiate(&self.engine, &module, state)?;
        guest.call_main()?;
        let previous = self.display.next_refresh();
        Ok(Session { guest, previous })
    }

    /// Run one frame, or finish a requested stop. Returns the phase after the tick.
    pub fn tick(&mut self) -> Result<Phase, HostError> {
        if self.session.is_none() {
            return Err(HostError::NotRunning);
        }
        if self.stop.is_requested() {
            self.phase = Phase::Stopping;
            self.teardown(true);
            return Ok(self.phase);
        }

        let now = self.display.next_refresh();
        let Some(session) = self.session.as_mut() else {
            return Err(HostError::NotRunning);
        };
        let state = session.guest.state_mut();
        state.assets.poll();
        state.dt = (now - session.previous) / 1000.0;
        session.previous = now;

        if let Err(err) = session.guest.call_entry() {
            error!(error = %err, "frame failed, stopping session");
            self.teardown(false);
            return Err(err);
        }
        input::lock(&session.guest.state().input).end_frame();
        Ok(self.phase)
    }

    /// Tick until the session ends.
    pub fn run(&mut self) -> Result<(), HostError> {
        while self.phase == Phase::Running {
            self.tick()?;
        }
        Ok(())
    }

    /// Tick at most `frames` times; returns how many frames were rendered.
    pub fn run_frames(&mut self, frames: usize) -> Result<usize, HostError> {
        let mut rendered = 0;
        while rendered < frames && self.phase == Phase::Running {
            if self.tick()? == Phase::Running {
                rendered += 1;
            }
        }
        Ok(rendered)
    }

    /// Drop the session. With `clear`, the surface is wiped first.
    fn teardown(&mut self, clear: bool) {
        if let Some(mut session) = self.session.take() {
            if clear {
                let surface = session.guest.state_mut().surface.as_mut();
                let (w, h) = (surface.width() as f32, surface.height() as f32);
                surface.clear_rect(0.0, 0.0, w, h);
            }
            info!("session stopped");
        }
        self.stop.reset();
        self.phase = Phase::Idle;
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.teardown(false);
        }
    }
}
