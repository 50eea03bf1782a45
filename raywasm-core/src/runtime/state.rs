//! Per-session host state, owned by the wasmtime `Store`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasmtime::TypedFunc;

use crate::abi::LogLevel;
use crate::assets::Assets;
use crate::config::HostConfig;
use crate::input::{InputTracker, SharedInput};
use crate::scheduler::StopHandle;
use crate::surface::Surface;

pub struct HostState {
    pub surface: Box<dyn Surface>,
    pub input: SharedInput,
    pub assets: Assets,
    /// Seconds between the last two refreshes.
    pub dt: f64,
    pub target_fps: i32,
    /// Per-frame callback registered through `raylib_js_set_entry`.
    pub entry: Option<TypedFunc<(), ()>>,
    pub log_level: LogLevel,
    pub title: String,
    /// Extent used when the guest asks for a 0-sized window.
    pub viewport: (u32, u32),
    pub rng: StdRng,
    pub stop: StopHandle,
}

impl HostState {
    pub fn new(
        surface: Box<dyn Surface>,
        config: &HostConfig,
        viewport: (u32, u32),
        stop: StopHandle,
    ) -> Self {
        Self {
            surface,
            input: InputTracker::shared(),
            assets: Assets::new(&config.asset_root),
            dt: 0.0,
            target_fps: config.target_fps,
            entry: None,
            log_level: config.log_level,
            title: String::new(),
            viewport,
            rng: StdRng::from_entropy(),
            stop,
        }
    }

    /// `dt` capped at one target frame so a stall does not produce a huge step.
    pub fn frame_time(&self) -> f32 {
        if self.target_fps > 0 {
            self.dt.min(1.0 / self.target_fps as f64) as f32
        } else {
            self.dt as f32
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.rng = StdRng::seed_from_u64(seed as u64);
    }
}
