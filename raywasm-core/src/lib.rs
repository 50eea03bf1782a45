//! raywasm-core: runs raylib games compiled to WASM against a 2D drawing surface.
//!
//! The guest is an unmodified raylib program built for `wasm32` with undefined symbols
//! left as imports. The host:
//! - compiles the module (binary `.wasm` or `.wat` text),
//! - satisfies its raylib / libc imports from module `"env"`,
//! - calls `main` once, then drives the frame callback the guest registers through
//!   `raylib_js_set_entry` once per display refresh.
//!
//! Unknown imports are still linked; they trap with `NOT IMPLEMENTED` when called, so a
//! game runs until it actually touches something missing.
//!
//! The ABI surface is defined in [`abi`].

pub mod abi;
pub mod assets;
pub mod config;
pub mod draw;
pub mod error;
pub mod input;
pub mod loader;
pub mod memory;
pub mod printf;
pub mod runtime;
pub mod scheduler;
pub mod surface;

pub use config::HostConfig;
pub use error::HostError;
pub use input::{InputEvent, InputHandle};
pub use scheduler::{Display, HeadlessDisplay, PacedDisplay, Phase, Runner, StopHandle};
pub use surface::{Color, FramebufferSurface, Image, PaintLog, PaintOp, RecordingSurface, Surface};
