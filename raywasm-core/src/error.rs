//! Crate-wide error type.
//!
//! Host imports return `wasmtime::Result`; a [`HostError`] raised inside one of them
//! travels through the guest as a trap and is recovered by the scheduler.

use std::path::PathBuf;

use crate::loader::LoadError;
use crate::memory::MemoryError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("the game is already running, stop() it first")]
    AlreadyRunning,

    #[error("no session is running")]
    NotRunning,

    #[error("could not acquire a 2D drawing surface for target `{0}`")]
    SurfaceUnavailable(String),

    /// A guest called an import the host does not implement.
    #[error("NOT IMPLEMENTED: {name} {args}")]
    Unimplemented { name: String, args: String },

    /// The guest logged at `LOG_FATAL`.
    #[error("FATAL: {0}")]
    FatalLog(String),

    #[error("guest does not export `{0}`")]
    MissingExport(&'static str),

    #[error("function table slot {0} does not hold a `() -> ()` function")]
    BadTableIndex(u32),

    #[error("the guest never registered a per-frame entry point")]
    NoFrameCallback,

    #[error("{kind} handle {index} was never issued")]
    UnknownHandle { kind: &'static str, index: u32 },

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("guest execution failed: {0:#}")]
    Guest(anyhow::Error),

    #[error("wasm runtime error: {0:#}")]
    Runtime(anyhow::Error),
}

impl HostError {
    /// Recover a `HostError` raised by a host import from a guest trap, or wrap the trap.
    pub fn from_trap(err: anyhow::Error) -> Self {
        match err.downcast::<HostError>() {
            Ok(host) => host,
            Err(other) => HostError::Guest(other),
        }
    }
}
