//! Wasmtime embedding.
//!
//! Responsibilities:
//! - Create the `Engine` with the proposals raylib builds rely on.
//! - Link host imports (see [`imports`]) and instantiate a compiled module.
//! - Call the guest's `main` and its registered per-frame callback, turning traps back
//!   into [`HostError`]s.

pub mod imports;
pub mod state;

pub use state::HostState;

use wasmtime::{Engine, Extern, Instance, Linker, Module, Store, Val, ValType};

use crate::abi::guest_exports;
use crate::error::HostError;

pub fn new_engine() -> Result<Engine, HostError> {
    let mut cfg = wasmtime::Config::new();
    cfg.wasm_multi_value(true);
    cfg.wasm_bulk_memory(true);
    cfg.wasm_reference_types(true);
    cfg.wasm_simd(true);
    cfg.wasm_tail_call(true);
    Engine::new(&cfg).map_err(HostError::Runtime)
}

/// One instantiated guest and the store that owns its host state.
pub struct GuestInstance {
    store: Store<HostState>,
    instance: Instance,
}

impl GuestInstance {
    pub fn instantiate(
        engine: &Engine,
        module: &Module,
        state: HostState,
    ) -> Result<Self, HostError> {
        let mut store = Store::new(engine, state);
        let mut linker = Linker::new(engine);
        imports::link(&mut linker, module)?;

        let instance = linker
            .instantiate(&mut store, module)
            .map_err(HostError::from_trap)?;

        if instance
            .get_export(&mut store, guest_exports::MEMORY)
            .and_then(Extern::into_memory)
            .is_none()
        {
            return Err(HostError::MissingExport(guest_exports::MEMORY));
        }

        Ok(Self { store, instance })
    }

    pub fn state(&self) -> &HostState {
        self.store.data()
    }

    pub fn state_mut(&mut self) -> &mut HostState {
        self.store.data_mut()
    }

    /// Run `main` to completion. Any parameters it declares receive zero.
    pub fn call_main(&mut self) -> Result<(), HostError> {
        let main = self
            .instance
            .get_func(&mut self.store, guest_exports::MAIN)
            .ok_or(HostError::MissingExport(guest_exports::MAIN))?;
        let ty = main.ty(&self.store);
        let params = ty.params().map(zero).collect::<Result<Vec<_>, _>>()?;
        let mut results = ty.results().map(zero).collect::<Result<Vec<_>, _>>()?;
        main.call(&mut self.store, &params, &mut results)
            .map_err(HostError::from_trap)
    }

    /// Run the registered per-frame callback once.
    pub fn call_entry(&mut self) -> Result<(), HostError> {
        let entry = self.store.data().entry.clone().ok_or(HostError::NoFrameCallback)?;
        entry.call(&mut self.store, ()).map_err(HostError::from_trap)
    }
}

fn zero(ty: ValType) -> Result<Val, HostError> {
    Ok(match ty {
        ValType::I32 => Val::I32(0),
        ValType::I64 => Val::I64(0),
        ValType::F32 => Val::F32(0),
        ValType::F64 => Val::F64(0),
        other => {
            return Err(HostError::Runtime(anyhow::anyhow!(
                "`main` uses unsupported value type {other}"
            )));
        }
    })
}
