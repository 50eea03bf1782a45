//! Guest module loading.
//!
//! A game may be shipped as a `.wasm` binary or as `.wat` text. The bytes are sniffed
//! rather than the file name: the `\0asm` magic selects the binary path, and text
//! beginning with `(` or a `;;` comment (after an optional UTF-8 BOM and whitespace)
//! is assembled with `wat` first.

use std::borrow::Cow;

use wasmtime::{Engine, Module};

const WASM_MAGIC: &[u8] = b"\0asm";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("not a wasm binary or wat text module")]
    UnrecognizedFormat,
    #[error("invalid wat: {0}")]
    WatParseFailed(#[source] wat::Error),
    #[error("module failed to compile: {0:#}")]
    CompileFailed(anyhow::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModuleFormat {
    Binary,
    Text,
}

pub fn compile_module(engine: &Engine, bytes: &[u8]) -> Result<Module, LoadError> {
    let format = sniff(bytes).ok_or(LoadError::UnrecognizedFormat)?;
    let wasm = to_binary(bytes, format)?;
    tracing::debug!(?format, len = wasm.len(), "compiling guest module");
    Module::new(engine, &wasm).map_err(LoadError::CompileFailed)
}

/// Binary bytes are borrowed unchanged; text is assembled.
pub fn to_binary(bytes: &[u8], format: ModuleFormat) -> Result<Cow<'_, [u8]>, LoadError> {
    match format {
        ModuleFormat::Binary => Ok(Cow::Borrowed(bytes)),
        ModuleFormat::Text => wat::parse_bytes(bytes).map_err(LoadError::WatParseFailed),
    }
}

pub fn sniff(bytes: &[u8]) -> Option<ModuleFormat> {
    if bytes.starts_with(WASM_MAGIC) {
        return Some(ModuleFormat::Binary);
    }
    let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = match text.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(start) => &text[start..],
        None => return None,
    };
    (text.starts_with(b"(") || text.starts_with(b";;")).then_some(ModuleFormat::Text)
}
