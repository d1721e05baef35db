//! WASM bindings for the text sync core
//!
//! JavaScript-friendly wrappers that exchange changesets and protocol
//! messages as JSON strings.

#[cfg(feature = "wasm")]
pub mod bindings;

#[cfg(feature = "wasm")]
pub mod utils;

// Re-export main types
#[cfg(feature = "wasm")]
pub use bindings::{WasmChangeset, WasmSession};
