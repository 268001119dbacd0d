//! Host bindings.
//!
//! - `wasm`: `TechnicalsCalculator` class for JavaScript via wasm-bindgen (feature: `ffi-wasm`)
//!
//! The N-API addon lives in its own package (`technicals-node`).

#[cfg(feature = "ffi-wasm")]
pub mod wasm;
