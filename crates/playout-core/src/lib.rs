//! Playout Core Library
//!
//! Command execution layer of a multi-unit media playout controller.
//! Tokenized unit commands are validated, normalized and translated into
//! ordered playlist mutations or transport requests against the unit
//! contract. Decode and playback stay with the external engine.
//!
//! An in-memory reference engine lives in [`memory`] so the layer can be
//! driven end-to-end without a real decoder.

pub mod commands;
pub mod memory;
pub mod settings;
pub mod unit;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod test_support;
