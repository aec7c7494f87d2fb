//! In-Memory Reference Engine
//!
//! A complete implementation of the unit contract that keeps playlists in
//! memory, so the command layer can be driven end-to-end without a decoder.

mod document;
mod probe;
mod registry;
mod unit;

pub use document::*;
pub use probe::*;
pub use registry::*;
pub use unit::*;
