//! Playout Core Type Definitions
//!
//! Fundamental aliases and constants shared by the command layer and the
//! unit contract.

// =============================================================================
// ID Types
// =============================================================================

/// Numeric unit identifier in `[0, MAX_UNITS)`
pub type UnitId = u32;

/// Number of unit slots a registry exposes
pub const MAX_UNITS: UnitId = 16;

// =============================================================================
// Playlist Types
// =============================================================================

/// Playlist index (0-based). Signed because callers may address clips
/// relative to the current one and the engine is the judge of validity.
pub type ClipIndex = i32;

/// Frame position or frame count
pub type Frame = i32;

/// Trim boundary meaning "unspecified, use the whole media"
pub const UNSPECIFIED_POINT: Frame = -1;

// =============================================================================
// Transport Constants
// =============================================================================

/// Playback speed in thousandths of normal speed
pub type Speed = i32;

/// Normal forward playback
pub const NORMAL_SPEED: Speed = 1000;

/// Fast-forward speed
pub const FAST_FORWARD_SPEED: Speed = 2000;

/// Rewind speed
pub const REWIND_SPEED: Speed = -2000;

/// Maximum length of a resolved resource locator, terminator included
pub const MAX_PATH_LEN: usize = 1024;
