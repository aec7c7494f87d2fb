//! Unit Model Definitions
//!
//! Playlist entries, services, profiles and the status/list reports a
//! unit hands back, with their MVCP text serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClipIndex, Frame, Speed, UnitId};

// =============================================================================
// Playlist Entry
// =============================================================================

/// One playlist entry: a resource plus its trim boundaries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    /// Fully-qualified resource locator
    pub resource: String,
    /// First frame played
    pub in_point: Frame,
    /// Last frame played (inclusive)
    pub out_point: Frame,
    /// Length of the underlying media in frames
    pub length: Frame,
    /// Frame rate of the media
    pub fps: f64,
}

impl PlaylistEntry {
    /// Creates an entry covering the whole media
    pub fn new(resource: &str, length: Frame, fps: f64) -> Self {
        Self {
            resource: resource.to_string(),
            in_point: 0,
            out_point: (length - 1).max(0),
            length,
            fps,
        }
    }

    /// Applies caller trim points; negative values keep the full media
    pub fn with_points(mut self, in_point: Frame, out_point: Frame) -> Self {
        if in_point >= 0 {
            self.in_point = in_point.min(self.out_point);
        }
        if out_point >= 0 {
            self.out_point = out_point.clamp(self.in_point, (self.length - 1).max(0));
        }
        self
    }

    /// Number of frames between in and out points
    pub fn playtime(&self) -> Frame {
        self.out_point - self.in_point + 1
    }
}

// =============================================================================
// Service / Profile
// =============================================================================

/// Rendering profile of a unit's consumer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub fps: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "atsc_1080p_25".to_string(),
            fps: 25.0,
        }
    }
}

/// An already-constructed media service ready to be attached to a unit
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    /// Human readable label
    pub label: String,
    /// Entries the service contributes to a playlist
    pub entries: Vec<PlaylistEntry>,
}

impl Service {
    pub fn new(label: &str, entries: Vec<PlaylistEntry>) -> Self {
        Self {
            label: label.to_string(),
            entries,
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Transport state of a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnitState {
    #[default]
    Undefined,
    Offline,
    NotLoaded,
    Stopped,
    Playing,
    Paused,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Offline => "offline",
            Self::NotLoaded => "not_loaded",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

/// Snapshot of a unit's transport state
#[derive(Clone, Debug, PartialEq, Default)]
pub struct UnitStatus {
    pub unit: UnitId,
    pub state: UnitState,
    pub clip: String,
    pub position: Frame,
    pub speed: Speed,
    pub fps: f64,
    pub in_point: Frame,
    pub out_point: Frame,
    pub length: Frame,
    pub tail_clip: String,
    pub tail_position: Frame,
    pub tail_in: Frame,
    pub tail_out: Frame,
    pub tail_length: Frame,
    pub seek_flag: bool,
    pub generation: u64,
    pub clip_index: ClipIndex,
}

impl fmt::Display for UnitStatus {
    /// Single MVCP status line, newline terminated
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} \"{}\" {} {} {:.2} {} {} {} \"{}\" {} {} {} {} {} {} {}",
            self.unit,
            self.state.as_str(),
            self.clip,
            self.position,
            self.speed,
            self.fps,
            self.in_point,
            self.out_point,
            self.length,
            self.tail_clip,
            self.tail_position,
            self.tail_in,
            self.tail_out,
            self.tail_length,
            u8::from(self.seek_flag),
            self.generation,
            self.clip_index
        )
    }
}

// =============================================================================
// Playlist Report
// =============================================================================

/// Playlist listing returned by LIST
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PlaylistReport {
    /// Incremented on every playlist mutation
    pub generation: u64,
    pub entries: Vec<PlaylistEntry>,
}

impl fmt::Display for PlaylistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.generation)?;
        for (index, entry) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "{} \"{}\" {} {} {} {} {:.2}",
                index,
                entry.resource,
                entry.in_point,
                entry.out_point,
                entry.playtime(),
                entry.length,
                entry.fps
            )?;
        }
        Ok(())
    }
}
