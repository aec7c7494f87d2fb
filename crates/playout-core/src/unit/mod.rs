//! Unit Contract
//!
//! The operations the command layer consumes from the external playout
//! engine. A unit is an independently addressable playback slot with its
//! own playlist, transport state and property map. Implementations
//! serialize access internally, so every method takes `&self`.
//!
//! Handlers never cache indices across calls: a unit obtained from
//! [`UnitRegistry::resolve`] is only valid for the command being handled.

mod models;

pub use models::*;

use std::sync::Arc;

use crate::{ClipIndex, Frame, Speed, TrimError, UnitId, UnitResult};

/// Resolves unit ids to live units
pub trait UnitRegistry: Send + Sync {
    /// Returns the unit at `id`, or `None` if the slot is empty
    fn resolve(&self, id: UnitId) -> Option<Arc<dyn Unit>>;
}

/// Contract of a single playback unit
pub trait Unit: Send + Sync {
    /// Slot id of this unit
    fn id(&self) -> UnitId;

    // -------------------------------------------------------------------------
    // Playlist mutation
    // -------------------------------------------------------------------------

    /// Loads a clip; `flush` discards the current playlist first
    fn load(&self, resource: &str, in_point: Frame, out_point: Frame, flush: bool)
        -> UnitResult<()>;

    /// Pre-flight validation of a resource, without mutating the playlist
    fn check_clip(&self, resource: &str) -> UnitResult<()>;

    fn insert(
        &self,
        resource: &str,
        index: ClipIndex,
        in_point: Frame,
        out_point: Frame,
    ) -> UnitResult<()>;

    fn remove(&self, index: ClipIndex) -> UnitResult<()>;

    fn append(&self, resource: &str, in_point: Frame, out_point: Frame) -> UnitResult<()>;

    fn move_clip(&self, src: ClipIndex, dest: ClipIndex) -> UnitResult<()>;

    /// Removes entries that can no longer produce media
    fn clean(&self) -> UnitResult<()>;

    /// Removes everything but the current entry
    fn wipe(&self) -> UnitResult<()>;

    /// Removes every entry
    fn clear(&self) -> UnitResult<()>;

    /// Attaches an already-constructed service to the end of the playlist
    fn append_service(&self, service: &Service) -> UnitResult<()>;

    /// Rendering profile of the unit's active consumer
    fn profile(&self) -> UnitResult<Profile>;

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    fn play(&self, speed: Speed);

    fn terminate(&self);

    fn step(&self, frames: Frame);

    fn change_position(&self, clip: ClipIndex, position: Frame);

    // -------------------------------------------------------------------------
    // Trim
    // -------------------------------------------------------------------------

    fn set_clip_in(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError>;

    fn set_clip_out(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError>;

    /// Out point change applied while the clip may be on air; the playhead
    /// is left where it is
    fn set_clip_out_live(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError>;

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    fn status(&self) -> UnitResult<UnitStatus>;

    fn report_list(&self) -> UnitResult<PlaylistReport>;

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Applies a `name=value` assignment
    fn set_property(&self, name_value: &str) -> UnitResult<()>;

    fn property(&self, name: &str) -> Option<String>;

    fn delete_property(&self, name: &str);

    // -------------------------------------------------------------------------
    // Ownership transfer
    // -------------------------------------------------------------------------

    /// Detaches and returns the whole playlist, leaving this unit empty
    fn take_playlist(&self) -> UnitResult<Vec<PlaylistEntry>>;

    /// Replaces the playlist and positions at the first frame of clip 0
    fn replace_playlist(&self, entries: Vec<PlaylistEntry>) -> UnitResult<()>;

    /// Moves this unit's entire playlist into `into`
    fn transfer(&self, into: &dyn Unit) -> UnitResult<()> {
        let entries = self.take_playlist()?;
        into.replace_playlist(entries)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn current_clip_index(&self) -> ClipIndex;

    fn count(&self) -> usize;

    fn is_offline(&self) -> bool;

    /// True once playback has reached the end of the playlist
    fn has_terminated(&self) -> bool;
}

/// Builds services from inline documents (RCV)
pub trait ServiceFactory: Send + Sync {
    /// Instantiates a service from `document` using `profile`, or `None`
    /// if the engine cannot make sense of it
    fn from_document(&self, profile: &Profile, document: &str) -> Option<Service>;
}
