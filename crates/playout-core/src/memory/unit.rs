//! In-Memory Unit
//!
//! A [`Unit`] that keeps its playlist and transport state in memory and
//! opens resources through a [`MediaProbe`]. Positions are frames within
//! the current clip's media, bounded by the clip's in and out points.

use std::collections::BTreeMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::probe::MediaProbe;
use crate::unit::{
    PlaylistEntry, PlaylistReport, Profile, Service, Unit, UnitState, UnitStatus,
};
use crate::{
    ClipIndex, Frame, Speed, TrimError, UnitError, UnitId, UnitResult, NORMAL_SPEED,
};

fn to_index(slot: usize) -> ClipIndex {
    ClipIndex::try_from(slot).unwrap_or(ClipIndex::MAX)
}

fn to_frame(frames: i64) -> Frame {
    Frame::try_from(frames).unwrap_or(if frames < 0 { Frame::MIN } else { Frame::MAX })
}

// =============================================================================
// Playback State
// =============================================================================

#[derive(Debug)]
struct Playback {
    playlist: Vec<PlaylistEntry>,
    clip: usize,
    position: Frame,
    speed: Speed,
    stopped: bool,
    terminated: bool,
    generation: u64,
    properties: BTreeMap<String, String>,
}

impl Playback {
    fn new() -> Self {
        Self {
            playlist: Vec::new(),
            clip: 0,
            position: 0,
            speed: 0,
            stopped: true,
            terminated: false,
            generation: 0,
            properties: BTreeMap::new(),
        }
    }

    fn slot(&self, index: ClipIndex) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&slot| slot < self.playlist.len())
    }

    fn current(&self) -> Option<&PlaylistEntry> {
        self.playlist.get(self.clip)
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    /// Positions at `offset` frames past the in point of `clip`, clamped
    fn seek(&mut self, clip: ClipIndex, offset: Frame) {
        self.terminated = false;
        let Some(last) = self.playlist.len().checked_sub(1) else {
            self.clip = 0;
            self.position = 0;
            return;
        };
        self.clip = usize::try_from(clip.max(0)).unwrap_or(0).min(last);
        let entry = &self.playlist[self.clip];
        self.position = entry.in_point + offset.clamp(0, entry.playtime() - 1);
    }

    /// Frame offset of the playhead from the start of the playlist.
    /// Playlist-wide offsets are kept in `i64`; the sum of clip playtimes
    /// can exceed the frame range.
    fn absolute(&self) -> i64 {
        let before: i64 = self.playlist[..self.clip.min(self.playlist.len())]
            .iter()
            .map(|entry| i64::from(entry.playtime()))
            .sum();
        let into = self
            .current()
            .map_or(0, |e| i64::from(self.position) - i64::from(e.in_point));
        before + into
    }

    fn total(&self) -> i64 {
        self.playlist
            .iter()
            .map(|entry| i64::from(entry.playtime()))
            .sum()
    }

    /// Moves the playhead by `frames` across clip boundaries. Running off
    /// the end parks on the last frame and marks the unit terminated.
    fn advance(&mut self, frames: Frame) {
        let total = self.total();
        if total == 0 {
            return;
        }
        let target = self.absolute() + i64::from(frames);
        let ended = target >= total;

        let mut remaining = target.clamp(0, total - 1);
        for (slot, entry) in self.playlist.iter().enumerate() {
            let playtime = i64::from(entry.playtime());
            if remaining < playtime {
                self.clip = slot;
                self.position = to_frame(i64::from(entry.in_point) + remaining);
                break;
            }
            remaining -= playtime;
        }
        self.terminated = ended;
    }

    fn insert_entry(&mut self, index: ClipIndex, entry: PlaylistEntry) {
        let was_empty = self.playlist.is_empty();
        match usize::try_from(index) {
            Ok(slot) if slot <= self.playlist.len() => {
                if !was_empty && slot <= self.clip {
                    self.clip += 1;
                }
                self.playlist.insert(slot, entry);
            }
            _ => self.playlist.push(entry),
        }
        if was_empty {
            self.seek(0, 0);
        }
        self.touch();
    }

    fn remove_entry(&mut self, slot: usize) -> PlaylistEntry {
        let entry = self.playlist.remove(slot);
        if slot < self.clip {
            self.clip -= 1;
        } else if slot == self.clip {
            self.seek(to_index(slot), 0);
        }
        entry
    }
}

// =============================================================================
// Memory Unit
// =============================================================================

/// Playback unit backed by in-memory state
pub struct MemoryUnit {
    id: UnitId,
    profile: Profile,
    probe: Arc<dyn MediaProbe>,
    offline: AtomicBool,
    state: Mutex<Playback>,
}

impl MemoryUnit {
    pub fn new(id: UnitId, profile: Profile, probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            id,
            profile,
            probe,
            offline: AtomicBool::new(false),
            state: Mutex::new(Playback::new()),
        }
    }

    /// Detaches or reattaches the unit's consumer
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Runs playback for `frames` frames at the current speed
    pub fn tick(&self, frames: Frame) {
        let mut state = self.state();
        if state.stopped || state.speed == 0 {
            return;
        }
        let distance = i64::from(frames) * i64::from(state.speed) / i64::from(NORMAL_SPEED);
        state.advance(to_frame(distance));
        if state.terminated {
            state.speed = 0;
        }
    }

    /// Resources of the playlist in order
    pub fn resources(&self) -> Vec<String> {
        self.state()
            .playlist
            .iter()
            .map(|entry| entry.resource.clone())
            .collect()
    }

    /// Current clip and frame position
    pub fn position(&self) -> (ClipIndex, Frame) {
        let state = self.state();
        (to_index(state.clip), state.position)
    }

    pub fn speed(&self) -> Speed {
        self.state().speed
    }

    fn state(&self) -> MutexGuard<'_, Playback> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, resource: &str, in_point: Frame, out_point: Frame) -> UnitResult<PlaylistEntry> {
        let info = self
            .probe
            .probe(resource)
            .ok_or_else(|| UnitError::ResourceUnavailable(resource.to_string()))?;
        Ok(PlaylistEntry::new(resource, info.length, info.fps).with_points(in_point, out_point))
    }

    fn trim(
        &self,
        clip: ClipIndex,
        apply: impl FnOnce(&mut PlaylistEntry) -> Result<(), TrimError>,
    ) -> Result<usize, TrimError> {
        let mut state = self.state();
        let slot = state.slot(clip).ok_or(TrimError::NotApplicable)?;
        apply(&mut state.playlist[slot])?;
        state.touch();
        Ok(slot)
    }

    fn trim_out(&self, clip: ClipIndex, position: Frame) -> Result<usize, TrimError> {
        self.trim(clip, |entry| {
            if position < entry.in_point || position >= entry.length {
                return Err(TrimError::OutOfRange);
            }
            entry.out_point = position;
            Ok(())
        })
    }
}

impl Unit for MemoryUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn load(&self, resource: &str, in_point: Frame, out_point: Frame, flush: bool) -> UnitResult<()> {
        let entry = self.open(resource, in_point, out_point)?;
        let mut state = self.state();
        if flush {
            state.playlist = vec![entry];
            state.seek(0, 0);
            state.touch();
        } else {
            state.insert_entry(-1, entry);
        }
        debug!(unit = self.id, resource, flush, "Loaded");
        Ok(())
    }

    fn check_clip(&self, resource: &str) -> UnitResult<()> {
        self.open(resource, -1, -1).map(|_| ())
    }

    fn insert(
        &self,
        resource: &str,
        index: ClipIndex,
        in_point: Frame,
        out_point: Frame,
    ) -> UnitResult<()> {
        let entry = self.open(resource, in_point, out_point)?;
        self.state().insert_entry(index, entry);
        Ok(())
    }

    fn remove(&self, index: ClipIndex) -> UnitResult<()> {
        let mut state = self.state();
        let slot = state.slot(index).ok_or(UnitError::IndexOutOfRange(index))?;
        state.remove_entry(slot);
        state.touch();
        Ok(())
    }

    fn append(&self, resource: &str, in_point: Frame, out_point: Frame) -> UnitResult<()> {
        let entry = self.open(resource, in_point, out_point)?;
        self.state().insert_entry(-1, entry);
        Ok(())
    }

    fn move_clip(&self, src: ClipIndex, dest: ClipIndex) -> UnitResult<()> {
        let mut state = self.state();
        let from = state.slot(src).ok_or(UnitError::IndexOutOfRange(src))?;
        let to = state.slot(dest).ok_or(UnitError::IndexOutOfRange(dest))?;
        if from == to {
            return Ok(());
        }

        let entry = state.playlist.remove(from);
        state.playlist.insert(to, entry);
        let current = state.clip;
        state.clip = if current == from {
            to
        } else if from < current && to >= current {
            current - 1
        } else if from > current && to <= current {
            current + 1
        } else {
            current
        };
        state.touch();
        Ok(())
    }

    fn clean(&self) -> UnitResult<()> {
        let mut state = self.state();
        let current = state.clip;
        let mut kept_before = 0;
        let mut current_kept = false;

        let entries = mem::take(&mut state.playlist);
        for (slot, entry) in entries.into_iter().enumerate() {
            if self.probe.probe(&entry.resource).is_none() {
                debug!(unit = self.id, resource = %entry.resource, "Cleaned entry");
                continue;
            }
            if slot < current {
                kept_before += 1;
            }
            current_kept |= slot == current;
            state.playlist.push(entry);
        }

        if current_kept {
            state.clip = kept_before;
        } else {
            state.seek(to_index(kept_before), 0);
        }
        state.touch();
        Ok(())
    }

    fn wipe(&self) -> UnitResult<()> {
        let mut state = self.state();
        if let Some(current) = state.current().cloned() {
            state.playlist = vec![current];
            state.clip = 0;
        }
        state.touch();
        Ok(())
    }

    fn clear(&self) -> UnitResult<()> {
        let mut state = self.state();
        state.playlist.clear();
        state.seek(0, 0);
        state.touch();
        Ok(())
    }

    fn append_service(&self, service: &Service) -> UnitResult<()> {
        if service.entries.is_empty() {
            return Err(UnitError::ResourceUnavailable(service.label.clone()));
        }
        let mut state = self.state();
        for entry in &service.entries {
            state.insert_entry(-1, entry.clone());
        }
        Ok(())
    }

    fn profile(&self) -> UnitResult<Profile> {
        if self.is_offline() {
            return Err(UnitError::NoConsumer(self.id));
        }
        Ok(self.profile.clone())
    }

    fn play(&self, speed: Speed) {
        let mut state = self.state();
        state.stopped = false;
        state.speed = speed;
    }

    fn terminate(&self) {
        let mut state = self.state();
        state.stopped = true;
        state.speed = 0;
    }

    fn step(&self, frames: Frame) {
        self.state().advance(frames);
    }

    fn change_position(&self, clip: ClipIndex, position: Frame) {
        self.state().seek(clip, position);
    }

    fn set_clip_in(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        let slot = self.trim(clip, |entry| {
            if position < 0 || position > entry.out_point {
                return Err(TrimError::OutOfRange);
            }
            entry.in_point = position;
            Ok(())
        })?;
        let mut state = self.state();
        if state.clip == slot && state.position < position {
            state.position = position;
        }
        Ok(())
    }

    fn set_clip_out(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        let slot = self.trim_out(clip, position)?;
        let mut state = self.state();
        if state.clip == slot && state.position > position {
            state.position = position;
        }
        Ok(())
    }

    fn set_clip_out_live(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        self.trim_out(clip, position).map(|_| ())
    }

    fn status(&self) -> UnitResult<UnitStatus> {
        let state = self.state();
        let unit_state = if self.is_offline() {
            UnitState::Offline
        } else if state.playlist.is_empty() {
            UnitState::NotLoaded
        } else if state.stopped {
            UnitState::Stopped
        } else if state.speed == 0 {
            UnitState::Paused
        } else {
            UnitState::Playing
        };

        let mut status = UnitStatus {
            unit: self.id,
            state: unit_state,
            position: state.position,
            speed: state.speed,
            fps: self.profile.fps,
            generation: state.generation,
            clip_index: to_index(state.clip),
            ..Default::default()
        };
        if let Some(entry) = state.current() {
            status.clip = entry.resource.clone();
            status.fps = entry.fps;
            status.in_point = entry.in_point;
            status.out_point = entry.out_point;
            status.length = entry.length;
        }
        if let Some(tail) = state.playlist.last() {
            status.tail_clip = tail.resource.clone();
            status.tail_position = tail.in_point;
            status.tail_in = tail.in_point;
            status.tail_out = tail.out_point;
            status.tail_length = tail.length;
        }
        Ok(status)
    }

    fn report_list(&self) -> UnitResult<PlaylistReport> {
        let state = self.state();
        Ok(PlaylistReport {
            generation: state.generation,
            entries: state.playlist.clone(),
        })
    }

    fn set_property(&self, name_value: &str) -> UnitResult<()> {
        let (name, value) = name_value
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| UnitError::InvalidProperty(name_value.to_string()))?;
        self.state()
            .properties
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn property(&self, name: &str) -> Option<String> {
        self.state().properties.get(name).cloned()
    }

    fn delete_property(&self, name: &str) {
        self.state().properties.remove(name);
    }

    fn take_playlist(&self) -> UnitResult<Vec<PlaylistEntry>> {
        let mut state = self.state();
        let entries = mem::take(&mut state.playlist);
        state.seek(0, 0);
        state.touch();
        Ok(entries)
    }

    fn replace_playlist(&self, entries: Vec<PlaylistEntry>) -> UnitResult<()> {
        let mut state = self.state();
        debug!(unit = self.id, entries = entries.len(), "Replacing playlist");
        state.playlist = entries;
        state.seek(0, 0);
        state.touch();
        Ok(())
    }

    fn current_clip_index(&self) -> ClipIndex {
        to_index(self.state().clip)
    }

    fn count(&self) -> usize {
        self.state().playlist.len()
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn has_terminated(&self) -> bool {
        self.state().terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CatalogProbe;

    fn unit_with(resources: &[&str]) -> MemoryUnit {
        let probe = CatalogProbe::new(25.0)
            .with("a", 100)
            .with("b", 50)
            .with("c", 10);
        let unit = MemoryUnit::new(0, Profile::default(), Arc::new(probe));
        for resource in resources {
            unit.append(resource, -1, -1).unwrap();
        }
        unit
    }

    #[test]
    fn test_insert_out_of_bounds_appends() {
        let unit = unit_with(&["a", "b"]);
        unit.insert("c", 9, -1, -1).unwrap();
        unit.insert("c", -1, -1, -1).unwrap();
        unit.insert("c", 0, -1, -1).unwrap();
        assert_eq!(unit.resources(), vec!["c", "a", "b", "c", "c"]);
        assert_eq!(unit.current_clip_index(), 1);
    }

    #[test]
    fn test_unknown_resource_is_rejected() {
        let unit = unit_with(&[]);
        assert_eq!(
            unit.check_clip("zzz"),
            Err(UnitError::ResourceUnavailable("zzz".into()))
        );
        assert!(unit.load("zzz", -1, -1, true).is_err());
        assert_eq!(unit.count(), 0);
    }

    #[test]
    fn test_load_flush_and_append() {
        let unit = unit_with(&["a", "b"]);
        unit.load("c", -1, -1, false).unwrap();
        assert_eq!(unit.resources(), vec!["a", "b", "c"]);
        unit.load("b", 5, 20, true).unwrap();
        assert_eq!(unit.resources(), vec!["b"]);
        assert_eq!(unit.position(), (0, 5));
    }

    #[test]
    fn test_remove_and_move_reject_bad_index() {
        let unit = unit_with(&["a", "b"]);
        assert_eq!(unit.remove(2), Err(UnitError::IndexOutOfRange(2)));
        assert_eq!(unit.move_clip(0, 5), Err(UnitError::IndexOutOfRange(5)));
        assert_eq!(unit.move_clip(-1, 0), Err(UnitError::IndexOutOfRange(-1)));
        unit.remove(0).unwrap();
        assert_eq!(unit.resources(), vec!["b"]);
    }

    #[test]
    fn test_move_tracks_current_clip() {
        let unit = unit_with(&["a", "b", "c"]);
        unit.change_position(1, 0);
        unit.move_clip(1, 2).unwrap();
        assert_eq!(unit.resources(), vec!["a", "c", "b"]);
        assert_eq!(unit.current_clip_index(), 2);
        unit.move_clip(0, 2).unwrap();
        assert_eq!(unit.current_clip_index(), 1);
    }

    #[test]
    fn test_clean_wipe_clear() {
        let probe = Arc::new(CatalogProbe::new(25.0).with("a", 10).with("b", 10).with("c", 10));
        let unit = MemoryUnit::new(0, Profile::default(), probe.clone());
        for resource in ["a", "b", "c"] {
            unit.append(resource, -1, -1).unwrap();
        }
        unit.change_position(2, 3);

        probe.remove("a");
        unit.clean().unwrap();
        assert_eq!(unit.resources(), vec!["b", "c"]);
        assert_eq!(unit.position(), (1, 3));

        unit.wipe().unwrap();
        assert_eq!(unit.resources(), vec!["c"]);
        assert_eq!(unit.position(), (0, 3));

        unit.clear().unwrap();
        assert_eq!(unit.count(), 0);
    }

    #[test]
    fn test_step_crosses_clip_boundaries() {
        let unit = unit_with(&["c", "c", "c"]);
        unit.step(15);
        assert_eq!(unit.position(), (1, 5));
        unit.step(-7);
        assert_eq!(unit.position(), (0, 8));
        assert!(!unit.has_terminated());
        unit.step(100);
        assert_eq!(unit.position(), (2, 9));
        assert!(unit.has_terminated());
    }

    #[test]
    fn test_step_across_clips_longer_than_frame_range() {
        let probe = CatalogProbe::new(25.0).with("long", Frame::MAX);
        let unit = MemoryUnit::new(0, Profile::default(), Arc::new(probe));
        unit.append("long", -1, -1).unwrap();
        unit.append("long", -1, -1).unwrap();

        unit.step(Frame::MAX);
        assert_eq!(unit.position(), (1, 0));
        unit.step(10);
        assert_eq!(unit.position(), (1, 10));
        unit.step(-20);
        assert_eq!(unit.position(), (0, Frame::MAX - 10));
        assert!(!unit.has_terminated());

        unit.change_position(1, 0);
        unit.step(Frame::MAX);
        assert_eq!(unit.position(), (1, Frame::MAX - 1));
        assert!(unit.has_terminated());
    }

    #[test]
    fn test_tick_runs_to_end() {
        let unit = unit_with(&["c"]);
        unit.play(2000);
        unit.tick(3);
        assert_eq!(unit.position(), (0, 6));
        unit.tick(10);
        assert!(unit.has_terminated());
        assert_eq!(unit.speed(), 0);
        unit.change_position(0, 0);
        assert!(!unit.has_terminated());
    }

    #[test]
    fn test_trim_rules() {
        let unit = unit_with(&["a"]);
        assert_eq!(unit.set_clip_in(3, 0), Err(TrimError::NotApplicable));
        assert_eq!(unit.set_clip_out(0, 100), Err(TrimError::OutOfRange));
        assert_eq!(unit.set_clip_in(0, -2), Err(TrimError::OutOfRange));

        unit.set_clip_out(0, 40).unwrap();
        assert_eq!(unit.set_clip_in(0, 41), Err(TrimError::OutOfRange));
        unit.set_clip_in(0, 10).unwrap();
        assert_eq!(unit.set_clip_out(0, 9), Err(TrimError::OutOfRange));
        assert_eq!(unit.position(), (0, 10));

        unit.change_position(0, 30);
        unit.set_clip_out_live(0, 20).unwrap();
        assert_eq!(unit.position(), (0, 40));
        unit.set_clip_out(0, 20).unwrap();
        assert_eq!(unit.position(), (0, 20));
    }

    #[test]
    fn test_status_states() {
        let unit = unit_with(&[]);
        assert_eq!(unit.status().unwrap().state, UnitState::NotLoaded);
        unit.append("a", -1, -1).unwrap();
        assert_eq!(unit.status().unwrap().state, UnitState::Stopped);
        unit.play(NORMAL_SPEED);
        assert_eq!(unit.status().unwrap().state, UnitState::Playing);
        unit.play(0);
        assert_eq!(unit.status().unwrap().state, UnitState::Paused);
        unit.set_offline(true);
        assert_eq!(unit.status().unwrap().state, UnitState::Offline);
        assert_eq!(unit.profile(), Err(UnitError::NoConsumer(0)));
    }

    #[test]
    fn test_properties() {
        let unit = unit_with(&[]);
        unit.set_property("eof = loop").unwrap();
        assert_eq!(unit.property("eof").as_deref(), Some("loop"));
        assert!(unit.set_property("=x").is_err());
        assert!(unit.set_property("novalue").is_err());
        unit.delete_property("eof");
        assert_eq!(unit.property("eof"), None);
    }

    #[test]
    fn test_transfer_replaces_destination() {
        let src = unit_with(&["a", "b"]);
        let dest = unit_with(&["c"]);
        dest.change_position(0, 4);
        src.transfer(&dest).unwrap();
        assert_eq!(src.count(), 0);
        assert_eq!(dest.resources(), vec!["a", "b"]);
        assert_eq!(dest.position(), (0, 0));
    }
}
