//! Test doubles for the unit contract.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::unit::{
    PlaylistEntry, PlaylistReport, Profile, Service, Unit, UnitRegistry, UnitState, UnitStatus,
};
use crate::{ClipIndex, Frame, Speed, TrimError, UnitError, UnitId, UnitResult};

/// A contract call observed by [`RecordingUnit`]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Load(String, Frame, Frame, bool),
    Check(String),
    Insert(String, ClipIndex, Frame, Frame),
    Remove(ClipIndex),
    Append(String, Frame, Frame),
    Move(ClipIndex, ClipIndex),
    Clean,
    Wipe,
    Clear,
    AppendService(String),
    Play(Speed),
    Terminate,
    Step(Frame),
    ChangePosition(ClipIndex, Frame),
    SetIn(ClipIndex, Frame),
    SetOut(ClipIndex, Frame),
    SetOutLive(ClipIndex, Frame),
    Set(String),
    Delete(String),
    Take,
    Replace(usize),
}

/// Unit double that records every call and fails on demand
#[derive(Default)]
pub struct RecordingUnit {
    pub id: UnitId,
    pub current_clip: ClipIndex,
    pub count: usize,
    pub offline: bool,
    pub terminated: bool,
    /// Resources rejected by check/insert/append/load
    pub rejected: HashSet<String>,
    /// Index at which remove/move start failing
    pub fail_index: Option<ClipIndex>,
    pub trim_error: Option<TrimError>,
    pub properties: Mutex<BTreeMap<String, String>>,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingUnit {
    pub fn new(id: UnitId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that changed something, without pre-flight checks
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Check(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn accept(&self, resource: &str) -> UnitResult<()> {
        if self.rejected.contains(resource) {
            Err(UnitError::ResourceUnavailable(resource.to_string()))
        } else {
            Ok(())
        }
    }

    fn index_ok(&self, index: ClipIndex) -> UnitResult<()> {
        match self.fail_index {
            Some(bad) if bad == index => Err(UnitError::IndexOutOfRange(index)),
            _ => Ok(()),
        }
    }

    fn trim(&self) -> Result<(), TrimError> {
        self.trim_error.map_or(Ok(()), Err)
    }
}

impl Unit for RecordingUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn load(&self, resource: &str, in_point: Frame, out_point: Frame, flush: bool) -> UnitResult<()> {
        self.record(Call::Load(resource.to_string(), in_point, out_point, flush));
        self.accept(resource)
    }

    fn check_clip(&self, resource: &str) -> UnitResult<()> {
        self.record(Call::Check(resource.to_string()));
        self.accept(resource)
    }

    fn insert(&self, resource: &str, index: ClipIndex, in_point: Frame, out_point: Frame) -> UnitResult<()> {
        self.record(Call::Insert(resource.to_string(), index, in_point, out_point));
        self.index_ok(index)
    }

    fn remove(&self, index: ClipIndex) -> UnitResult<()> {
        self.record(Call::Remove(index));
        self.index_ok(index)
    }

    fn append(&self, resource: &str, in_point: Frame, out_point: Frame) -> UnitResult<()> {
        self.record(Call::Append(resource.to_string(), in_point, out_point));
        self.accept(resource)
    }

    fn move_clip(&self, src: ClipIndex, dest: ClipIndex) -> UnitResult<()> {
        self.record(Call::Move(src, dest));
        self.index_ok(src)
    }

    fn clean(&self) -> UnitResult<()> {
        self.record(Call::Clean);
        Ok(())
    }

    fn wipe(&self) -> UnitResult<()> {
        self.record(Call::Wipe);
        Ok(())
    }

    fn clear(&self) -> UnitResult<()> {
        self.record(Call::Clear);
        Ok(())
    }

    fn append_service(&self, service: &Service) -> UnitResult<()> {
        self.record(Call::AppendService(service.label.clone()));
        Ok(())
    }

    fn profile(&self) -> UnitResult<Profile> {
        if self.offline {
            Err(UnitError::NoConsumer(self.id))
        } else {
            Ok(Profile::default())
        }
    }

    fn play(&self, speed: Speed) {
        self.record(Call::Play(speed));
    }

    fn terminate(&self) {
        self.record(Call::Terminate);
    }

    fn step(&self, frames: Frame) {
        self.record(Call::Step(frames));
    }

    fn change_position(&self, clip: ClipIndex, position: Frame) {
        self.record(Call::ChangePosition(clip, position));
    }

    fn set_clip_in(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        self.record(Call::SetIn(clip, position));
        self.trim()
    }

    fn set_clip_out(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        self.record(Call::SetOut(clip, position));
        self.trim()
    }

    fn set_clip_out_live(&self, clip: ClipIndex, position: Frame) -> Result<(), TrimError> {
        self.record(Call::SetOutLive(clip, position));
        self.trim()
    }

    fn status(&self) -> UnitResult<UnitStatus> {
        Ok(UnitStatus {
            unit: self.id,
            state: UnitState::Stopped,
            clip_index: self.current_clip,
            ..Default::default()
        })
    }

    fn report_list(&self) -> UnitResult<PlaylistReport> {
        Ok(PlaylistReport::default())
    }

    fn set_property(&self, name_value: &str) -> UnitResult<()> {
        self.record(Call::Set(name_value.to_string()));
        let (name, value) = name_value
            .split_once('=')
            .ok_or_else(|| UnitError::InvalidProperty(name_value.to_string()))?;
        self.properties
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.lock().unwrap().get(name).cloned()
    }

    fn delete_property(&self, name: &str) {
        self.record(Call::Delete(name.to_string()));
        self.properties.lock().unwrap().remove(name);
    }

    fn take_playlist(&self) -> UnitResult<Vec<PlaylistEntry>> {
        self.record(Call::Take);
        Ok(vec![PlaylistEntry::new("taken", 10, 25.0); self.count])
    }

    fn replace_playlist(&self, entries: Vec<PlaylistEntry>) -> UnitResult<()> {
        self.record(Call::Replace(entries.len()));
        Ok(())
    }

    fn current_clip_index(&self) -> ClipIndex {
        self.current_clip
    }

    fn count(&self) -> usize {
        self.count
    }

    fn is_offline(&self) -> bool {
        self.offline
    }

    fn has_terminated(&self) -> bool {
        self.terminated
    }
}

/// Registry over a fixed set of [`RecordingUnit`]s
#[derive(Default)]
pub struct RecordingRegistry {
    pub units: HashMap<UnitId, Arc<RecordingUnit>>,
}

impl RecordingRegistry {
    pub fn with(units: Vec<RecordingUnit>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id, Arc::new(u))).collect(),
        }
    }

    pub fn unit(&self, id: UnitId) -> Arc<RecordingUnit> {
        Arc::clone(&self.units[&id])
    }
}

impl UnitRegistry for RecordingRegistry {
    fn resolve(&self, id: UnitId) -> Option<Arc<dyn Unit>> {
        self.units
            .get(&id)
            .map(|unit| Arc::clone(unit) as Arc<dyn Unit>)
    }
}

/// Owned token list for building a `CommandContext`
pub fn tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
