//! In-Memory Unit Registry

use std::sync::Arc;

use super::probe::MediaProbe;
use super::unit::MemoryUnit;
use crate::unit::{Profile, Unit, UnitRegistry};
use crate::{UnitId, MAX_UNITS};

/// Fixed table of `MAX_UNITS` unit slots
pub struct MemoryRegistry {
    slots: Vec<Option<Arc<MemoryUnit>>>,
    profile: Profile,
    probe: Arc<dyn MediaProbe>,
}

impl MemoryRegistry {
    /// Creates a registry with every slot empty
    pub fn new(profile: Profile, probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            slots: (0..MAX_UNITS).map(|_| None).collect(),
            profile,
            probe,
        }
    }

    /// Creates a registry with units `0..count` instantiated
    pub fn with_units(count: usize, profile: Profile, probe: Arc<dyn MediaProbe>) -> Self {
        let mut registry = Self::new(profile, probe);
        for id in (0..MAX_UNITS).take(count) {
            registry.add_unit(id);
        }
        registry
    }

    /// Instantiates the unit at `id`, replacing any unit already there.
    /// Returns `None` when `id` is outside the slot table.
    pub fn add_unit(&mut self, id: UnitId) -> Option<Arc<MemoryUnit>> {
        let slot = self.slots.get_mut(usize::try_from(id).ok()?)?;
        let unit = Arc::new(MemoryUnit::new(id, self.profile.clone(), Arc::clone(&self.probe)));
        *slot = Some(Arc::clone(&unit));
        Some(unit)
    }

    /// Concrete unit at `id`
    pub fn unit(&self, id: UnitId) -> Option<Arc<MemoryUnit>> {
        self.slots
            .get(usize::try_from(id).ok()?)
            .and_then(Clone::clone)
    }

    /// Number of instantiated units
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UnitRegistry for MemoryRegistry {
    fn resolve(&self, id: UnitId) -> Option<Arc<dyn Unit>> {
        self.unit(id).map(|unit| unit as Arc<dyn Unit>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CatalogProbe;

    #[test]
    fn test_slots() {
        let probe = Arc::new(CatalogProbe::new(25.0));
        let mut registry = MemoryRegistry::with_units(3, Profile::default(), probe);
        assert_eq!(registry.len(), 3);
        assert!(registry.resolve(2).is_some());
        assert!(registry.resolve(3).is_none());

        assert!(registry.add_unit(MAX_UNITS - 1).is_some());
        assert!(registry.add_unit(MAX_UNITS).is_none());
        assert_eq!(registry.resolve(MAX_UNITS - 1).map(|u| u.id()), Some(MAX_UNITS - 1));
        assert_eq!(registry.len(), 4);
    }
}
