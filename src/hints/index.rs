//! Trigger index.
//!
//! Built once from the configured hints. Answers "which hints fire when
//! this location is checked" and "which hints track this location" without
//! scanning.

use std::collections::BTreeMap;

use crate::core::ids::{LocationId, SlotId};
use crate::hints::trigger::{Trigger, TriggerableHint, TriggerableId};

/// Lookup tables over a fixed list of triggerable hints.
#[derive(Clone, Debug, Default)]
pub struct TriggerIndex {
    free: Vec<TriggerableId>,
    by_location: BTreeMap<(SlotId, LocationId), Vec<TriggerableId>>,
    tracking: BTreeMap<(SlotId, LocationId), Vec<TriggerableId>>,
}

impl TriggerIndex {
    /// Index `hints`; ids are positions in the slice.
    pub fn build(hints: &[TriggerableHint]) -> Self {
        let mut index = Self::default();
        for (position, hint) in hints.iter().enumerate() {
            let id = TriggerableId(position);
            match hint.trigger {
                Trigger::Free => index.free.push(id),
                Trigger::Location { player, location } => {
                    index.by_location.entry((player, location)).or_default().push(id);
                }
            }
            for key in hint.hint.tracked_locations() {
                let ids = index.tracking.entry(key).or_default();
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
        }
        index
    }

    /// Unconditional hints.
    pub fn free(&self) -> &[TriggerableId] {
        &self.free
    }

    /// Hints released by checking `location` in `player`'s world.
    pub fn triggered_by(&self, player: SlotId, location: LocationId) -> &[TriggerableId] {
        self.by_location.get(&(player, location)).map(Vec::as_slice).unwrap_or_default()
    }

    /// Hints whose release data depends on `location` in `player`'s world.
    pub fn tracking(&self, player: SlotId, location: LocationId) -> &[TriggerableId] {
        self.tracking.get(&(player, location)).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of distinct trigger locations.
    pub fn trigger_location_count(&self) -> usize {
        self.by_location.len()
    }
}
