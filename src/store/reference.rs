//! Reference store: the generation map kept as-is.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::checks::CheckState;
use crate::core::ids::{ItemId, LocationId, SlotId, TeamId};
use crate::store::{
    slot_out_of_range, validate, GenerationData, ItemPlacement, LocationStore, Placement,
    StoreBackend, ValidationError,
};

/// Straightforward [`LocationStore`] over ordered maps.
#[derive(Clone, Debug)]
pub struct ReferenceLocationStore {
    slots: GenerationData,
}

impl ReferenceLocationStore {
    /// Validate and wrap generation data.
    pub fn new(data: GenerationData) -> Result<Self, ValidationError> {
        validate(&data)?;
        Ok(Self { slots: data })
    }

    #[track_caller]
    fn slot(&self, slot: SlotId) -> &BTreeMap<LocationId, Placement> {
        match self.slots.get(&slot) {
            Some(locations) => locations,
            None => slot_out_of_range(slot, self.slots.len()),
        }
    }
}

impl LocationStore for ReferenceLocationStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Reference
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn placement(&self, slot: SlotId, location: LocationId) -> Option<Placement> {
        self.slots.get(&slot)?.get(&location).copied()
    }

    fn find_item<'a>(
        &'a self,
        targets: &'a BTreeSet<SlotId>,
        item: ItemId,
    ) -> Box<dyn Iterator<Item = ItemPlacement> + 'a> {
        Box::new(self.slots.iter().flat_map(move |(&finder, locations)| {
            locations
                .iter()
                .filter(move |(_, p)| p.item == item && targets.contains(&p.receiver))
                .map(move |(&location, p)| ItemPlacement {
                    finder,
                    location,
                    item: p.item,
                    receiver: p.receiver,
                    flags: p.flags,
                })
        }))
    }

    fn locations_for_player(&self, slot: SlotId) -> BTreeMap<SlotId, BTreeSet<LocationId>> {
        let mut all_locations: BTreeMap<SlotId, BTreeSet<LocationId>> = BTreeMap::new();
        for (&source, locations) in &self.slots {
            for (&location, placement) in locations {
                if placement.receiver == slot {
                    all_locations.entry(source).or_default().insert(location);
                }
            }
        }
        all_locations
    }

    fn get_checked(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId> {
        let locations = self.slot(slot);
        match checks.checked(team, slot) {
            // Everyone connecting to a fresh game hits this.
            None => Vec::new(),
            Some(checked) if checked.is_empty() => Vec::new(),
            Some(checked) => locations
                .keys()
                .filter(|&location| checked.contains(location))
                .copied()
                .collect(),
        }
    }

    fn get_missing(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId> {
        let locations = self.slot(slot);
        match checks.checked(team, slot) {
            None => locations.keys().copied().collect(),
            Some(checked) if checked.is_empty() => locations.keys().copied().collect(),
            Some(checked) => locations
                .keys()
                .filter(|&location| !checked.contains(location))
                .copied()
                .collect(),
        }
    }

    fn get_remaining(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<ItemId> {
        let locations = self.slot(slot);
        let checked = checks.checked(team, slot);
        let mut items: Vec<ItemId> = locations
            .iter()
            .filter(|&(location, _)| checked.map_or(true, |set| !set.contains(location)))
            .map(|(_, p)| p.item)
            .collect();
        items.sort_unstable();
        items
    }
}
