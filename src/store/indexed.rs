//! Indexed store: dense slot table with pre-built lookups.
//!
//! Slots live in a `Vec` indexed by `slot - 1`, each slot's locations in
//! sorted parallel columns. An item index makes `find_item` proportional to
//! the number of copies of that item, and per-receiver location sets are
//! computed once. Checked/missing queries merge the sorted location column
//! with the (sorted) checked set instead of probing per location.

use std::collections::{BTreeMap, BTreeSet};
use std::iter::Peekable;

use crate::core::checks::CheckState;
use crate::core::ids::{ItemId, LocationId, SlotId, TeamId};
use crate::store::{
    slot_out_of_range, validate, GenerationData, ItemPlacement, LocationStore, Placement,
    StoreBackend, ValidationError,
};

#[derive(Clone, Debug, Default)]
struct SlotTable {
    /// Sorted ascending.
    locations: Vec<LocationId>,
    /// Parallel to `locations`.
    placements: Vec<Placement>,
    /// Every item in this world, sorted.
    all_items: Vec<ItemId>,
}

/// Performance-oriented [`LocationStore`].
#[derive(Clone, Debug)]
pub struct IndexedLocationStore {
    slots: Vec<SlotTable>,
    /// item -> (slot index, row), in slot then location order.
    by_item: BTreeMap<ItemId, Vec<(usize, usize)>>,
    /// receiver -> finding slot -> locations.
    by_receiver: BTreeMap<SlotId, BTreeMap<SlotId, BTreeSet<LocationId>>>,
}

impl IndexedLocationStore {
    /// Validate generation data and build the tables.
    pub fn new(data: GenerationData) -> Result<Self, ValidationError> {
        validate(&data)?;

        let mut slots = Vec::with_capacity(data.len());
        let mut by_item: BTreeMap<ItemId, Vec<(usize, usize)>> = BTreeMap::new();
        let mut by_receiver: BTreeMap<SlotId, BTreeMap<SlotId, BTreeSet<LocationId>>> =
            BTreeMap::new();

        for (slot_index, (finder, locations)) in data.into_iter().enumerate() {
            let mut table = SlotTable {
                locations: Vec::with_capacity(locations.len()),
                placements: Vec::with_capacity(locations.len()),
                all_items: Vec::with_capacity(locations.len()),
            };

            for (row, (location, placement)) in locations.into_iter().enumerate() {
                by_item.entry(placement.item).or_default().push((slot_index, row));
                by_receiver
                    .entry(placement.receiver)
                    .or_default()
                    .entry(finder)
                    .or_default()
                    .insert(location);
                table.locations.push(location);
                table.placements.push(placement);
                table.all_items.push(placement.item);
            }

            table.all_items.sort_unstable();
            slots.push(table);
        }

        Ok(Self { slots, by_item, by_receiver })
    }

    #[track_caller]
    fn table(&self, slot: SlotId) -> &SlotTable {
        match self.slots.get(slot.index()) {
            Some(table) if slot != SlotId::SERVER => table,
            _ => slot_out_of_range(slot, self.slots.len()),
        }
    }
}

/// Advance `checked` past everything below `location`; report whether it is present.
fn advance_to<'a, I>(checked: &mut Peekable<I>, location: LocationId) -> bool
where
    I: Iterator<Item = &'a LocationId>,
{
    while let Some(&&next) = checked.peek() {
        if next < location {
            checked.next();
        } else {
            return next == location;
        }
    }
    false
}

impl LocationStore for IndexedLocationStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Indexed
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn placement(&self, slot: SlotId, location: LocationId) -> Option<Placement> {
        if slot == SlotId::SERVER {
            return None;
        }
        let table = self.slots.get(slot.index())?;
        let row = table.locations.binary_search(&location).ok()?;
        Some(table.placements[row])
    }

    fn find_item<'a>(
        &'a self,
        targets: &'a BTreeSet<SlotId>,
        item: ItemId,
    ) -> Box<dyn Iterator<Item = ItemPlacement> + 'a> {
        let rows = self.by_item.get(&item).map_or(&[][..], Vec::as_slice);
        Box::new(rows.iter().filter_map(move |&(slot_index, row)| {
            let table = &self.slots[slot_index];
            let placement = table.placements[row];
            targets.contains(&placement.receiver).then(|| ItemPlacement {
                finder: SlotId(slot_index as u32 + 1),
                location: table.locations[row],
                item: placement.item,
                receiver: placement.receiver,
                flags: placement.flags,
            })
        }))
    }

    fn locations_for_player(&self, slot: SlotId) -> BTreeMap<SlotId, BTreeSet<LocationId>> {
        self.by_receiver.get(&slot).cloned().unwrap_or_default()
    }

    fn get_checked(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId> {
        let table = self.table(slot);
        let checked = match checks.checked(team, slot) {
            Some(checked) if !checked.is_empty() => checked,
            _ => return Vec::new(),
        };

        if checked.len() < table.locations.len() {
            checked
                .iter()
                .filter(|location| table.locations.binary_search(location).is_ok())
                .copied()
                .collect()
        } else {
            let mut cursor = checked.iter().peekable();
            table
                .locations
                .iter()
                .filter(|&&location| advance_to(&mut cursor, location))
                .copied()
                .collect()
        }
    }

    fn get_missing(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId> {
        let table = self.table(slot);
        let checked = match checks.checked(team, slot) {
            Some(checked) if !checked.is_empty() => checked,
            _ => return table.locations.clone(),
        };

        let mut cursor = checked.iter().peekable();
        table
            .locations
            .iter()
            .filter(|&&location| !advance_to(&mut cursor, location))
            .copied()
            .collect()
    }

    fn get_remaining(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<ItemId> {
        let table = self.table(slot);
        let checked = match checks.checked(team, slot) {
            Some(checked) if !checked.is_empty() => checked,
            _ => return table.all_items.clone(),
        };

        let mut cursor = checked.iter().peekable();
        let mut items: Vec<ItemId> = table
            .locations
            .iter()
            .zip(&table.placements)
            .filter(|&(&location, _)| !advance_to(&mut cursor, location))
            .map(|(_, p)| p.item)
            .collect();
        items.sort_unstable();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checks::CheckTable;
    use crate::store::reference::ReferenceLocationStore;
    use crate::store::test_data::{placement, sample};
    use proptest::prelude::*;

    #[test]
    fn test_placement_lookup() {
        let store = IndexedLocationStore::new(sample()).unwrap();
        assert_eq!(store.placement(SlotId(2), LocationId(20)), Some(placement(600, 1, 4)));
        assert_eq!(store.placement(SlotId(2), LocationId(22)), None);
        assert_eq!(store.placement(SlotId(0), LocationId(20)), None);
        assert_eq!(store.placement(SlotId(9), LocationId(20)), None);
    }

    #[test]
    fn test_find_item_uses_index_order() {
        let store = IndexedLocationStore::new(sample()).unwrap();
        let targets = BTreeSet::from([SlotId(1), SlotId(3)]);
        let found: Vec<_> = store.find_item(&targets, ItemId(500)).collect();
        assert_eq!(found.len(), 3);
        assert_eq!(found[2].finder, SlotId(3));
        assert_eq!(found[2].location, LocationId(30));
        assert_eq!(store.find_item(&targets, ItemId(12345)).count(), 0);
    }

    #[test]
    fn test_checked_small_and_large_sets() {
        let store = IndexedLocationStore::new(sample()).unwrap();
        let team = TeamId(1);
        let mut checks = CheckTable::new();

        checks.record(team, SlotId(1), LocationId(13));
        assert_eq!(store.get_checked(&checks, team, SlotId(1)), vec![LocationId(13)]);

        for location in [5, 10, 11, 12, 14, 15] {
            checks.record(team, SlotId(1), LocationId(location));
        }
        assert_eq!(
            store.get_checked(&checks, team, SlotId(1)),
            vec![LocationId(10), LocationId(11), LocationId(12), LocationId(13)]
        );
        assert!(store.get_missing(&checks, team, SlotId(1)).is_empty());
        assert!(store.get_remaining(&checks, team, SlotId(1)).is_empty());
    }

    #[test]
    #[should_panic(expected = "outside 1..=3")]
    fn test_slot_zero_panics() {
        let store = IndexedLocationStore::new(sample()).unwrap();
        store.get_checked(&CheckTable::new(), TeamId(0), SlotId(0));
    }

    fn arb_world() -> impl Strategy<Value = (GenerationData, Vec<(u32, i64)>)> {
        (1u32..5).prop_flat_map(|slots| {
            let world = proptest::collection::vec(
                proptest::collection::btree_map(0i64..40, (0i64..8, 1u32..=slots, 0u8..8), 0..12),
                slots as usize,
            );
            let checks = proptest::collection::vec((1u32..=slots, 0i64..40), 0..30);
            (world, checks).prop_map(|(world, checks)| {
                let data = world
                    .into_iter()
                    .enumerate()
                    .map(|(i, locations)| {
                        let locations = locations
                            .into_iter()
                            .map(|(loc, (item, rx, flags))| (LocationId(loc), placement(item, rx, flags)))
                            .collect();
                        (SlotId(i as u32 + 1), locations)
                    })
                    .collect();
                (data, checks)
            })
        })
    }

    proptest! {
        #[test]
        fn prop_checked_and_missing_partition((data, recorded) in arb_world()) {
            let store = IndexedLocationStore::new(data.clone()).unwrap();
            let mut checks = CheckTable::new();
            for (slot, location) in recorded {
                checks.record(TeamId(0), SlotId(slot), LocationId(location));
            }

            for (&slot, locations) in &data {
                let checked = store.get_checked(&checks, TeamId(0), slot);
                let missing = store.get_missing(&checks, TeamId(0), slot);
                let remaining = store.get_remaining(&checks, TeamId(0), slot);

                let checked_set: BTreeSet<_> = checked.iter().copied().collect();
                let missing_set: BTreeSet<_> = missing.iter().copied().collect();
                prop_assert!(checked_set.is_disjoint(&missing_set));
                let union: BTreeSet<_> = checked_set.union(&missing_set).copied().collect();
                let all: BTreeSet<_> = locations.keys().copied().collect();
                prop_assert_eq!(union, all);

                prop_assert_eq!(remaining.len(), missing.len());
                prop_assert!(remaining.windows(2).all(|w| w[0] <= w[1]));
            }
        }

        #[test]
        fn prop_backends_agree((data, recorded) in arb_world()) {
            let fast = IndexedLocationStore::new(data.clone()).unwrap();
            let slow = ReferenceLocationStore::new(data.clone()).unwrap();
            let mut checks = CheckTable::new();
            for (slot, location) in recorded {
                checks.record(TeamId(0), SlotId(slot), LocationId(location));
            }

            let targets: BTreeSet<SlotId> = data.keys().copied().collect();
            for &slot in data.keys() {
                prop_assert_eq!(fast.get_checked(&checks, TeamId(0), slot), slow.get_checked(&checks, TeamId(0), slot));
                prop_assert_eq!(fast.get_missing(&checks, TeamId(0), slot), slow.get_missing(&checks, TeamId(0), slot));
                prop_assert_eq!(fast.get_remaining(&checks, TeamId(0), slot), slow.get_remaining(&checks, TeamId(0), slot));
                prop_assert_eq!(fast.locations_for_player(slot), slow.locations_for_player(slot));
            }
            for item in 0..8 {
                let a: Vec<_> = fast.find_item(&targets, ItemId(item)).collect();
                let b: Vec<_> = slow.find_item(&targets, ItemId(item)).collect();
                prop_assert_eq!(a, b);
            }
        }
    }
}
