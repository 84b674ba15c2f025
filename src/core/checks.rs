//! Check State
//!
//! Read-only view of which locations each (team, slot) has checked.
//! The session layer owns this data; the engine only queries it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::ids::{LocationId, SlotId, TeamId};

/// Authoritative check-state lookup supplied by the session layer.
///
/// `None` and an empty set both mean "nothing checked yet".
pub trait CheckState {
    /// Checked locations of `slot` on `team`.
    fn checked(&self, team: TeamId, slot: SlotId) -> Option<&BTreeSet<LocationId>>;

    /// Has `slot` on `team` checked `location`?
    fn is_checked(&self, team: TeamId, slot: SlotId, location: LocationId) -> bool {
        self.checked(team, slot)
            .is_some_and(|set| set.contains(&location))
    }
}

impl CheckState for BTreeMap<(TeamId, SlotId), BTreeSet<LocationId>> {
    fn checked(&self, team: TeamId, slot: SlotId) -> Option<&BTreeSet<LocationId>> {
        self.get(&(team, slot))
    }
}

impl CheckState for HashMap<(TeamId, SlotId), BTreeSet<LocationId>> {
    fn checked(&self, team: TeamId, slot: SlotId) -> Option<&BTreeSet<LocationId>> {
        self.get(&(team, slot))
    }
}

/// Simple in-memory check table.
///
/// Used by the demo binary and tests; a real session layer plugs in
/// its own persisted state through [`CheckState`].
#[derive(Clone, Debug, Default)]
pub struct CheckTable {
    checks: BTreeMap<(TeamId, SlotId), BTreeSet<LocationId>>,
}

impl CheckTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check. Returns true if it was not already recorded.
    pub fn record(&mut self, team: TeamId, slot: SlotId, location: LocationId) -> bool {
        self.checks.entry((team, slot)).or_default().insert(location)
    }

    /// Number of checks recorded for a slot.
    pub fn count(&self, team: TeamId, slot: SlotId) -> usize {
        self.checks.get(&(team, slot)).map_or(0, BTreeSet::len)
    }
}

impl CheckState for CheckTable {
    fn checked(&self, team: TeamId, slot: SlotId) -> Option<&BTreeSet<LocationId>> {
        self.checks.get(&(team, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut table = CheckTable::new();
        let (team, slot) = (TeamId(0), SlotId(1));

        assert!(table.record(team, slot, LocationId(10)));
        assert!(!table.record(team, slot, LocationId(10)));
        assert_eq!(table.count(team, slot), 1);
        assert!(table.is_checked(team, slot, LocationId(10)));
        assert!(!table.is_checked(TeamId(1), slot, LocationId(10)));
    }

    #[test]
    fn test_missing_entry_reads_as_unchecked() {
        let map: BTreeMap<(TeamId, SlotId), BTreeSet<LocationId>> = BTreeMap::new();
        assert!(map.checked(TeamId(0), SlotId(1)).is_none());
        assert!(!map.is_checked(TeamId(0), SlotId(1), LocationId(1)));
    }
}
