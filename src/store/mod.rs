//! Location Store
//!
//! Immutable mapping `(finding slot, location) -> (item, receiving slot, flags)`
//! with the derived queries used by status commands and hint evaluation.
//!
//! ## Backends
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     LOCATION STORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  reference.rs - BTreeMap per slot, straightforward scans    │
//! │  indexed.rs   - dense slot table, sorted columns, item index│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers only ever see [`LocationStore`]; which backend sits behind it is
//! chosen once through [`StoreBackend`] when the store is built.

pub mod reference;
pub mod indexed;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::checks::CheckState;
use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId, TeamId};

pub use indexed::IndexedLocationStore;
pub use reference::ReferenceLocationStore;

// =============================================================================
// DATA
// =============================================================================

/// What sits behind one location.
///
/// Serialized as the `[item, receiving_slot, flags]` triple used by
/// generation output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(ItemId, SlotId, ItemFlags)", into = "(ItemId, SlotId, ItemFlags)")]
pub struct Placement {
    /// Item placed at the location.
    pub item: ItemId,
    /// Slot that receives the item.
    pub receiver: SlotId,
    /// Item classification.
    pub flags: ItemFlags,
}

impl Placement {
    /// Create a placement.
    pub const fn new(item: ItemId, receiver: SlotId, flags: ItemFlags) -> Self {
        Self { item, receiver, flags }
    }
}

impl From<(ItemId, SlotId, ItemFlags)> for Placement {
    fn from((item, receiver, flags): (ItemId, SlotId, ItemFlags)) -> Self {
        Self { item, receiver, flags }
    }
}

impl From<Placement> for (ItemId, SlotId, ItemFlags) {
    fn from(p: Placement) -> Self {
        (p.item, p.receiver, p.flags)
    }
}

/// One result of [`LocationStore::find_item`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemPlacement {
    /// Slot whose world holds the item.
    pub finder: SlotId,
    /// Location holding the item.
    pub location: LocationId,
    /// The item.
    pub item: ItemId,
    /// Slot that receives the item.
    pub receiver: SlotId,
    /// Item classification.
    pub flags: ItemFlags,
}

/// Raw generation output: per finding slot, its locations and what they hold.
pub type GenerationData = BTreeMap<SlotId, BTreeMap<LocationId, Placement>>;

// =============================================================================
// ERRORS
// =============================================================================

/// Store construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No slots at all.
    #[error("rejecting game with 0 players")]
    Empty,

    /// The reserved server slot owns locations.
    #[error("invalid player id 0 for {locations} location(s)")]
    SlotZeroOwner {
        /// Number of locations owned by slot 0.
        locations: usize,
    },

    /// Slot ids are not exactly `1..=N`.
    #[error("player ids not continuous: {count} slots, highest id {max}")]
    NonContiguous {
        /// Number of slot entries.
        count: usize,
        /// Highest slot id seen.
        max: u32,
    },
}

/// Check the construction invariant: slots are exactly `1..=N`, `N >= 1`.
pub fn validate(data: &GenerationData) -> Result<(), ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Some(owned) = data.get(&SlotId::SERVER) {
        if !owned.is_empty() {
            return Err(ValidationError::SlotZeroOwner { locations: owned.len() });
        }
    }

    // Keys are sorted, so 1..=N holds iff the first is 1 and the last is N.
    let count = data.len();
    let first = data.keys().next().map_or(0, |s| s.0);
    let max = data.keys().next_back().map_or(0, |s| s.0);
    if first != 1 || max as usize != count {
        return Err(ValidationError::NonContiguous { count, max });
    }

    Ok(())
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which store implementation to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Plain ordered maps.
    Reference,
    /// Dense, pre-indexed tables.
    #[default]
    Indexed,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Reference => write!(f, "reference"),
            StoreBackend::Indexed => write!(f, "indexed"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reference" | "pure" => Ok(StoreBackend::Reference),
            "indexed" | "fast" | "speedups" => Ok(StoreBackend::Indexed),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

/// Validate `data` and build the requested backend.
pub fn build_store(
    backend: StoreBackend,
    data: GenerationData,
) -> Result<Arc<dyn LocationStore>, ValidationError> {
    let locations: usize = data.values().map(BTreeMap::len).sum();
    let slots = data.len();

    let store: Arc<dyn LocationStore> = match backend {
        StoreBackend::Reference => Arc::new(ReferenceLocationStore::new(data).inspect_err(|e| {
            warn!("Rejected generation data: {}", e);
        })?),
        StoreBackend::Indexed => Arc::new(IndexedLocationStore::new(data).inspect_err(|e| {
            warn!("Rejected generation data: {}", e);
        })?),
    };

    info!("Built {} location store: {} slots, {} locations", backend, slots, locations);
    Ok(store)
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Read-only queries over placed items.
///
/// Every slot in `1..=slot_count()` exists; passing any other slot to a
/// per-slot query is a programming error and panics.
pub trait LocationStore: Send + Sync {
    /// Backend in use (diagnostics only).
    fn backend(&self) -> StoreBackend;

    /// Number of slots `N`.
    fn slot_count(&self) -> usize;

    /// What sits at `location` in `slot`'s world, if that location exists.
    fn placement(&self, slot: SlotId, location: LocationId) -> Option<Placement>;

    /// Every placement of `item` received by one of `targets`, lazily.
    ///
    /// Ordered by finding slot, then location.
    fn find_item<'a>(
        &'a self,
        targets: &'a BTreeSet<SlotId>,
        item: ItemId,
    ) -> Box<dyn Iterator<Item = ItemPlacement> + 'a>;

    /// For each finding slot, the locations whose item goes to `slot`.
    fn locations_for_player(&self, slot: SlotId) -> BTreeMap<SlotId, BTreeSet<LocationId>>;

    /// `slot`'s own locations that `team` has checked, in location order.
    fn get_checked(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId>;

    /// `slot`'s own locations that `team` has not checked, in location order.
    fn get_missing(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<LocationId>;

    /// Items behind the unchecked locations, sorted, duplicates kept.
    fn get_remaining(&self, checks: &dyn CheckState, team: TeamId, slot: SlotId) -> Vec<ItemId>;
}

/// Panic for a slot outside `1..=N`.
#[cold]
#[track_caller]
pub(crate) fn slot_out_of_range(slot: SlotId, count: usize) -> ! {
    panic!("slot {} outside 1..={}", slot, count)
}
