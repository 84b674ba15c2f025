//! Identifier Types
//!
//! Strongly typed ids for slots, teams, locations and items.
//! All ids are `Ord` so they can key `BTreeMap`s for deterministic iteration.

use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// SLOT / TEAM
// =============================================================================

/// A participating world, numbered `1..=N`.
///
/// Slot 0 is reserved (the server itself) and never owns a location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl SlotId {
    /// The reserved server slot.
    pub const SERVER: SlotId = SlotId(0);

    /// Create a slot id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Zero-based position of this slot in a dense `1..=N` table.
    ///
    /// Only meaningful for non-server slots.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 as usize).wrapping_sub(1)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group of slots sharing check-state and hint visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl TeamId {
    /// Create a team id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// LOCATION / ITEM
// =============================================================================

/// A checkable point inside one slot's world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub i64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An item, interpreted by the game of its receiving slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ITEM FLAGS
// =============================================================================

/// Classification bits carried with every placed item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemFlags(pub u8);

impl ItemFlags {
    /// No classification.
    pub const NONE: ItemFlags = ItemFlags(0);
    /// Item can unlock progression.
    pub const ADVANCEMENT: ItemFlags = ItemFlags(0b001);
    /// Item is helpful but not required.
    pub const USEFUL: ItemFlags = ItemFlags(0b010);
    /// Item is harmful to the receiver.
    pub const TRAP: ItemFlags = ItemFlags(0b100);

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: ItemFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Is the advancement bit set?
    #[inline]
    pub const fn is_advancement(self) -> bool {
        self.contains(Self::ADVANCEMENT)
    }

    /// Is the useful bit set?
    #[inline]
    pub const fn is_useful(self) -> bool {
        self.contains(Self::USEFUL)
    }

    /// Is the trap bit set?
    #[inline]
    pub const fn is_trap(self) -> bool {
        self.contains(Self::TRAP)
    }
}

impl std::ops::BitOr for ItemFlags {
    type Output = ItemFlags;

    fn bitor(self, rhs: ItemFlags) -> ItemFlags {
        ItemFlags(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index() {
        assert_eq!(SlotId::new(1).index(), 0);
        assert_eq!(SlotId::new(4).index(), 3);
    }

    #[test]
    fn test_item_flags() {
        let flags = ItemFlags::ADVANCEMENT | ItemFlags::TRAP;
        assert!(flags.is_advancement());
        assert!(!flags.is_useful());
        assert!(flags.is_trap());
        assert!(!ItemFlags::NONE.is_advancement());
    }

    #[test]
    fn test_ids_serialize_transparent() {
        let json = serde_json::to_string(&(SlotId(3), LocationId(100), ItemId(-7))).unwrap();
        assert_eq!(json, "[3,100,-7]");
    }
}
