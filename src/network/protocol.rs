//! Protocol Shapes
//!
//! Typed values that travel inside wire messages. These are the only
//! structured types the codec will reconstruct from incoming data; see
//! [`crate::network::codec`] for the allowlist.

use serde::{Serialize, Deserialize};

use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId, TeamId};

// =============================================================================
// PLAYERS AND SLOTS
// =============================================================================

/// A particular player on a particular team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlayer {
    /// Team the player belongs to.
    pub team: TeamId,
    /// Slot number.
    pub slot: SlotId,
    /// Current display alias.
    pub alias: String,
    /// Slot name chosen at generation.
    pub name: String,
}

/// Kind of slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum SlotType {
    /// Watches only.
    Spectator = 0b00,
    /// Regular player.
    Player = 0b01,
    /// Item link group.
    Group = 0b10,
}

impl SlotType {
    /// Slots other than players count as having reached their goal from the start.
    pub fn always_goal(self) -> bool {
        self != SlotType::Player
    }
}

impl From<SlotType> for u8 {
    fn from(t: SlotType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for SlotType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(SlotType::Spectator),
            0b01 => Ok(SlotType::Player),
            0b10 => Ok(SlotType::Group),
            other => Err(format!("invalid slot type: {}", other)),
        }
    }
}

/// A particular slot, independent of team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSlot {
    /// Slot name.
    pub name: String,
    /// Game played in this slot.
    pub game: String,
    /// Slot kind.
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    /// Member slots; only populated for groups.
    #[serde(default)]
    pub group_members: Vec<SlotId>,
}

// =============================================================================
// ITEMS
// =============================================================================

/// An item as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkItem {
    /// Item id.
    pub item: ItemId,
    /// Location it was found at.
    pub location: LocationId,
    /// Slot whose world the location is in.
    pub player: SlotId,
    /// Item classification.
    #[serde(default)]
    pub flags: ItemFlags,
}

// =============================================================================
// VERSION
// =============================================================================

/// Dotted `major.minor.build` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Build number.
    pub build: u32,
}

impl Version {
    /// Create a version.
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

// =============================================================================
// STATUS AND PERMISSIONS
// =============================================================================

/// Client progress as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ClientStatus {
    /// Nothing known.
    Unknown = 0,
    /// Connected.
    Connected = 5,
    /// Ready to start.
    Ready = 10,
    /// Playing.
    Playing = 20,
    /// Goal completed.
    Goal = 30,
}

impl From<ClientStatus> for u8 {
    fn from(s: ClientStatus) -> u8 {
        s as u8
    }
}

impl TryFrom<u8> for ClientStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClientStatus::Unknown),
            5 => Ok(ClientStatus::Connected),
            10 => Ok(ClientStatus::Ready),
            20 => Ok(ClientStatus::Playing),
            30 => Ok(ClientStatus::Goal),
            other => Err(format!("invalid client status: {}", other)),
        }
    }
}

/// Command permission bits (release, collect, remaining).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(pub u8);

impl Permission {
    /// Completely disabled.
    pub const DISABLED: Permission = Permission(0b000);
    /// Manual use allowed.
    pub const ENABLED: Permission = Permission(0b001);
    /// Manual use after goal completion.
    pub const GOAL: Permission = Permission(0b010);
    /// Forced use after goal completion.
    pub const AUTO: Permission = Permission(0b110);
    /// Forced after goal, manual any time.
    pub const AUTO_ENABLED: Permission = Permission(0b111);

    /// Parse a setting such as `"auto-enabled"` or `"goal"`.
    pub fn from_text(text: &str) -> Permission {
        let mut bits = 0;
        if text.contains("auto") {
            bits |= Self::AUTO.0;
        } else if text.contains("goal") {
            bits |= Self::GOAL.0;
        }
        if text.contains("enabled") {
            bits |= Self::ENABLED.0;
        }
        Permission(bits)
    }
}
