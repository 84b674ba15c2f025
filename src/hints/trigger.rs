//! Hint triggers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ids::{LocationId, SlotId};
use crate::hints::payload::HintPayload;

/// Position of a triggerable hint in the list the engine was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerableId(pub usize);

impl fmt::Display for TriggerableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Triggerable({})", self.0)
    }
}

/// Condition that releases a hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Released as soon as the team exists.
    Free,
    /// Released when `player` checks `location`.
    Location {
        /// Slot whose world holds the location.
        player: SlotId,
        /// Location id.
        location: LocationId,
    },
}

impl Trigger {
    /// Does checking `location` in `player`'s world fire this trigger?
    pub fn matches(&self, player: SlotId, location: LocationId) -> bool {
        match *self {
            Trigger::Free => false,
            Trigger::Location { player: p, location: l } => p == player && l == location,
        }
    }
}

/// A hint plus the trigger that releases it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerableHint {
    /// Released payload.
    pub hint: HintPayload,
    /// Release condition.
    pub trigger: Trigger,
}

impl TriggerableHint {
    /// Hint released unconditionally.
    pub fn free(hint: impl Into<HintPayload>) -> Self {
        Self { hint: hint.into(), trigger: Trigger::Free }
    }

    /// Hint released when `player` checks `location`.
    pub fn on_location(hint: impl Into<HintPayload>, player: SlotId, location: LocationId) -> Self {
        Self { hint: hint.into(), trigger: Trigger::Location { player, location } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::payload::TextHint;

    #[test]
    fn test_location_trigger_matches_exact_pair() {
        let trigger = Trigger::Location { player: SlotId(3), location: LocationId(100) };
        assert!(trigger.matches(SlotId(3), LocationId(100)));
        assert!(!trigger.matches(SlotId(3), LocationId(101)));
        assert!(!trigger.matches(SlotId(2), LocationId(100)));
        assert!(!Trigger::Free.matches(SlotId(3), LocationId(100)));
    }

    #[test]
    fn test_trigger_serde_shape() {
        let trigger: Trigger =
            serde_json::from_str(r#"{"kind":"location","player":3,"location":100}"#).unwrap();
        assert_eq!(trigger, Trigger::Location { player: SlotId(3), location: LocationId(100) });
        assert_eq!(serde_json::to_string(&Trigger::Free).unwrap(), r#"{"kind":"free"}"#);
    }

    #[test]
    fn test_constructors() {
        let hint = TriggerableHint::on_location(TextHint::new(SlotId(1), "hi"), SlotId(3), LocationId(5));
        assert!(hint.trigger.matches(SlotId(3), LocationId(5)));
        assert_eq!(TriggerableHint::free(TextHint::new(SlotId(1), "hi")).trigger, Trigger::Free);
    }
}
