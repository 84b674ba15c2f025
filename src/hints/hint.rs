//! Item Hints
//!
//! "Item X for player A is at location L in player B's world". Found status
//! is recomputed from check state and never goes back to unfound.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::core::checks::CheckState;
use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId, TeamId};
use crate::network::codec::WireValue;
use crate::network::protocol::NetworkItem;
use crate::text::parts::{MessageBuilder, MessagePart};

/// A hint about where one item is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hint {
    /// Slot the item belongs to.
    pub receiving_player: SlotId,
    /// Slot whose world holds the location.
    pub finding_player: SlotId,
    /// Location of the item.
    pub location: LocationId,
    /// Item id.
    pub item: ItemId,
    /// Whether the location has been checked.
    pub found: bool,
    /// Entrance to reach the location, if the world randomizes them.
    #[serde(default)]
    pub entrance: String,
    /// Item classification.
    #[serde(default)]
    pub item_flags: ItemFlags,
}

impl Hint {
    /// The same hint with `found` refreshed from `checks`.
    ///
    /// A found hint is returned unchanged.
    pub fn re_check(&self, checks: &dyn CheckState, team: TeamId) -> Hint {
        if self.found {
            return self.clone();
        }
        let found = checks.is_checked(team, self.finding_player, self.location);
        if !found {
            return self.clone();
        }
        Hint { found: true, ..self.clone() }
    }

    /// Item stays in the finder's own world.
    pub fn is_local(&self) -> bool {
        self.receiving_player == self.finding_player
    }

    /// Text log rendering.
    pub fn message_parts(&self) -> Vec<MessagePart> {
        let builder = MessageBuilder::new()
            .text("[Hint]: ")
            .player(self.receiving_player)
            .text("'s ")
            .item(self.item, self.receiving_player, self.item_flags)
            .text(" is at ")
            .location(self.location, self.finding_player)
            .text(" in ")
            .player(self.finding_player);

        let builder = if self.entrance.is_empty() {
            builder.text("'s World")
        } else {
            builder.text("'s World at ").entrance(&self.entrance)
        };

        let builder = builder.text(". ");
        if self.found {
            builder.colored("(found)", "green").build()
        } else {
            builder.colored("(not found)", "red").build()
        }
    }

    /// The `PrintJSON` message announcing this hint.
    pub fn as_network_message(&self) -> WireValue {
        let data = self.message_parts().iter().map(MessagePart::to_wire).collect::<Vec<_>>();
        WireValue::map([
            ("cmd", WireValue::from("PrintJSON")),
            ("data", WireValue::List(data)),
            ("type", WireValue::from("Hint")),
            ("receiving", WireValue::from(self.receiving_player.0)),
            (
                "item",
                WireValue::Item(NetworkItem {
                    item: self.item,
                    location: self.location,
                    player: self.finding_player,
                    flags: self.item_flags,
                }),
            ),
            ("found", WireValue::from(self.found)),
        ])
    }

    /// Class-tagged wire form.
    pub fn to_wire(&self) -> WireValue {
        WireValue::Tagged {
            class: "Hint",
            fields: BTreeMap::from([
                ("receiving_player".to_string(), WireValue::from(self.receiving_player.0)),
                ("finding_player".to_string(), WireValue::from(self.finding_player.0)),
                ("location".to_string(), WireValue::Int(self.location.0)),
                ("item".to_string(), WireValue::Int(self.item.0)),
                ("found".to_string(), WireValue::from(self.found)),
                ("entrance".to_string(), WireValue::from(self.entrance.as_str())),
                ("item_flags".to_string(), WireValue::Int(i64::from(self.item_flags.bits()))),
            ]),
        }
    }

    fn identity(&self) -> (SlotId, SlotId, LocationId, ItemId, &str) {
        (
            self.receiving_player,
            self.finding_player,
            self.location,
            self.item,
            &self.entrance,
        )
    }
}

impl PartialEq for Hint {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Hint {}

impl Hash for Hint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checks::CheckTable;
    use crate::text::parts::PartKind;
    use std::collections::HashSet;

    fn hint() -> Hint {
        Hint {
            receiving_player: SlotId(1),
            finding_player: SlotId(2),
            location: LocationId(200),
            item: ItemId(7),
            found: false,
            entrance: String::new(),
            item_flags: ItemFlags::ADVANCEMENT,
        }
    }

    #[test]
    fn test_re_check_sets_found() {
        let mut checks = CheckTable::new();
        let team = TeamId(0);
        assert!(!hint().re_check(&checks, team).found);

        checks.record(team, SlotId(2), LocationId(200));
        assert!(hint().re_check(&checks, team).found);
        assert!(!hint().re_check(&checks, TeamId(1)).found);
    }

    #[test]
    fn test_re_check_never_unfinds() {
        let found = Hint { found: true, ..hint() };
        let empty = CheckTable::new();
        assert!(found.re_check(&empty, TeamId(0)).found);
    }

    #[test]
    fn test_identity_ignores_found_and_flags() {
        let a = hint();
        let b = Hint { found: true, item_flags: ItemFlags::TRAP, ..hint() };
        assert_eq!(a, b);

        let set: HashSet<Hint> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);

        let c = Hint { entrance: "Cave".into(), ..hint() };
        assert_ne!(hint(), c);
    }

    #[test]
    fn test_is_local() {
        assert!(!hint().is_local());
        assert!(Hint { finding_player: SlotId(1), ..hint() }.is_local());
    }

    #[test]
    fn test_message_parts() {
        let parts = hint().message_parts();
        let text: String = parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(text, "[Hint]: 1's 7 is at 200 in 2's World. (not found)");
        assert_eq!(parts.last().unwrap().color.as_deref(), Some("red"));

        let parts = Hint { entrance: "Cave".into(), found: true, ..hint() }.message_parts();
        assert!(parts.iter().any(|p| p.kind == PartKind::EntranceName && p.text == "Cave"));
        assert_eq!(parts.last().unwrap().text, "(found)");
    }

    #[test]
    fn test_network_message() {
        let message = hint().as_network_message();
        assert_eq!(message.get("cmd").and_then(WireValue::as_str), Some("PrintJSON"));
        assert_eq!(message.get("type").and_then(WireValue::as_str), Some("Hint"));
        assert_eq!(message.get("receiving").and_then(WireValue::as_i64), Some(1));
        assert_eq!(message.get("found"), Some(&WireValue::Bool(false)));
        assert!(matches!(
            message.get("item"),
            Some(WireValue::Item(item)) if item.player == SlotId(2) && item.location == LocationId(200)
        ));
    }

    #[test]
    fn test_wire_tag_is_not_decodable() {
        let text = crate::network::codec::encode(&hint().to_wire());
        assert!(text.contains(r#""class":"Hint""#));
        assert!(matches!(crate::network::codec::decode(&text).unwrap(), WireValue::Map(_)));
    }
}
