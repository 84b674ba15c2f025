//! Message Parts
//!
//! Structured chat/print messages as sent to clients: an ordered list of
//! typed parts. Ids stay ids on the wire; clients resolve names themselves.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId};
use crate::network::codec::WireValue;

/// Kind tag of a message part.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// Plain text.
    #[default]
    Text,
    /// Text wrapped in the colours named by `color`.
    Color,
    /// `text` is a slot id.
    PlayerId,
    /// `text` is already a player name.
    PlayerName,
    /// `text` is already an item name.
    ItemName,
    /// `text` is an item id owned by `player`.
    ItemId,
    /// `text` is already a location name.
    LocationName,
    /// `text` is a location id owned by `player`.
    LocationId,
    /// `text` is an entrance name.
    EntranceName,
    /// Sent by a newer peer; rendered as plain text, relayed with its tag.
    Unknown(String),
}

impl PartKind {
    /// Wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            PartKind::Text => "text",
            PartKind::Color => "color",
            PartKind::PlayerId => "player_id",
            PartKind::PlayerName => "player_name",
            PartKind::ItemName => "item_name",
            PartKind::ItemId => "item_id",
            PartKind::LocationName => "location_name",
            PartKind::LocationId => "location_id",
            PartKind::EntranceName => "entrance_name",
            PartKind::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for PartKind {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => PartKind::Text,
            "color" => PartKind::Color,
            "player_id" => PartKind::PlayerId,
            "player_name" => PartKind::PlayerName,
            "item_name" => PartKind::ItemName,
            "item_id" => PartKind::ItemId,
            "location_name" => PartKind::LocationName,
            "location_id" => PartKind::LocationId,
            "entrance_name" => PartKind::EntranceName,
            other => PartKind::Unknown(other.to_string()),
        }
    }
}

impl Serialize for PartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PartKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(PartKind::from(tag.as_str()))
    }
}

/// One typed part of a message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    /// Display text or id, depending on `kind`.
    #[serde(default)]
    pub text: String,
    /// Part kind; absent means plain text.
    #[serde(rename = "type", default, skip_serializing_if = "is_text")]
    pub kind: PartKind,
    /// `;`-separated colour names (for `Color` parts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Owning slot for item/location ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<SlotId>,
    /// Item classification (for item parts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<ItemFlags>,
}

fn is_text(kind: &PartKind) -> bool {
    *kind == PartKind::Text
}

impl MessagePart {
    /// Plain text part.
    pub fn text(text: impl ToString) -> Self {
        Self { text: text.to_string(), ..Default::default() }
    }

    /// Part of a given kind.
    pub fn typed(text: impl ToString, kind: PartKind) -> Self {
        Self { text: text.to_string(), kind, ..Default::default() }
    }

    /// Wire form, omitting the same fields serde would.
    pub fn to_wire(&self) -> WireValue {
        let mut fields = vec![("text", WireValue::from(self.text.as_str()))];
        if self.kind != PartKind::Text {
            fields.push(("type", WireValue::from(self.kind.as_str())));
        }
        if let Some(color) = &self.color {
            fields.push(("color", WireValue::from(color.as_str())));
        }
        if let Some(player) = self.player {
            fields.push(("player", WireValue::from(player.0)));
        }
        if let Some(flags) = self.flags {
            fields.push(("flags", WireValue::Int(i64::from(flags.bits()))));
        }
        WireValue::map(fields)
    }
}

/// Builder for a message part list.
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    parts: Vec<MessagePart>,
}

impl MessageBuilder {
    /// Start an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plain text.
    #[must_use]
    pub fn text(mut self, text: impl ToString) -> Self {
        self.parts.push(MessagePart::text(text));
        self
    }

    /// Append a slot reference.
    #[must_use]
    pub fn player(mut self, slot: SlotId) -> Self {
        self.parts.push(MessagePart::typed(slot, PartKind::PlayerId));
        self
    }

    /// Append an item id owned by `player`.
    #[must_use]
    pub fn item(mut self, item: ItemId, player: SlotId, flags: ItemFlags) -> Self {
        self.parts.push(MessagePart {
            text: item.to_string(),
            kind: PartKind::ItemId,
            player: Some(player),
            flags: Some(flags),
            ..Default::default()
        });
        self
    }

    /// Append a location id owned by `player`.
    #[must_use]
    pub fn location(mut self, location: LocationId, player: SlotId) -> Self {
        self.parts.push(MessagePart {
            text: location.to_string(),
            kind: PartKind::LocationId,
            player: Some(player),
            ..Default::default()
        });
        self
    }

    /// Append an entrance name.
    #[must_use]
    pub fn entrance(mut self, name: impl ToString) -> Self {
        self.parts.push(MessagePart::typed(name, PartKind::EntranceName));
        self
    }

    /// Append coloured text.
    #[must_use]
    pub fn colored(mut self, text: impl ToString, color: &str) -> Self {
        self.parts.push(MessagePart {
            text: text.to_string(),
            kind: PartKind::Color,
            color: Some(color.to_string()),
            ..Default::default()
        });
        self
    }

    /// Append already-built parts.
    #[must_use]
    pub fn extend(mut self, parts: impl IntoIterator<Item = MessagePart>) -> Self {
        self.parts.extend(parts);
        self
    }

    /// Finish.
    pub fn build(self) -> Vec<MessagePart> {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_omits_type() {
        let json = serde_json::to_string(&MessagePart::text("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);
    }

    #[test]
    fn test_item_part_shape() {
        let parts = MessageBuilder::new()
            .item(ItemId(5), SlotId(2), ItemFlags::ADVANCEMENT)
            .build();
        let json = serde_json::to_value(&parts[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "5", "type": "item_id", "player": 2, "flags": 1})
        );
    }

    #[test]
    fn test_wire_form_matches_serde() {
        let parts = MessageBuilder::new()
            .text("at ")
            .location(LocationId(9), SlotId(1))
            .colored("!", "red;bold")
            .build();
        for part in &parts {
            let via_wire: serde_json::Value =
                serde_json::from_str(&crate::network::codec::encode(&part.to_wire())).unwrap();
            assert_eq!(via_wire, serde_json::to_value(part).unwrap());
        }
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let part: MessagePart =
            serde_json::from_str(r#"{"text":"x","type":"hint_status"}"#).unwrap();
        assert_eq!(part.kind, PartKind::Unknown("hint_status".to_string()));

        let part: MessagePart = serde_json::from_str(r#"{"text":"y"}"#).unwrap();
        assert_eq!(part.kind, PartKind::Text);
    }

    #[test]
    fn test_unknown_kind_relays_its_tag() {
        let json = r#"{"text":"x","type":"hint_status"}"#;
        let part: MessagePart = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&part).unwrap(), json);

        let via_wire: serde_json::Value =
            serde_json::from_str(&crate::network::codec::encode(&part.to_wire())).unwrap();
        assert_eq!(via_wire, serde_json::json!({"text": "x", "type": "hint_status"}));
    }

    #[test]
    fn test_known_tags_are_snake_case() {
        let part = MessagePart::typed("3", PartKind::PlayerId);
        assert_eq!(serde_json::to_value(&part).unwrap()["type"], "player_id");
        assert_eq!(PartKind::from("entrance_name"), PartKind::EntranceName);
    }
}
