//! Hint Payloads
//!
//! The information a triggerable hint carries, and how it is projected for
//! release (e.g. only locations already checked count towards a total).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::checks::CheckState;
use crate::core::ids::{LocationId, SlotId, TeamId};
use crate::hints::InvariantViolation;
use crate::network::codec::WireValue;
use crate::text::parts::{MessageBuilder, MessagePart};

// =============================================================================
// KINDS AND IDENTITY
// =============================================================================

/// Hint kind, as reported to clients when their hints of that kind change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HintKind {
    /// [`TextHint`].
    TextHint,
    /// [`LocationSetHint`].
    LocationSetHint,
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintKind::TextHint => write!(f, "TextHint"),
            HintKind::LocationSetHint => write!(f, "LocationSetHint"),
        }
    }
}

/// Identity of a payload for per-team bookkeeping.
///
/// Location sets are identified by which locations they track, not by the
/// points or detail attached to each.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HintKey {
    /// Text hint identity.
    Text {
        /// Recipient.
        player: SlotId,
        /// Text.
        text: String,
    },
    /// Location set identity.
    LocationSet {
        /// Owner.
        player: SlotId,
        /// Label.
        label: String,
        /// Semantics.
        set_kind: SetKind,
        /// Total points.
        total_value: i64,
        /// Tracked locations, ascending.
        locations: Vec<LocationId>,
    },
}

// =============================================================================
// TEXT HINT
// =============================================================================

/// Free-form text for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextHint {
    /// Recipient.
    pub player: SlotId,
    /// Text shown.
    pub text: String,
}

impl TextHint {
    /// Create a text hint.
    pub fn new(player: SlotId, text: impl Into<String>) -> Self {
        Self { player, text: text.into() }
    }
}

// =============================================================================
// LOCATION SET HINT
// =============================================================================

/// What a [`LocationSetHint`] counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetKind {
    /// Points of items in a region.
    RegionItems,
    /// Points of hints in a region.
    RegionHints,
}

impl SetKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            SetKind::RegionItems => "region_items",
            SetKind::RegionHints => "region_hints",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            SetKind::RegionItems => "items, ",
            SetKind::RegionHints => "hints, ",
        }
    }
}

impl FromStr for SetKind {
    type Err = InvariantViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "region_items" => Ok(SetKind::RegionItems),
            "region_hints" => Ok(SetKind::RegionHints),
            other => Err(InvariantViolation::UnknownSetKind(other.to_string())),
        }
    }
}

impl Serialize for SetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SetKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Point value of one tracked location plus whatever the game wants clients to see once found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, serde_json::Value)", into = "(i64, serde_json::Value)")]
pub struct LocationValue {
    /// Points this location contributes.
    pub points: i64,
    /// Extra tracking data (item, receiving player, ...).
    pub detail: serde_json::Value,
}

impl LocationValue {
    /// Create a location value.
    pub fn new(points: i64, detail: serde_json::Value) -> Self {
        Self { points, detail }
    }
}

impl From<(i64, serde_json::Value)> for LocationValue {
    fn from((points, detail): (i64, serde_json::Value)) -> Self {
        Self { points, detail }
    }
}

impl From<LocationValue> for (i64, serde_json::Value) {
    fn from(v: LocationValue) -> Self {
        (v.points, v.detail)
    }
}

/// A set of locations in one world with a point total.
///
/// Clients only ever receive the entries for locations already checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSetHint {
    /// Owner of the locations, and recipient.
    pub player: SlotId,
    /// Display label (e.g. a region name).
    pub label: String,
    /// Semantics of the points.
    pub set_kind: SetKind,
    /// Points available across the whole set.
    pub total_value: i64,
    /// Tracked locations.
    pub per_location_data: BTreeMap<LocationId, LocationValue>,
}

impl LocationSetHint {
    /// Points of the locations currently in `per_location_data`.
    pub fn found_points(&self) -> i64 {
        self.per_location_data.values().map(|v| v.points).sum()
    }

    /// Copy restricted to locations `team` has checked.
    pub fn project(&self, checks: &dyn CheckState, team: TeamId) -> LocationSetHint {
        let checked = checks.checked(team, self.player);
        let per_location_data = self
            .per_location_data
            .iter()
            .filter(|(location, _)| checked.is_some_and(|set| set.contains(*location)))
            .map(|(&location, value)| (location, value.clone()))
            .collect();

        LocationSetHint {
            player: self.player,
            label: self.label.clone(),
            set_kind: self.set_kind,
            total_value: self.total_value,
            per_location_data,
        }
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// Any hint that can sit behind a trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HintPayload {
    /// Free-form text.
    TextHint(TextHint),
    /// Location set with points.
    LocationSetHint(LocationSetHint),
}

impl HintPayload {
    /// Kind used for change notifications.
    pub fn kind(&self) -> HintKind {
        match self {
            HintPayload::TextHint(_) => HintKind::TextHint,
            HintPayload::LocationSetHint(_) => HintKind::LocationSetHint,
        }
    }

    /// Identity for bookkeeping.
    pub fn key(&self) -> HintKey {
        match self {
            HintPayload::TextHint(h) => HintKey::Text { player: h.player, text: h.text.clone() },
            HintPayload::LocationSetHint(h) => HintKey::LocationSet {
                player: h.player,
                label: h.label.clone(),
                set_kind: h.set_kind,
                total_value: h.total_value,
                locations: h.per_location_data.keys().copied().collect(),
            },
        }
    }

    /// Slots entitled to see this hint.
    pub fn recipients(&self) -> Vec<SlotId> {
        match self {
            HintPayload::TextHint(h) => vec![h.player],
            HintPayload::LocationSetHint(h) => vec![h.player],
        }
    }

    /// Locations whose checking changes this hint's release data.
    pub fn tracked_locations(&self) -> Vec<(SlotId, LocationId)> {
        match self {
            HintPayload::TextHint(_) => Vec::new(),
            HintPayload::LocationSetHint(h) => {
                h.per_location_data.keys().map(|&location| (h.player, location)).collect()
            }
        }
    }

    /// The copy released to clients for `team`.
    pub fn release_data(&self, checks: &dyn CheckState, team: TeamId) -> HintPayload {
        match self {
            HintPayload::TextHint(h) => HintPayload::TextHint(h.clone()),
            HintPayload::LocationSetHint(h) => HintPayload::LocationSetHint(h.project(checks, team)),
        }
    }

    /// Text log rendering.
    pub fn message_parts(&self) -> Vec<MessagePart> {
        match self {
            HintPayload::TextHint(h) => MessageBuilder::new().text(&h.text).build(),
            HintPayload::LocationSetHint(h) => MessageBuilder::new()
                .text(&h.label)
                .text(" has ")
                .text(h.total_value)
                .text(" points of ")
                .text(h.set_kind.noun())
                .text(h.found_points())
                .text(" found.")
                .build(),
        }
    }

    /// Class-tagged wire form.
    pub fn to_wire(&self) -> WireValue {
        match self {
            HintPayload::TextHint(h) => WireValue::Tagged {
                class: "TextHint",
                fields: BTreeMap::from([
                    ("player".to_string(), WireValue::from(h.player.0)),
                    ("text".to_string(), WireValue::from(h.text.as_str())),
                ]),
            },
            HintPayload::LocationSetHint(h) => {
                let per_location = h
                    .per_location_data
                    .iter()
                    .map(|(location, value)| {
                        (
                            location.to_string(),
                            WireValue::List(vec![
                                WireValue::Int(value.points),
                                WireValue::untyped(value.detail.clone()),
                            ]),
                        )
                    })
                    .collect();
                WireValue::Tagged {
                    class: "LocationSetHint",
                    fields: BTreeMap::from([
                        ("player".to_string(), WireValue::from(h.player.0)),
                        ("label".to_string(), WireValue::from(h.label.as_str())),
                        ("set_kind".to_string(), WireValue::from(h.set_kind.as_str())),
                        ("total_value".to_string(), WireValue::Int(h.total_value)),
                        ("per_location_data".to_string(), WireValue::Map(per_location)),
                    ]),
                }
            }
        }
    }
}

impl From<TextHint> for HintPayload {
    fn from(h: TextHint) -> Self {
        HintPayload::TextHint(h)
    }
}

impl From<LocationSetHint> for HintPayload {
    fn from(h: LocationSetHint) -> Self {
        HintPayload::LocationSetHint(h)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_hints::region;
    use crate::core::checks::CheckTable;
    use crate::text::parts::PartKind;
    use serde_json::json;

    #[test]
    fn test_projection_keeps_only_checked() {
        let hint = region(3);
        let mut checks = CheckTable::new();
        checks.record(TeamId(0), SlotId(3), LocationId(10));

        let projected = hint.project(&checks, TeamId(0));
        assert_eq!(
            projected.per_location_data,
            BTreeMap::from([(LocationId(10), LocationValue::new(5, json!("x")))])
        );
        assert_eq!(projected.found_points(), 5);
        assert_eq!(projected.total_value, 8);

        // Other teams and other slots see nothing.
        assert!(hint.project(&checks, TeamId(1)).per_location_data.is_empty());
    }

    #[test]
    fn test_location_set_message() {
        let mut checks = CheckTable::new();
        checks.record(TeamId(0), SlotId(3), LocationId(20));
        let payload = HintPayload::from(region(3)).release_data(&checks, TeamId(0));

        let text: String = payload.message_parts().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(text, "Forest has 8 points of items, 3 found.");
        assert!(payload.message_parts().iter().all(|p| p.kind == PartKind::Text));
    }

    #[test]
    fn test_identity_follows_tracked_locations() {
        let a = HintPayload::from(region(3));

        let mut revalued = region(3);
        revalued.per_location_data.insert(LocationId(10), LocationValue::new(1, json!(null)));
        assert_eq!(a.key(), HintPayload::from(revalued).key());

        let mut emptied = region(3);
        emptied.per_location_data.clear();
        assert_ne!(a.key(), HintPayload::from(emptied).key());
        assert_ne!(a.key(), HintPayload::from(region(4)).key());
    }

    #[test]
    fn test_unknown_set_kind_rejected() {
        assert!(matches!(
            "region_bosses".parse::<SetKind>(),
            Err(InvariantViolation::UnknownSetKind(kind)) if kind == "region_bosses"
        ));

        let json = r#"{"player":1,"label":"L","set_kind":"nope","total_value":1,"per_location_data":{}}"#;
        assert!(serde_json::from_str::<LocationSetHint>(json).is_err());
    }

    #[test]
    fn test_payload_config_format() {
        let json = r#"{"player":3,"label":"Forest","set_kind":"region_items","total_value":8,"per_location_data":{"10":[5,"x"],"20":[3,"y"]}}"#;
        let hint: LocationSetHint = serde_json::from_str(json).unwrap();
        assert_eq!(hint, region(3));
        let payload = HintPayload::from(hint);
        assert_eq!(
            payload.tracked_locations(),
            vec![(SlotId(3), LocationId(10)), (SlotId(3), LocationId(20))]
        );
    }
}
