//! Wire Codec
//!
//! Compact JSON with class-tagged shapes.
//!
//! Encoding replaces every typed shape with a plain object of its fields plus
//! a `"class"` discriminator. Decoding parses to a generic tree and rebuilds
//! only shapes registered in a [`WireRegistry`]: undeclared fields are
//! dropped, missing required fields are errors, and unknown or absent
//! discriminators leave the object as untyped data. Nothing outside the
//! registry can ever be constructed from peer input.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::network::protocol::{NetworkItem, NetworkPlayer, NetworkSlot, Version};

/// Object key carrying the shape discriminator.
pub const CLASS_KEY: &str = "class";

// =============================================================================
// VALUES
// =============================================================================

/// A value as exchanged with peers.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// JSON null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Non-integer (or out of `i64` range) number.
    Float(f64),
    /// String.
    Str(String),
    /// Sequence (lists, tuples and sets all travel as arrays).
    List(Vec<WireValue>),
    /// Untyped object.
    Map(BTreeMap<String, WireValue>),
    /// `NetworkPlayer` shape.
    Player(NetworkPlayer),
    /// `NetworkItem` shape.
    Item(NetworkItem),
    /// `NetworkSlot` shape.
    Slot(NetworkSlot),
    /// `Version` shape.
    Version(Version),
    /// Outbound-only shape (e.g. hints): tagged on encode, never rebuilt on decode.
    Tagged {
        /// Discriminator.
        class: &'static str,
        /// Field values.
        fields: BTreeMap<String, WireValue>,
    },
}

impl WireValue {
    /// Build an untyped object from `(key, value)` pairs.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, WireValue)>) -> Self {
        WireValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert any serde value into an untyped tree. Never rebuilds shapes.
    pub fn untyped(value: Value) -> Self {
        match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(b),
            Value::Number(n) => number(&n),
            Value::String(s) => WireValue::Str(s),
            Value::Array(items) => WireValue::List(items.into_iter().map(WireValue::untyped).collect()),
            Value::Object(obj) => WireValue::Map(
                obj.into_iter().map(|(k, v)| (k, WireValue::untyped(v))).collect(),
            ),
        }
    }

    /// Member of an object-like value (untyped maps and tagged shapes).
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Map(map) => map.get(key),
            WireValue::Tagged { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Elements, if this is a list.
    pub fn as_list(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::List(items) => Some(items),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(*b),
            WireValue::Int(i) => Value::Number((*i).into()),
            WireValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            WireValue::Str(s) => Value::String(s.clone()),
            WireValue::List(items) => Value::Array(items.iter().map(WireValue::to_json).collect()),
            WireValue::Map(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            WireValue::Player(p) => tagged("NetworkPlayer", [
                ("team", Value::from(p.team.0)),
                ("slot", Value::from(p.slot.0)),
                ("alias", Value::from(p.alias.as_str())),
                ("name", Value::from(p.name.as_str())),
            ]),
            WireValue::Item(i) => tagged("NetworkItem", [
                ("item", Value::from(i.item.0)),
                ("location", Value::from(i.location.0)),
                ("player", Value::from(i.player.0)),
                ("flags", Value::from(i.flags.0)),
            ]),
            WireValue::Slot(s) => tagged("NetworkSlot", [
                ("name", Value::from(s.name.as_str())),
                ("game", Value::from(s.game.as_str())),
                ("type", Value::from(u8::from(s.slot_type))),
                (
                    "group_members",
                    Value::Array(s.group_members.iter().map(|m| Value::from(m.0)).collect()),
                ),
            ]),
            WireValue::Version(v) => tagged("Version", [
                ("major", Value::from(v.major)),
                ("minor", Value::from(v.minor)),
                ("build", Value::from(v.build)),
            ]),
            WireValue::Tagged { class, fields } => {
                let mut obj: Map<String, Value> =
                    fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                obj.insert(CLASS_KEY.to_string(), Value::from(*class));
                Value::Object(obj)
            }
        }
    }
}

fn number(n: &Number) -> WireValue {
    match n.as_i64() {
        Some(i) => WireValue::Int(i),
        None => WireValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn tagged<const N: usize>(class: &str, fields: [(&str, Value); N]) -> Value {
    let mut obj: Map<String, Value> =
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    obj.insert(CLASS_KEY.to_string(), Value::from(class));
    Value::Object(obj)
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for WireValue {
            fn from(v: $ty) -> Self {
                WireValue::$variant(v.into())
            }
        })*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    u32 => Int,
    String => Str,
    &str => Str,
    Vec<WireValue> => List,
    NetworkPlayer => Player,
    NetworkItem => Item,
    NetworkSlot => Slot,
    Version => Version,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input is not valid JSON.
    #[error("malformed wire data: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A registered shape lacks a required field.
    #[error("{shape} is missing required field `{field}`")]
    MissingField {
        /// Shape discriminator.
        shape: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// A registered shape has a field of the wrong type.
    #[error("{shape}.{field}: {reason}")]
    InvalidField {
        /// Shape discriminator.
        shape: &'static str,
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}

// =============================================================================
// ENCODE
// =============================================================================

/// Encode to compact JSON.
pub fn encode(value: &WireValue) -> String {
    value.to_json().to_string()
}

// =============================================================================
// DECODE
// =============================================================================

/// Rebuilds one shape from its raw object.
pub type ShapeDecoder = fn(&Map<String, Value>) -> Result<WireValue, CodecError>;

/// Closed set of shapes that may be rebuilt from peer input.
#[derive(Clone, Debug, Default)]
pub struct WireRegistry {
    decoders: BTreeMap<&'static str, ShapeDecoder>,
}

impl WireRegistry {
    /// Registry with nothing allowed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The protocol's standard allowlist.
    pub fn standard() -> Self {
        Self::empty()
            .with("NetworkPlayer", decode_player)
            .with("NetworkItem", decode_item)
            .with("NetworkSlot", decode_slot)
            .with("Version", decode_version)
    }

    /// Allow one more shape (builder pattern).
    #[must_use]
    pub fn with(mut self, class: &'static str, decoder: ShapeDecoder) -> Self {
        self.decoders.insert(class, decoder);
        self
    }

    /// Is `class` on the allowlist?
    pub fn allows(&self, class: &str) -> bool {
        self.decoders.contains_key(class)
    }

    /// Decode JSON text.
    pub fn decode(&self, input: &str) -> Result<WireValue, CodecError> {
        let tree: Value = serde_json::from_str(input).map_err(|e| {
            debug!("Rejected malformed wire data: {}", e);
            CodecError::Malformed(e)
        })?;
        self.rebuild(tree)
    }

    /// Decode JSON bytes.
    pub fn decode_slice(&self, input: &[u8]) -> Result<WireValue, CodecError> {
        let tree: Value = serde_json::from_slice(input).map_err(|e| {
            debug!("Rejected malformed wire data: {}", e);
            CodecError::Malformed(e)
        })?;
        self.rebuild(tree)
    }

    fn rebuild(&self, value: Value) -> Result<WireValue, CodecError> {
        match value {
            Value::Array(items) => Ok(WireValue::List(
                items.into_iter().map(|v| self.rebuild(v)).collect::<Result<_, _>>()?,
            )),
            Value::Object(obj) => {
                let decoder = obj
                    .get(CLASS_KEY)
                    .and_then(Value::as_str)
                    .and_then(|class| self.decoders.get(class));
                match decoder {
                    Some(decode) => decode(&obj).inspect_err(|e| debug!("Rejected shape: {}", e)),
                    None => Ok(WireValue::Map(
                        obj.into_iter()
                            .map(|(k, v)| Ok((k, self.rebuild(v)?)))
                            .collect::<Result<_, CodecError>>()?,
                    )),
                }
            }
            other => Ok(WireValue::untyped(other)),
        }
    }
}

/// Decode with the standard allowlist.
pub fn decode(input: &str) -> Result<WireValue, CodecError> {
    standard_registry().decode(input)
}

/// Decode bytes with the standard allowlist.
pub fn decode_slice(input: &[u8]) -> Result<WireValue, CodecError> {
    standard_registry().decode_slice(input)
}

fn standard_registry() -> &'static WireRegistry {
    static REGISTRY: OnceLock<WireRegistry> = OnceLock::new();
    REGISTRY.get_or_init(WireRegistry::standard)
}

// =============================================================================
// SHAPE DECODERS
// =============================================================================

fn required<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    shape: &'static str,
    field: &'static str,
) -> Result<T, CodecError> {
    let value = obj.get(field).ok_or(CodecError::MissingField { shape, field })?;
    convert(value, shape, field)
}

fn defaulted<T: DeserializeOwned + Default>(
    obj: &Map<String, Value>,
    shape: &'static str,
    field: &'static str,
) -> Result<T, CodecError> {
    match obj.get(field) {
        Some(value) => convert(value, shape, field),
        None => Ok(T::default()),
    }
}

fn convert<T: DeserializeOwned>(
    value: &Value,
    shape: &'static str,
    field: &'static str,
) -> Result<T, CodecError> {
    T::deserialize(value).map_err(|e| CodecError::InvalidField {
        shape,
        field,
        reason: e.to_string(),
    })
}

fn decode_player(obj: &Map<String, Value>) -> Result<WireValue, CodecError> {
    const SHAPE: &str = "NetworkPlayer";
    Ok(WireValue::Player(NetworkPlayer {
        team: required(obj, SHAPE, "team")?,
        slot: required(obj, SHAPE, "slot")?,
        alias: required(obj, SHAPE, "alias")?,
        name: required(obj, SHAPE, "name")?,
    }))
}

fn decode_item(obj: &Map<String, Value>) -> Result<WireValue, CodecError> {
    const SHAPE: &str = "NetworkItem";
    Ok(WireValue::Item(NetworkItem {
        item: required(obj, SHAPE, "item")?,
        location: required(obj, SHAPE, "location")?,
        player: required(obj, SHAPE, "player")?,
        flags: defaulted(obj, SHAPE, "flags")?,
    }))
}

fn decode_slot(obj: &Map<String, Value>) -> Result<WireValue, CodecError> {
    const SHAPE: &str = "NetworkSlot";
    Ok(WireValue::Slot(NetworkSlot {
        name: required(obj, SHAPE, "name")?,
        game: required(obj, SHAPE, "game")?,
        slot_type: required(obj, SHAPE, "type")?,
        group_members: defaulted(obj, SHAPE, "group_members")?,
    }))
}

/// Versions from .NET peers arrive as `Major`/`Minor`/`Build`, sometimes as strings.
fn decode_version(obj: &Map<String, Value>) -> Result<WireValue, CodecError> {
    const SHAPE: &str = "Version";
    let lowered: BTreeMap<String, &Value> =
        obj.iter().map(|(k, v)| (k.to_lowercase(), v)).collect();

    let part = |field: &'static str| -> Result<u32, CodecError> {
        let value = lowered.get(field).ok_or(CodecError::MissingField { shape: SHAPE, field })?;
        let invalid = |reason: String| CodecError::InvalidField { shape: SHAPE, field, reason };
        match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid(format!("expected a non-negative integer, got {}", n))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|e| invalid(format!("{:?}: {}", s, e))),
            other => Err(invalid(format!("expected an integer, got {}", other))),
        }
    };

    Ok(WireValue::Version(Version {
        major: part("major")?,
        minor: part("minor")?,
        build: part("build")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId, TeamId};
    use crate::network::protocol::SlotType;

    fn item() -> NetworkItem {
        NetworkItem {
            item: ItemId(77),
            location: LocationId(1000),
            player: SlotId(2),
            flags: ItemFlags::USEFUL,
        }
    }

    #[test]
    fn test_encode_is_compact_and_tagged() {
        let msg = WireValue::map([("cmd", WireValue::from("ReceivedItems")), (
            "items",
            WireValue::List(vec![item().into()]),
        )]);
        let text = encode(&msg);
        assert!(!text.contains(' '));
        assert!(!text.contains('\n'));

        let tree: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(tree["items"][0]["class"], "NetworkItem");
        assert_eq!(tree["items"][0]["flags"], 2);
    }

    #[test]
    fn test_decode_rebuilds_nested_shapes() {
        let text = encode(&WireValue::map([(
            "players",
            WireValue::List(vec![WireValue::Player(NetworkPlayer {
                team: TeamId(0),
                slot: SlotId(1),
                alias: "Al".into(),
                name: "Alice".into(),
            })]),
        )]));

        let decoded = decode(&text).unwrap();
        let players = decoded.get("players").and_then(WireValue::as_list).unwrap();
        assert!(matches!(&players[0], WireValue::Player(p) if p.name == "Alice"));
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let decoded = decode(
            r#"{"class":"NetworkItem","item":1,"location":2,"player":3,"flags":1,"evil":"rm -rf"}"#,
        )
        .unwrap();
        assert_eq!(
            decoded,
            WireValue::Item(NetworkItem {
                item: ItemId(1),
                location: LocationId(2),
                player: SlotId(3),
                flags: ItemFlags::ADVANCEMENT,
            })
        );
    }

    #[test]
    fn test_missing_field_names_shape_and_field() {
        let err = decode(r#"{"class":"NetworkPlayer","team":0,"slot":1,"name":"x"}"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingField { shape: "NetworkPlayer", field: "alias" }
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let decoded = decode(r#"{"class":"NetworkItem","item":1,"location":2,"player":3}"#).unwrap();
        assert!(matches!(decoded, WireValue::Item(i) if i.flags == ItemFlags::NONE));

        let decoded = decode(r#"{"class":"NetworkSlot","name":"G","game":"Archipelago","type":2}"#)
            .unwrap();
        assert!(matches!(
            decoded,
            WireValue::Slot(s) if s.slot_type == SlotType::Group && s.group_members.is_empty()
        ));
    }

    #[test]
    fn test_unknown_class_stays_untyped() {
        let decoded = decode(r#"{"class":"os.system","arg":"boom"}"#).unwrap();
        assert_eq!(decoded.get("class").and_then(WireValue::as_str), Some("os.system"));
        assert_eq!(decoded.get("arg").and_then(WireValue::as_str), Some("boom"));

        let decoded = decode(r#"{"class":"Hint","found":true}"#).unwrap();
        assert!(matches!(decoded, WireValue::Map(_)));
    }

    #[test]
    fn test_version_any_case() {
        let decoded = decode(r#"{"class":"Version","Major":0,"Minor":"5","Build":1}"#).unwrap();
        assert_eq!(decoded, WireValue::Version(Version::new(0, 5, 1)));

        let err = decode(r#"{"class":"Version","major":0,"minor":-1,"build":1}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field: "minor", .. }));
    }

    #[test]
    fn test_wrong_field_type() {
        let err = decode(r#"{"class":"NetworkItem","item":"x","location":2,"player":3}"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { shape: "NetworkItem", field: "item", .. }));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(decode("{\"cmd\":"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode_slice(b"\xff"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_empty_registry_rebuilds_nothing() {
        let registry = WireRegistry::empty();
        assert!(!registry.allows("NetworkItem"));
        let decoded = registry
            .decode(r#"{"class":"NetworkItem","item":1,"location":2,"player":3}"#)
            .unwrap();
        assert!(matches!(decoded, WireValue::Map(_)));
    }
}
