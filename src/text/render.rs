//! Rich-Text Renderer
//!
//! Turns message parts into terminal text. Ids are resolved to names via a
//! [`NameLookup`]; colours come from a fixed palette. Every coloured span is
//! closed with an explicit reset, so nested or adjacent spans never bleed.
//! The raw variant drops all escape codes for non-terminal consumers.

use thiserror::Error;

use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId};
use crate::text::parts::{MessagePart, PartKind};

// =============================================================================
// PALETTE
// =============================================================================

/// Colour names used by the built-in part handlers.
pub mod palette {
    /// Own player.
    pub const SELF_PLAYER: &str = "magenta";
    /// Other players.
    pub const OTHER_PLAYER: &str = "yellow";
    /// Items with no flags (or unknown flags).
    pub const ITEM_FILLER: &str = "cyan";
    /// Advancement items.
    pub const ITEM_ADVANCEMENT: &str = "plum";
    /// Useful items.
    pub const ITEM_USEFUL: &str = "slateblue";
    /// Trap items.
    pub const ITEM_TRAP: &str = "salmon";
    /// Locations.
    pub const LOCATION: &str = "green";
    /// Entrances.
    pub const ENTRANCE: &str = "blue";
}

/// Approximate hex values for every palette name (not exact, but readable).
const HEX_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("red", 0xEE0000),
    ("green", 0x00FF7F),
    ("yellow", 0xFAFAD2),
    ("blue", 0x6495ED),
    ("magenta", 0xEE00EE),
    ("cyan", 0x00EEEE),
    ("slateblue", 0x6D8BE8),
    ("plum", 0xAF99EF),
    ("salmon", 0xFA8072),
    ("white", 0xFFFFFF),
    ("orange", 0xFF7700),
];

/// SGR codes for basic terminal colours and styles.
const ANSI_CODES: &[(&str, u8)] = &[
    ("reset", 0),
    ("bold", 1),
    ("underline", 4),
    ("black", 30),
    ("red", 31),
    ("green", 32),
    ("yellow", 33),
    ("blue", 34),
    ("magenta", 35),
    ("cyan", 36),
    ("white", 37),
    ("black_bg", 40),
    ("red_bg", 41),
    ("green_bg", 42),
    ("yellow_bg", 43),
    ("blue_bg", 44),
    ("magenta_bg", 45),
    ("cyan_bg", 46),
    ("white_bg", 47),
];

/// Hex value of a palette colour.
pub fn hex_color(name: &str) -> Option<u32> {
    HEX_COLORS.iter().find(|(n, _)| *n == name).map(|&(_, hex)| hex)
}

/// SGR parameter string for one colour/style name.
///
/// Basic names map to their 3/4-bit code; palette-only names fall back to a
/// 24-bit foreground. Unknown names yield `None`.
fn sgr_params(name: &str) -> Option<String> {
    if let Some(&(_, code)) = ANSI_CODES.iter().find(|(n, _)| *n == name) {
        return Some(code.to_string());
    }
    hex_color(name).map(|hex| {
        format!("38;2;{};{};{}", (hex >> 16) & 0xFF, (hex >> 8) & 0xFF, hex & 0xFF)
    })
}

/// Escape sequence selecting all known `names`; unknown names are skipped.
pub fn color_code(names: &[&str]) -> String {
    let params: Vec<String> = names.iter().filter_map(|n| sgr_params(n)).collect();
    if params.is_empty() {
        return String::new();
    }
    format!("\x1b[{}m", params.join(";"))
}

/// Escape sequence that clears all attributes.
pub const RESET: &str = "\x1b[0m";

/// Wrap `text` in `names` and a trailing reset.
pub fn colorize(text: &str, names: &[&str]) -> String {
    format!("{}{}{}", color_code(names), text, RESET)
}

/// Colour bucket for an item: advancement > useful > trap > filler.
pub fn item_color(flags: ItemFlags) -> &'static str {
    if flags.is_advancement() {
        palette::ITEM_ADVANCEMENT
    } else if flags.is_useful() {
        palette::ITEM_USEFUL
    } else if flags.is_trap() {
        palette::ITEM_TRAP
    } else {
        palette::ITEM_FILLER
    }
}

// =============================================================================
// NAME LOOKUP
// =============================================================================

/// Name resolution supplied by game-data configuration.
pub trait NameLookup {
    /// Name of `item` as interpreted by `owner`'s game.
    fn item_name(&self, item: ItemId, owner: SlotId) -> String;

    /// Name of `location` in `owner`'s world.
    fn location_name(&self, location: LocationId, owner: SlotId) -> String;

    /// Display name of a slot.
    fn player_name(&self, slot: SlotId) -> String {
        format!("Player {}", slot)
    }

    /// Slot the output is rendered for, if any (highlighted differently).
    fn viewing_slot(&self) -> Option<SlotId> {
        None
    }
}

/// Rendering errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An id part whose text is not an integer.
    #[error("{kind:?} part has non-numeric id {text:?}")]
    InvalidId {
        /// Part kind.
        kind: PartKind,
        /// Offending text.
        text: String,
    },

    /// An item/location id part without an owning player.
    #[error("{0:?} part is missing its owning player")]
    MissingPlayer(PartKind),
}

// =============================================================================
// RENDERER
// =============================================================================

/// Message part renderer.
pub struct Renderer<'a, L: NameLookup + ?Sized> {
    names: &'a L,
    raw: bool,
}

impl<'a, L: NameLookup + ?Sized> Renderer<'a, L> {
    /// Colour-capable terminal output.
    pub fn new(names: &'a L) -> Self {
        Self { names, raw: false }
    }

    /// Plain output with no escape codes.
    pub fn raw(names: &'a L) -> Self {
        Self { names, raw: true }
    }

    /// Render all parts, concatenated.
    pub fn render(&self, parts: &[MessagePart]) -> Result<String, RenderError> {
        let mut out = String::new();
        for part in parts {
            self.render_part(part, &mut out)?;
        }
        Ok(out)
    }

    fn render_part(&self, part: &MessagePart, out: &mut String) -> Result<(), RenderError> {
        match &part.kind {
            PartKind::Text | PartKind::Unknown(_) => out.push_str(&part.text),
            PartKind::Color => {
                let color = part.color.as_deref().unwrap_or("");
                self.write_colored(out, &part.text, color);
            }
            PartKind::PlayerId => {
                let slot = SlotId(parse_id(part)?);
                let color = if self.names.viewing_slot() == Some(slot) {
                    palette::SELF_PLAYER
                } else {
                    palette::OTHER_PLAYER
                };
                self.write_colored(out, &self.names.player_name(slot), color);
            }
            PartKind::PlayerName => self.write_colored(out, &part.text, palette::OTHER_PLAYER),
            PartKind::ItemName => self.write_item(out, &part.text, part.flags.unwrap_or_default()),
            PartKind::ItemId => {
                let item = ItemId(parse_id(part)?);
                let owner = part.player.ok_or(RenderError::MissingPlayer(part.kind.clone()))?;
                let name = self.names.item_name(item, owner);
                self.write_item(out, &name, part.flags.unwrap_or_default());
            }
            PartKind::LocationName => self.write_colored(out, &part.text, palette::LOCATION),
            PartKind::LocationId => {
                let location = LocationId(parse_id(part)?);
                let owner = part.player.ok_or(RenderError::MissingPlayer(part.kind.clone()))?;
                let name = self.names.location_name(location, owner);
                self.write_colored(out, &name, palette::LOCATION);
            }
            PartKind::EntranceName => self.write_colored(out, &part.text, palette::ENTRANCE),
        }
        Ok(())
    }

    fn write_item(&self, out: &mut String, name: &str, flags: ItemFlags) {
        self.write_colored(out, name, item_color(flags));
    }

    fn write_colored(&self, out: &mut String, text: &str, color: &str) {
        if self.raw {
            out.push_str(text);
            return;
        }
        let names: Vec<&str> = color.split(';').collect();
        out.push_str(&color_code(&names));
        out.push_str(text);
        out.push_str(RESET);
    }
}

fn parse_id<T: std::str::FromStr>(part: &MessagePart) -> Result<T, RenderError> {
    part.text.trim().parse().map_err(|_| RenderError::InvalidId {
        kind: part.kind.clone(),
        text: part.text.clone(),
    })
}

/// Render `parts`, with colour unless `raw`.
pub fn render<L: NameLookup + ?Sized>(
    parts: &[MessagePart],
    names: &L,
    raw: bool,
) -> Result<String, RenderError> {
    if raw {
        Renderer::raw(names).render(parts)
    } else {
        Renderer::new(names).render(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::parts::MessageBuilder;

    struct Names;

    impl NameLookup for Names {
        fn item_name(&self, item: ItemId, owner: SlotId) -> String {
            format!("item{}@{}", item, owner)
        }

        fn location_name(&self, location: LocationId, owner: SlotId) -> String {
            format!("loc{}@{}", location, owner)
        }

        fn player_name(&self, slot: SlotId) -> String {
            ["server", "Alice", "Bob"][slot.0 as usize].to_string()
        }

        fn viewing_slot(&self) -> Option<SlotId> {
            Some(SlotId(1))
        }
    }

    #[test]
    fn test_item_id_uses_advancement_bucket() {
        let parts: Vec<MessagePart> = serde_json::from_str(
            r#"[{"text": "5", "type": "item_id", "player": 2, "flags": 1}]"#,
        )
        .unwrap();

        let out = Renderer::new(&Names).render(&parts).unwrap();
        assert_eq!(out, colorize("item5@2", &[palette::ITEM_ADVANCEMENT]));
        assert!(out.starts_with("\x1b[38;2;175;153;239m"));
    }

    #[test]
    fn test_item_bucket_precedence() {
        assert_eq!(item_color(ItemFlags(0b111)), palette::ITEM_ADVANCEMENT);
        assert_eq!(item_color(ItemFlags(0b110)), palette::ITEM_USEFUL);
        assert_eq!(item_color(ItemFlags(0b100)), palette::ITEM_TRAP);
        assert_eq!(item_color(ItemFlags(0)), palette::ITEM_FILLER);
        assert_eq!(item_color(ItemFlags(0b1000)), palette::ITEM_FILLER);
    }

    #[test]
    fn test_player_id_highlights_viewer() {
        let parts = MessageBuilder::new().player(SlotId(1)).text(" & ").player(SlotId(2)).build();
        let out = Renderer::new(&Names).render(&parts).unwrap();
        assert_eq!(out, "\x1b[35mAlice\x1b[0m & \x1b[33mBob\x1b[0m");
    }

    #[test]
    fn test_raw_strips_markup() {
        let parts = MessageBuilder::new()
            .text("[Hint]: ")
            .item(ItemId(7), SlotId(1), ItemFlags::TRAP)
            .text(" at ")
            .location(LocationId(3), SlotId(2))
            .colored("(found)", "green")
            .build();
        let out = render(&parts, &Names, true).unwrap();
        assert_eq!(out, "[Hint]: item7@1 at loc3@2(found)");
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn test_color_always_resets() {
        let parts = vec![MessagePart {
            text: "x".into(),
            kind: PartKind::Color,
            color: Some("red;bold;nonsense".into()),
            ..Default::default()
        }];
        let out = Renderer::new(&Names).render(&parts).unwrap();
        assert_eq!(out, "\x1b[31;1mx\x1b[0m");

        let unknown = vec![MessagePart {
            text: "y".into(),
            kind: PartKind::Color,
            color: Some("nonsense".into()),
            ..Default::default()
        }];
        assert_eq!(Renderer::new(&Names).render(&unknown).unwrap(), "y\x1b[0m");
    }

    #[test]
    fn test_unknown_kind_falls_back_to_text() {
        let parts = vec![MessagePart::typed("plain", PartKind::Unknown("hint_status".into()))];
        assert_eq!(Renderer::new(&Names).render(&parts).unwrap(), "plain");
    }

    #[test]
    fn test_bad_ids_are_errors() {
        let parts = vec![MessagePart::typed("abc", PartKind::ItemId)];
        assert!(matches!(
            Renderer::new(&Names).render(&parts),
            Err(RenderError::InvalidId { .. })
        ));

        let parts = vec![MessagePart::typed("4", PartKind::LocationId)];
        assert_eq!(
            Renderer::new(&Names).render(&parts),
            Err(RenderError::MissingPlayer(PartKind::LocationId))
        );
    }
}
