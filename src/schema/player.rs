use serde::{Deserialize, Serialize};
use std::fmt;

use super::room::RoomId;

/// Avatar glyphs offered by the character-creation form.
pub const AVATAR_OPTIONS: &[&str] = &[
    "🧙", "⚔️", "🏹", "🗡️", "🛡️", "🔮", "🐉", "🦊", "🧝", "🧛", "👹", "🧟",
];

/// Classes offered by the character-creation form.
pub const CLASS_OPTIONS: &[&str] = &["Wizard", "Warrior", "Ranger", "Rogue", "Cleric", "Bard"];

/// Display colors offered by the character-creation form.
pub const COLOR_OPTIONS: &[&str] = &[
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#06b6d4", "#3b82f6", "#8b5cf6", "#ec4899",
];

/// Globally unique player id. Generated once by the owning process; peers
/// treat it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player record. The creating process owns it; every other process
/// holds a read-only mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub class: String,
    pub hp: u32,
    pub max_hp: u32,
    pub level: u32,
    pub xp: u32,
    #[serde(default)]
    pub inventory: Vec<String>,
    pub room: RoomId,
    pub color: String,
}

impl Player {
    /// "🧙 Alda"
    pub fn tag(&self) -> String {
        format!("{} {}", self.avatar, self.name)
    }
}

/// Input from the character-creation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub name: String,
    pub avatar: String,
    pub class: String,
    pub color: String,
}

impl CharacterSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: AVATAR_OPTIONS[0].to_string(),
            class: CLASS_OPTIONS[0].to_string(),
            color: COLOR_OPTIONS[0].to_string(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Roll a fresh level-1 player from this sheet. Returns `None` if the
    /// trimmed name is empty.
    pub fn into_player(self, start: RoomId, max_hp: u32) -> Option<Player> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Player {
            id: PlayerId::generate(),
            name: name.to_string(),
            avatar: self.avatar,
            class: self.class,
            hp: max_hp,
            max_hp,
            level: 1,
            xp: 0,
            inventory: Vec::new(),
            room: start,
            color: self.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_rolls_level_one_player() {
        let p = CharacterSheet::new("  Alda ")
            .with_class("Rogue")
            .into_player(RoomId::new("town-square"), 100)
            .unwrap();
        assert_eq!(p.name, "Alda");
        assert_eq!(p.class, "Rogue");
        assert_eq!((p.hp, p.max_hp, p.level, p.xp), (100, 100, 1, 0));
        assert!(p.inventory.is_empty());
        assert_eq!(p.room.as_str(), "town-square");
    }

    #[test]
    fn blank_name_rejected() {
        assert!(CharacterSheet::new("   ")
            .into_player(RoomId::new("town-square"), 100)
            .is_none());
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(PlayerId::generate(), PlayerId::generate());
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let p = CharacterSheet::new("Alda")
            .into_player(RoomId::new("tavern"), 80)
            .unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["maxHp"], 80);
        assert_eq!(json["room"], "tavern");
        assert_eq!(json["class"], "Wizard");
    }
}
