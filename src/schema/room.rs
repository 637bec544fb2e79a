use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Newtype wrapper for room ids (`"town-square"`, `"tavern"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The closed set of exit directions.
///
/// Variant order is the order exits are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Parse a full direction name or its one-letter alias. Input must
    /// already be lowercase.
    pub fn parse(word: &str) -> Option<Direction> {
        match word {
            "north" | "n" => Some(Self::North),
            "east" | "e" => Some(Self::East),
            "south" | "s" => Some(Self::South),
            "west" | "w" => Some(Self::West),
            "up" | "u" => Some(Self::Up),
            "down" | "d" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node in the world graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub exits: BTreeMap<Direction, RoomId>,
    /// Mutable during a session: `take` removes entries from the local copy.
    pub items: Vec<String>,
    pub npcs: Vec<String>,
    /// Opaque display payload, passed through to the presentation layer.
    #[serde(default)]
    pub art: String,
}

impl Room {
    /// The first sentence of the description, with its period.
    pub fn first_sentence(&self) -> String {
        match self.description.split('.').next() {
            Some(head) if !head.trim().is_empty() => format!("{}.", head.trim()),
            _ => self.description.clone(),
        }
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_aliases() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("down"), Some(Direction::Down));
        assert_eq!(Direction::parse("d"), Some(Direction::Down));
        assert_eq!(Direction::parse("sideways"), None);
        // Parsing is case-sensitive; the interpreter lowercases first.
        assert_eq!(Direction::parse("North"), None);
    }

    #[test]
    fn direction_order_matches_listing_order() {
        let mut dirs = vec![Direction::West, Direction::Up, Direction::North, Direction::South];
        dirs.sort();
        assert_eq!(
            dirs,
            vec![Direction::North, Direction::South, Direction::West, Direction::Up]
        );
    }

    #[test]
    fn first_sentence_of_description() {
        let room = Room {
            id: RoomId::new("cave"),
            name: "Cave".to_string(),
            description: "It is dark. Something breathes.".to_string(),
            exits: BTreeMap::new(),
            items: vec![],
            npcs: vec![],
            art: String::new(),
        };
        assert_eq!(room.first_sentence(), "It is dark.");
    }
}
