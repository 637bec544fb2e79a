/// World map: the room graph and the immutable template it is built from.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::schema::room::{Direction, Room, RoomId};

/// The world shipped with the crate.
pub const DEFAULT_WORLD_RON: &str = include_str!("../../data/world.ron");

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate room id '{0}'")]
    DuplicateRoom(RoomId),
    #[error("room '{room}' has an exit with unknown direction '{direction}'")]
    UnknownDirection { room: RoomId, direction: String },
    #[error("room '{room}' lists exit {direction} more than once")]
    DuplicateExit { room: RoomId, direction: Direction },
    #[error("room '{room}' exit {direction} leads to undefined room '{target}'")]
    DanglingExit {
        room: RoomId,
        direction: Direction,
        target: RoomId,
    },
    #[error("start room '{0}' is not defined")]
    UnknownStartRoom(RoomId),
    #[error("world has no rooms")]
    Empty,
}

// RON deserialization helpers. Exits are written with plain string keys,
// so rooms go through an intermediate shape before validation.

#[derive(Debug, Deserialize)]
struct RonRoom {
    id: String,
    name: String,
    description: String,
    #[serde(default)]
    exits: HashMap<String, String>,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    npcs: Vec<String>,
    #[serde(default)]
    art: String,
}

#[derive(Debug, Deserialize)]
struct RonWorld {
    start_room: String,
    rooms: Vec<RonRoom>,
}

/// A validated, immutable world definition.
///
/// Every exit of every room resolves to a defined room. Processes never
/// share a template's rooms for mutation; each one instantiates its own
/// [`WorldMap`].
#[derive(Debug, Clone)]
pub struct WorldTemplate {
    rooms: Arc<[Room]>,
    start_room: RoomId,
}

impl WorldTemplate {
    /// Load a world from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<WorldTemplate, WorldError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a world from a RON string.
    pub fn parse_ron(input: &str) -> Result<WorldTemplate, WorldError> {
        let raw: RonWorld = ron::from_str(input)?;
        let mut rooms = Vec::with_capacity(raw.rooms.len());

        for ron_room in raw.rooms {
            let id = RoomId(ron_room.id);
            let mut exits = BTreeMap::new();
            for (word, target) in ron_room.exits {
                let direction = Direction::parse(&word.to_lowercase()).ok_or_else(|| {
                    WorldError::UnknownDirection {
                        room: id.clone(),
                        direction: word.clone(),
                    }
                })?;
                // "north", "n" and "N" name the same exit.
                if exits.insert(direction, RoomId(target)).is_some() {
                    return Err(WorldError::DuplicateExit {
                        room: id.clone(),
                        direction,
                    });
                }
            }
            rooms.push(Room {
                id,
                name: ron_room.name,
                description: ron_room.description,
                exits,
                items: ron_room.items,
                npcs: ron_room.npcs,
                art: ron_room.art,
            });
        }

        Self::from_rooms(rooms, RoomId(raw.start_room))
    }

    /// Build a template from already-constructed rooms, checking ids,
    /// exits and the start room.
    pub fn from_rooms(rooms: Vec<Room>, start_room: RoomId) -> Result<WorldTemplate, WorldError> {
        if rooms.is_empty() {
            return Err(WorldError::Empty);
        }

        let mut seen: FxHashSet<&RoomId> = FxHashSet::default();
        for room in &rooms {
            if !seen.insert(&room.id) {
                return Err(WorldError::DuplicateRoom(room.id.clone()));
            }
        }

        for room in &rooms {
            for (direction, target) in &room.exits {
                if !seen.contains(target) {
                    return Err(WorldError::DanglingExit {
                        room: room.id.clone(),
                        direction: *direction,
                        target: target.clone(),
                    });
                }
            }
        }

        if !seen.contains(&start_room) {
            return Err(WorldError::UnknownStartRoom(start_room));
        }

        Ok(WorldTemplate {
            rooms: rooms.into(),
            start_room,
        })
    }

    /// The embedded default world.
    pub fn builtin() -> Result<WorldTemplate, WorldError> {
        Self::parse_ron(DEFAULT_WORLD_RON)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn start_room(&self) -> &RoomId {
        &self.start_room
    }
}

/// One process's own copy of the world.
///
/// Mutated only by item removal, and that removal is never propagated to
/// other processes.
#[derive(Debug, Clone)]
pub struct WorldMap {
    rooms: FxHashMap<RoomId, Room>,
    start_room: RoomId,
}

impl WorldMap {
    pub fn instantiate(template: &WorldTemplate) -> WorldMap {
        let rooms = template
            .rooms()
            .iter()
            .map(|room| (room.id.clone(), room.clone()))
            .collect();
        WorldMap {
            rooms,
            start_room: template.start_room().clone(),
        }
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn start_room(&self) -> &RoomId {
        &self.start_room
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn exits_of(&self, id: &RoomId, direction: Direction) -> Option<&RoomId> {
        self.rooms.get(id)?.exits.get(&direction)
    }

    /// Remove the first item named exactly `item` from a room. Returns
    /// whether anything was removed; absent rooms and items are a no-op.
    pub fn remove_item(&mut self, id: &RoomId, item: &str) -> bool {
        let Some(room) = self.rooms.get_mut(id) else {
            return false;
        };
        match room.items.iter().position(|i| i == item) {
            Some(index) => {
                room.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Room display name, or "Unknown" for ids this world doesn't define.
    pub fn room_name(&self, id: &RoomId) -> &str {
        self.rooms
            .get(id)
            .map(|room| room.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"(
        start_room: "a",
        rooms: [
            (id: "a", name: "A", description: "Room A.", exits: { "north": "b" }, items: ["coin", "coin", "map"], npcs: []),
            (id: "b", name: "B", description: "Room B.", exits: { "S": "a" }),
        ],
    )"#;

    #[test]
    fn builtin_world_loads() {
        let template = WorldTemplate::builtin().unwrap();
        assert_eq!(template.rooms().len(), 9);
        assert_eq!(template.start_room().as_str(), "town-square");
    }

    #[test]
    fn builtin_world_is_closed() {
        let world = WorldMap::instantiate(&WorldTemplate::builtin().unwrap());
        for room in world.rooms() {
            for target in room.exits.values() {
                assert!(world.contains(target), "{} -> {}", room.id, target);
            }
        }
    }

    #[test]
    fn exits_accept_aliases_and_case() {
        let template = WorldTemplate::parse_ron(TINY).unwrap();
        let world = WorldMap::instantiate(&template);
        assert_eq!(
            world.exits_of(&RoomId::new("b"), Direction::South),
            Some(&RoomId::new("a"))
        );
        assert_eq!(world.exits_of(&RoomId::new("a"), Direction::East), None);
    }

    #[test]
    fn remove_item_takes_first_match_only() {
        let template = WorldTemplate::parse_ron(TINY).unwrap();
        let mut world = WorldMap::instantiate(&template);
        let a = RoomId::new("a");
        assert!(world.remove_item(&a, "coin"));
        assert_eq!(world.room(&a).unwrap().items, vec!["coin", "map"]);
        assert!(!world.remove_item(&a, "sword"));
        assert!(!world.remove_item(&RoomId::new("nowhere"), "coin"));
        assert_eq!(world.room(&a).unwrap().items, vec!["coin", "map"]);
    }

    #[test]
    fn instances_are_independent() {
        let template = WorldTemplate::parse_ron(TINY).unwrap();
        let mut first = WorldMap::instantiate(&template);
        let second = WorldMap::instantiate(&template);
        first.remove_item(&RoomId::new("a"), "map");
        assert!(second.room(&RoomId::new("a")).unwrap().has_item("map"));
        assert!(template.rooms()[0].has_item("map"));
    }

    #[test]
    fn dangling_exit_rejected() {
        let input = r#"(start_room: "a", rooms: [(id: "a", name: "A", description: "", exits: { "up": "attic" })])"#;
        let err = WorldTemplate::parse_ron(input).unwrap_err();
        assert!(matches!(err, WorldError::DanglingExit { direction: Direction::Up, .. }));
    }

    #[test]
    fn unknown_direction_rejected() {
        let input = r#"(start_room: "a", rooms: [(id: "a", name: "A", description: "", exits: { "widdershins": "a" })])"#;
        assert!(matches!(
            WorldTemplate::parse_ron(input),
            Err(WorldError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn aliased_exit_rejected() {
        let input = r#"(start_room: "a", rooms: [
            (id: "a", name: "A", description: "", exits: { "north": "b", "N": "c" }),
            (id: "b", name: "B", description: ""),
            (id: "c", name: "C", description: ""),
        ])"#;
        for _ in 0..20 {
            assert!(matches!(
                WorldTemplate::parse_ron(input),
                Err(WorldError::DuplicateExit { direction: Direction::North, .. })
            ));
        }
        let input = input.replace("\"N\"", "\"n\"");
        assert!(matches!(
            WorldTemplate::parse_ron(&input),
            Err(WorldError::DuplicateExit { .. })
        ));
    }

    #[test]
    fn duplicate_room_rejected() {
        let input = r#"(start_room: "a", rooms: [(id: "a", name: "A", description: ""), (id: "a", name: "A2", description: "")])"#;
        assert!(matches!(
            WorldTemplate::parse_ron(input),
            Err(WorldError::DuplicateRoom(_))
        ));
    }

    #[test]
    fn unknown_start_room_rejected() {
        let input = r#"(start_room: "z", rooms: [(id: "a", name: "A", description: "")])"#;
        assert!(matches!(
            WorldTemplate::parse_ron(input),
            Err(WorldError::UnknownStartRoom(_))
        ));
    }

    #[test]
    fn room_name_falls_back_to_unknown() {
        let world = WorldMap::instantiate(&WorldTemplate::parse_ron(TINY).unwrap());
        assert_eq!(world.room_name(&RoomId::new("a")), "A");
        assert_eq!(world.room_name(&RoomId::new("void")), "Unknown");
    }
}
