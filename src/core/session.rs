/// Session state: the local player and this process's view of everyone else.

use rustc_hash::FxHashMap;

use crate::schema::player::{Player, PlayerId};
use crate::schema::room::RoomId;

/// One process's player plus its mirror of remote players.
///
/// The world-view set holds remote players only and is eventually
/// consistent with the peers' own records: it changes only when a sync
/// envelope arrives.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    local: Option<Player>,
    world_view: FxHashMap<PlayerId, Player>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self) -> Option<&Player> {
        self.local.as_ref()
    }

    /// Install the local player. Only the owning process writes it.
    pub fn set_local(&mut self, player: Player) {
        self.world_view.remove(&player.id);
        self.local = Some(player);
    }

    pub fn world_view(&self) -> &FxHashMap<PlayerId, Player> {
        &self.world_view
    }

    pub fn is_local(&self, id: &PlayerId) -> bool {
        self.local.as_ref().is_some_and(|p| &p.id == id)
    }

    /// Record a remote player. Known ids and our own id are ignored, which
    /// absorbs echoes and repeated sync responses. Returns whether the
    /// player was inserted.
    pub fn apply_join(&mut self, player: Player) -> bool {
        if self.is_local(&player.id) || self.world_view.contains_key(&player.id) {
            return false;
        }
        self.world_view.insert(player.id.clone(), player);
        true
    }

    pub fn apply_leave(&mut self, id: &PlayerId) -> Option<Player> {
        self.world_view.remove(id)
    }

    /// Move a remote player. Returns `false` for unknown players.
    pub fn apply_move(&mut self, id: &PlayerId, room: RoomId) -> bool {
        match self.world_view.get_mut(id) {
            Some(player) => {
                player.room = room;
                true
            }
            None => false,
        }
    }

    pub fn local_move(&mut self, room: RoomId) {
        if let Some(player) = self.local.as_mut() {
            player.room = room;
        }
    }

    pub fn local_take(&mut self, item: impl Into<String>) {
        if let Some(player) = self.local.as_mut() {
            player.inventory.push(item.into());
        }
    }

    /// Remote players believed to be in `room`, ordered by name.
    pub fn players_in(&self, room: &RoomId) -> Vec<&Player> {
        let mut here: Vec<&Player> = self
            .world_view
            .values()
            .filter(|p| &p.room == room)
            .collect();
        here.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        here
    }

    /// Everyone known: the local player first, then remote players by name.
    pub fn roster(&self) -> Vec<&Player> {
        let mut remote: Vec<&Player> = self.world_view.values().collect();
        remote.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        self.local.iter().chain(remote).collect()
    }
}
