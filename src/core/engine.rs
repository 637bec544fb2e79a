/// The per-process engine: input → interpreter → log + sync channel, and
/// sync channel → session state + log.
///
/// One `RealmEngine` is one tab. It owns its own world copy, session state,
/// message log and RNG; nothing is shared with other engines except what
/// travels over the channel.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::channel::{Envelope, SyncChannel, Transport};
use crate::core::config::{ConfigError, RealmConfig};
use crate::core::interpreter::{Command, Interpreter};
use crate::core::log::MessageLog;
use crate::core::narration::{PhraseBook, PhraseError};
use crate::core::session::SessionState;
use crate::core::world::{WorldError, WorldMap, WorldTemplate};
use crate::schema::message::{Message, MessageKind};
use crate::schema::player::{CharacterSheet, Player, PlayerId};
use crate::schema::room::RoomId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("world error: {0}")]
    World(#[from] WorldError),
    #[error("phrase book error: {0}")]
    Phrase(#[from] PhraseError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("start room '{0}' is not in the world")]
    UnknownStartRoom(RoomId),
    #[error("no character has been created yet")]
    NoCharacter,
    #[error("a character already exists in this session")]
    CharacterExists,
    #[error("invalid character: {0}")]
    InvalidCharacter(&'static str),
}

/// One tab's engine. Built via `RealmEngine::builder()`.
pub struct RealmEngine {
    world: WorldMap,
    session: SessionState,
    log: MessageLog,
    phrases: PhraseBook,
    channel: SyncChannel<Box<dyn Transport>>,
    rng: StdRng,
    start_room: RoomId,
    starting_hp: u32,
}

/// Builder for constructing a `RealmEngine`.
pub struct RealmEngineBuilder {
    config: RealmConfig,
    /// Directly provided world (skips `config.world_path`).
    world: Option<WorldTemplate>,
    /// Directly provided phrase book (skips `config.phrases_path`).
    phrases: Option<PhraseBook>,
}

impl RealmEngine {
    pub fn builder() -> RealmEngineBuilder {
        RealmEngineBuilder {
            config: RealmConfig::default(),
            world: None,
            phrases: None,
        }
    }

    /// Create the local player and announce it to peers.
    pub fn create_character(&mut self, sheet: CharacterSheet) -> Result<&Player, EngineError> {
        if self.session.local().is_some() {
            return Err(EngineError::CharacterExists);
        }
        let player = sheet
            .into_player(self.start_room.clone(), self.starting_hp)
            .ok_or(EngineError::InvalidCharacter("name must not be empty"))?;

        info!(player = %player.id, name = %player.name, channel = self.channel.name(), "character created");
        self.channel.publish(&Envelope::PlayerJoin {
            player: player.clone(),
        });

        self.log.push(Message::system(format!(
            "Welcome to the realm, {} the {}!",
            player.tag(),
            player.class
        )));
        if let Some(room) = self.world.room(&player.room) {
            self.log
                .push(Message::new(MessageKind::Scene, room.description.clone()).with_art(room.art.clone()));
        }
        self.log
            .push(Message::system("Type 'help' for a list of commands."));

        self.session.set_local(player);
        self.session.local().ok_or(EngineError::NoCharacter)
    }

    /// Run one line of player input. Returns how many messages were
    /// appended to the log; blank input appends nothing.
    pub fn submit(&mut self, line: &str) -> Result<usize, EngineError> {
        if self.session.local().is_none() {
            return Err(EngineError::NoCharacter);
        }
        let Some(command) = Command::parse(line) else {
            return Ok(0);
        };
        debug!(?command, "submit");

        let outcome = Interpreter::new(&mut self.session, &mut self.world, &self.phrases)
            .execute(&command, &mut self.rng);

        for envelope in &outcome.outbound {
            self.channel.publish(envelope);
        }
        let appended = outcome.messages.len();
        self.log.extend(outcome.messages);
        Ok(appended)
    }

    /// Apply every envelope waiting on the channel. Returns how many were
    /// applied.
    pub fn pump(&mut self) -> usize {
        let envelopes = self.channel.drain();
        let count = envelopes.len();
        for envelope in envelopes {
            self.apply(envelope);
        }
        count
    }

    /// Apply one inbound envelope.
    pub fn apply(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::SyncRequest => {
                if let Some(player) = self.session.local().cloned() {
                    self.channel.publish(&Envelope::PlayerJoin { player });
                }
            }
            Envelope::PlayerJoin { player } => {
                let notice = format!(
                    "{} the {} has joined the realm!",
                    player.tag(),
                    player.class
                );
                if self.session.apply_join(player) {
                    self.log.push(Message::system(notice));
                }
            }
            Envelope::PlayerLeave { player_id } => {
                if let Some(player) = self.session.apply_leave(&player_id) {
                    self.log
                        .push(Message::system(format!("{} has left the realm.", player.tag())));
                }
            }
            Envelope::PlayerMove { player_id, room } => {
                if !self.session.apply_move(&player_id, room) {
                    debug!(player = %player_id, "move for unknown player ignored");
                }
            }
            Envelope::Message { message } => self.log.push(message),
        }
    }

    /// Announce departure and release the channel. Safe to call twice;
    /// also runs on drop.
    pub fn leave(&mut self) {
        if !self.channel.is_open() {
            return;
        }
        let id = self.session.local().map(|p| p.id.clone());
        if let Some(ref id) = id {
            info!(player = %id, channel = self.channel.name(), "leaving");
        }
        self.channel.detach(id.as_ref());
    }

    pub fn player(&self) -> Option<&Player> {
        self.session.local()
    }

    pub fn world_view(&self) -> &FxHashMap<PlayerId, Player> {
        self.session.world_view()
    }

    pub fn roster(&self) -> Vec<&Player> {
        self.session.roster()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn world(&self) -> &WorldMap {
        &self.world
    }

    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    pub fn is_attached(&self) -> bool {
        self.channel.is_open()
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }
}

impl Drop for RealmEngine {
    fn drop(&mut self) {
        self.leave();
    }
}

impl RealmEngineBuilder {
    /// Start from a loaded config. Later builder calls override it.
    pub fn config(mut self, config: RealmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn channel_name(mut self, name: &str) -> Self {
        self.config.channel_name = name.to_string();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn start_room(mut self, room: &str) -> Self {
        self.config.start_room = Some(room.to_string());
        self
    }

    pub fn starting_hp(mut self, hp: u32) -> Self {
        self.config.starting_hp = hp;
        self
    }

    /// Provide a world directly (for tests and embedded data).
    pub fn with_world(mut self, world: WorldTemplate) -> Self {
        self.world = Some(world);
        self
    }

    /// Provide a phrase book directly (for tests and embedded data).
    pub fn with_phrases(mut self, phrases: PhraseBook) -> Self {
        self.phrases = Some(phrases);
        self
    }

    /// Load data, instantiate this tab's world and attach to the channel.
    /// Attaching sends the initial `sync-request`.
    pub fn build(self, transport: impl Transport + 'static) -> Result<RealmEngine, EngineError> {
        let template = match (self.world, &self.config.world_path) {
            (Some(world), _) => world,
            (None, Some(path)) => WorldTemplate::load_from_ron(path)?,
            (None, None) => WorldTemplate::builtin()?,
        };
        let phrases = match (self.phrases, &self.config.phrases_path) {
            (Some(phrases), _) => phrases,
            (None, Some(path)) => PhraseBook::load_from_ron(path)?,
            (None, None) => PhraseBook::builtin()?,
        };

        let world = WorldMap::instantiate(&template);
        let start_room = match self.config.start_room {
            Some(id) => RoomId(id),
            None => world.start_room().clone(),
        };
        if !world.contains(&start_room) {
            return Err(EngineError::UnknownStartRoom(start_room));
        }

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(channel = %self.config.channel_name, start = %start_room, "attaching");
        let transport: Box<dyn Transport> = Box::new(transport);
        let channel = SyncChannel::attach(self.config.channel_name, transport);

        Ok(RealmEngine {
            world,
            session: SessionState::new(),
            log: MessageLog::new(),
            phrases,
            channel,
            rng,
            start_room,
            starting_hp: self.config.starting_hp,
        })
    }
}
