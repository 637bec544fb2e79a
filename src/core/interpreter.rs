/// Command interpreter: parses a line of input and resolves it against the
/// session and world, producing messages and outbound envelopes.
///
/// Nothing is remembered between calls: every command is resolved from the
/// current state and the input text alone.

use rand::Rng;

use crate::core::channel::Envelope;
use crate::core::narration::{ActionCategory, PhraseBook};
use crate::core::session::SessionState;
use crate::core::world::WorldMap;
use crate::schema::message::{Message, MessageKind};
use crate::schema::player::Player;
use crate::schema::room::{Direction, Room};

pub const HELP_TEXT: &str = "=== MUD Commands ===
Movement: north/n, south/s, east/e, west/w, up/u, down/d
look/l - Look around the room
say/' message - Say something
emote/: action - Perform an action
take/get item - Pick up an item
inventory/i - Check your pack
who - See online players
stats - View your character
help/? - Show this help";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Look,
    Go(Direction),
    Say(String),
    Emote(String),
    Take(String),
    Inventory,
    Who,
    Stats,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse one line. The leading token is matched case-insensitively;
    /// the rest of the line is kept verbatim. Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (token, arg) = match line.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest.trim_start()),
            None => (line, ""),
        };
        let token = token.to_lowercase();
        let arg = arg.to_string();

        let command = match token.as_str() {
            "look" | "l" => Command::Look,
            "say" | "'" => Command::Say(arg),
            "emote" | ":" => Command::Emote(arg),
            "take" | "get" => Command::Take(arg),
            "inventory" | "i" => Command::Inventory,
            "who" => Command::Who,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            other => match Direction::parse(other) {
                Some(direction) => Command::Go(direction),
                None => Command::Unknown(token),
            },
        };
        Some(command)
    }
}

/// What a command produced.
///
/// `messages` go to the local log in order; `outbound` goes to the sync
/// channel in order. A broadcast message appears in both.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub messages: Vec<Message>,
    pub outbound: Vec<Envelope>,
}

impl Outcome {
    fn local(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn shared(&mut self, message: Message) {
        self.outbound.push(Envelope::Message {
            message: message.clone(),
        });
        self.messages.push(message);
    }
}

/// Borrowed view of one process's state for the duration of a command.
pub struct Interpreter<'a> {
    pub session: &'a mut SessionState,
    pub world: &'a mut WorldMap,
    pub phrases: &'a PhraseBook,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        session: &'a mut SessionState,
        world: &'a mut WorldMap,
        phrases: &'a PhraseBook,
    ) -> Self {
        Self {
            session,
            world,
            phrases,
        }
    }

    /// Run a command for the local player. Without a local player nothing
    /// happens.
    pub fn execute<R: Rng + ?Sized>(&mut self, command: &Command, rng: &mut R) -> Outcome {
        let mut out = Outcome::default();
        let Some(player) = self.session.local().cloned() else {
            return out;
        };
        let Some(room) = self.world.room(&player.room).cloned() else {
            out.local(Message::system("You are nowhere. Something has gone wrong."));
            return out;
        };

        match command {
            Command::Look => self.look(&player, &room, rng, &mut out),
            Command::Go(direction) => self.go(&player, &room, *direction, rng, &mut out),
            Command::Say(text) => {
                if !text.is_empty() {
                    out.shared(
                        Message::new(
                            MessageKind::Chat,
                            format!("{} says: \"{}\"", player.tag(), text),
                        )
                        .from_player(&player),
                    );
                }
            }
            Command::Emote(text) => {
                if !text.is_empty() {
                    out.shared(
                        Message::new(MessageKind::Action, format!("* {} {}", player.tag(), text))
                            .from_player(&player),
                    );
                }
            }
            Command::Take(item) => self.take(&player, &room, item, rng, &mut out),
            Command::Inventory => {
                if player.inventory.is_empty() {
                    out.local(Message::system("Your pack is empty."));
                } else {
                    out.local(Message::system(format!(
                        "You are carrying: {}",
                        player.inventory.join(", ")
                    )));
                }
            }
            Command::Who => self.who(&mut out),
            Command::Stats => out.local(Message::system(format!(
                "{} the {}\nLevel: {} | XP: {}\nHP: {}/{}\nInventory: {} items",
                player.tag(),
                player.class,
                player.level,
                player.xp,
                player.hp,
                player.max_hp,
                player.inventory.len()
            ))),
            Command::Help => out.local(Message::system(HELP_TEXT)),
            Command::Unknown(token) => out.local(Message::system(format!(
                "Unknown command: {}. Type 'help' for commands.",
                token
            ))),
        }
        out
    }

    fn look<R: Rng + ?Sized>(&self, player: &Player, room: &Room, rng: &mut R, out: &mut Outcome) {
        let narration = self
            .phrases
            .generate(ActionCategory::Look, player, room, rng);
        out.shared(Message::narration(narration).with_art(room.art.clone()));

        if !room.items.is_empty() {
            out.local(Message::system(format!("You see: {}", room.items.join(", "))));
        }
        if !room.npcs.is_empty() {
            out.local(Message::system(format!("Present: {}", room.npcs.join(", "))));
        }
        let others = self.session.players_in(&room.id);
        if !others.is_empty() {
            let names: Vec<String> = others.iter().map(|p| p.tag()).collect();
            out.local(Message::system(format!(
                "Other adventurers: {}",
                names.join(", ")
            )));
        }
        let exits: Vec<&str> = room.exits.keys().map(Direction::name).collect();
        out.local(Message::system(format!("Exits: {}", exits.join(", "))));
    }

    fn go<R: Rng + ?Sized>(
        &mut self,
        player: &Player,
        room: &Room,
        direction: Direction,
        rng: &mut R,
        out: &mut Outcome,
    ) {
        let destination = self
            .world
            .exits_of(&room.id, direction)
            .and_then(|id| self.world.room(id))
            .cloned();
        let Some(destination) = destination else {
            out.local(Message::system("You cannot go that way."));
            return;
        };

        self.session.local_move(destination.id.clone());
        out.outbound.push(Envelope::PlayerMove {
            player_id: player.id.clone(),
            room: destination.id.clone(),
        });

        let flavor = self
            .phrases
            .generate(ActionCategory::Move, player, &destination, rng);
        out.shared(
            Message::narration(format!(
                "{} travels {} to {}. {}\n\n{}",
                player.tag(),
                direction,
                destination.name,
                flavor,
                destination.description
            ))
            .with_art(destination.art.clone()),
        );
    }

    fn take<R: Rng + ?Sized>(
        &mut self,
        player: &Player,
        room: &Room,
        item: &str,
        rng: &mut R,
        out: &mut Outcome,
    ) {
        if item.is_empty() || !room.has_item(item) {
            out.local(Message::system("You don't see that here."));
            return;
        }

        // Local copy only; peers keep seeing the item until they take it too.
        self.world.remove_item(&room.id, item);
        self.session.local_take(item);

        let flavor = self
            .phrases
            .generate(ActionCategory::Take, player, room, rng);
        out.shared(Message::narration(format!(
            "{} picks up the {}. {}",
            player.tag(),
            item,
            flavor
        )));
    }

    fn who(&self, out: &mut Outcome) {
        let roster = self.session.roster();
        let lines: Vec<String> = roster
            .iter()
            .map(|p| {
                format!(
                    "  {} the {} (Level {}) - {}",
                    p.tag(),
                    p.class,
                    p.level,
                    self.world.room_name(&p.room)
                )
            })
            .collect();
        out.local(Message::system(format!(
            "Online adventurers ({}):\n{}",
            roster.len(),
            lines.join("\n")
        )));
    }
}
