//! Realm Engine: a multi-tab text adventure with no server.
//!
//! Every browser tab (or any other process) runs its own [`RealmEngine`]
//! with its own copy of the world. Tabs meet on a named broadcast channel
//! and gossip presence, movement and chat to each other; each keeps an
//! eventually-consistent view of who is around.
//!
//! Item pickups are deliberately *not* synchronized: two tabs can both take
//! the same item from their own copies of a room.

pub mod core;
pub mod schema;

pub use crate::core::channel::{Envelope, LocalPort, Switchboard, SyncChannel, Transport};
pub use crate::core::config::RealmConfig;
pub use crate::core::engine::{EngineError, RealmEngine, RealmEngineBuilder};
pub use crate::schema::message::{Message, MessageKind};
pub use crate::schema::player::{CharacterSheet, Player, PlayerId};
