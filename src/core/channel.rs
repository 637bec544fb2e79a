/// Sync channel: wire envelopes and the presence protocol over a pluggable transport.
///
/// The protocol is broadcast gossip, not a handshake:
/// 1. on attach a process sends `sync-request`;
/// 2. every peer that already has a player answers with `player-join`;
/// 3. on detach a process sends `player-leave` before releasing its handle.
///
/// There are no acks, retries or heartbeats. A peer that terminates without
/// step 3 stays in everyone's world-view set.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::schema::message::Message;
use crate::schema::player::{Player, PlayerId};
use crate::schema::room::RoomId;

/// Default broadcast topic name.
pub const DEFAULT_CHANNEL_NAME: &str = "realm-channel";

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

/// One frame on the sync channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Envelope {
    SyncRequest,
    PlayerJoin {
        player: Player,
    },
    PlayerLeave {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    PlayerMove {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: RoomId,
    },
    Message {
        message: Message,
    },
}

impl Envelope {
    pub fn encode(&self) -> Result<String, ChannelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> Result<Envelope, ChannelError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyncRequest => "sync-request",
            Self::PlayerJoin { .. } => "player-join",
            Self::PlayerLeave { .. } => "player-leave",
            Self::PlayerMove { .. } => "player-move",
            Self::Message { .. } => "message",
        }
    }
}

/// A named broadcast topic as seen by one process.
///
/// Implementations deliver frames from every other subscriber and never
/// echo the process's own frames back. Delivery is best-effort.
pub trait Transport {
    fn post(&mut self, frame: &str) -> Result<(), ChannelError>;
    /// Next pending inbound frame, if any. Never blocks.
    fn try_recv(&mut self) -> Option<String>;
    /// Release the handle. Further posts fail with `Closed`.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&mut self, frame: &str) -> Result<(), ChannelError> {
        (**self).post(frame)
    }

    fn try_recv(&mut self) -> Option<String> {
        (**self).try_recv()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[derive(Debug, Clone)]
struct Frame {
    origin: u64,
    payload: Arc<str>,
}

/// In-process broadcast hub: one topic per channel name, any number of
/// ports per topic.
#[derive(Debug)]
pub struct Switchboard {
    capacity: usize,
    topics: rustc_hash::FxHashMap<String, broadcast::Sender<Frame>>,
    next_origin: u64,
}

impl Default for Switchboard {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl Switchboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is how many frames a slow port may fall behind before
    /// it starts losing the oldest ones.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Default::default(),
            next_origin: 1,
        }
    }

    /// Subscribe a new port to `name`. It sees frames posted after this call.
    pub fn open(&mut self, name: &str) -> LocalPort {
        let capacity = self.capacity;
        let tx = self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .clone();
        let rx = tx.subscribe();
        let origin = self.next_origin;
        self.next_origin += 1;
        LocalPort {
            origin,
            tx,
            rx: Some(rx),
        }
    }
}

/// A [`Switchboard`] subscription.
#[derive(Debug)]
pub struct LocalPort {
    origin: u64,
    tx: broadcast::Sender<Frame>,
    rx: Option<broadcast::Receiver<Frame>>,
}

impl Transport for LocalPort {
    fn post(&mut self, frame: &str) -> Result<(), ChannelError> {
        if self.rx.is_none() {
            return Err(ChannelError::Closed);
        }
        self.tx
            .send(Frame {
                origin: self.origin,
                payload: Arc::from(frame),
            })
            .map(|_| ())
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    fn try_recv(&mut self) -> Option<String> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.try_recv() {
                Ok(frame) if frame.origin == self.origin => continue,
                Ok(frame) => return Some(frame.payload.to_string()),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(port = self.origin, skipped, "sync port lagged; frames lost");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    fn close(&mut self) {
        self.rx = None;
    }
}

/// The presence/chat protocol on top of a [`Transport`].
///
/// Transport failures are logged and swallowed: from the player's side a
/// broken channel looks the same as an empty one.
pub struct SyncChannel<T: Transport> {
    name: String,
    transport: T,
    open: bool,
}

impl<T: Transport> SyncChannel<T> {
    /// Attach to the topic and ask peers to announce themselves.
    pub fn attach(name: impl Into<String>, transport: T) -> Self {
        let mut channel = Self {
            name: name.into(),
            transport,
            open: true,
        };
        channel.publish(&Envelope::SyncRequest);
        channel
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn publish(&mut self, envelope: &Envelope) {
        if !self.open {
            debug!(channel = %self.name, kind = envelope.kind(), "publish after detach ignored");
            return;
        }
        let frame = match envelope.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(channel = %self.name, kind = envelope.kind(), "failed to encode envelope: {}", e);
                return;
            }
        };
        match self.transport.post(&frame) {
            Ok(()) => debug!(channel = %self.name, kind = envelope.kind(), "published"),
            Err(e) => debug!(channel = %self.name, kind = envelope.kind(), "publish failed: {}", e),
        }
    }

    /// Decode every pending frame. Malformed frames are dropped.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut envelopes = Vec::new();
        if !self.open {
            return envelopes;
        }
        while let Some(frame) = self.transport.try_recv() {
            match Envelope::decode(&frame) {
                Ok(envelope) => {
                    debug!(channel = %self.name, kind = envelope.kind(), "received");
                    envelopes.push(envelope);
                }
                Err(e) => warn!(channel = %self.name, "dropping malformed frame: {}", e),
            }
        }
        envelopes
    }

    /// Send a best-effort departure notice, then release the transport.
    /// Safe to call more than once.
    pub fn detach(&mut self, leaving: Option<&PlayerId>) {
        if !self.open {
            return;
        }
        if let Some(id) = leaving {
            self.publish(&Envelope::PlayerLeave {
                player_id: id.clone(),
            });
        }
        self.transport.close();
        self.open = false;
    }
}
