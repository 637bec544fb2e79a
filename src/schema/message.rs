use serde::{Deserialize, Serialize};

use super::player::Player;

/// Display category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    System,
    Narration,
    Chat,
    Action,
    Scene,
}

/// One entry in the message log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique, but carries no ordering information.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_color: Option<String>,
    pub content: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, rename = "pixelArt", skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            sender: None,
            sender_color: None,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            art: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn narration(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Narration, content)
    }

    /// Attribute the message to a player (name and display color).
    pub fn from_player(mut self, player: &Player) -> Self {
        self.sender = Some(player.name.clone());
        self.sender_color = Some(player.color.clone());
        self
    }

    pub fn with_art(mut self, art: impl Into<String>) -> Self {
        let art = art.into();
        if !art.is_empty() {
            self.art = Some(art);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_under_type() {
        let msg = Message::system("hello").with_art("");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "system");
        assert!(json.get("pixelArt").is_none());
        assert!(json.get("sender").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::system("a");
        let b = Message::system("a");
        assert_ne!(a.id, b.id);
    }
}
