/// Append-only message log; insertion order is display order.

use crate::schema::message::Message;

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.entries.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all(&self) -> &[Message] {
        &self.entries
    }

    /// Entries appended at or after `cursor` (a previous `len()`).
    pub fn since(&self, cursor: usize) -> &[Message] {
        self.entries.get(cursor..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_cursor() {
        let mut log = MessageLog::new();
        log.push(Message::system("one"));
        let cursor = log.len();
        log.extend([Message::system("two"), Message::system("three")]);
        let fresh: Vec<&str> = log.since(cursor).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(fresh, vec!["two", "three"]);
        assert!(log.since(99).is_empty());
    }
}
