/// Narration generator: phrase templates and uniform selection among them.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::player::Player;
use crate::schema::room::Room;

/// The phrase book shipped with the crate.
pub const DEFAULT_PHRASES_RON: &str = include_str!("../../data/phrases.ron");

#[derive(Debug, Error)]
pub enum PhraseError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("unknown action category '{0}'")]
    UnknownCategory(String),
    #[error("action category '{0}' is listed more than once")]
    DuplicateCategory(String),
    #[error("phrase book has no '{0}' phrasings")]
    MissingFallback(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The kind of action a narration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Look,
    Move,
    Take,
    /// Generic fallback phrasing for anything else.
    Presence,
}

impl ActionCategory {
    fn parse(word: &str) -> Option<ActionCategory> {
        match word {
            "look" => Some(Self::Look),
            "move" => Some(Self::Move),
            "take" => Some(Self::Take),
            "presence" | "emote" => Some(Self::Presence),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Look => "look",
            Self::Move => "move",
            Self::Take => "take",
            Self::Presence => "presence",
        }
    }
}

/// A value a phrase can interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Class,
    Avatar,
    Room,
    Description,
    FirstSentence,
}

impl Field {
    fn parse(name: &str) -> Option<Field> {
        match name {
            "name" => Some(Self::Name),
            "class" => Some(Self::Class),
            "avatar" => Some(Self::Avatar),
            "room" => Some(Self::Room),
            "description" => Some(Self::Description),
            "first_sentence" => Some(Self::FirstSentence),
            _ => None,
        }
    }
}

/// A segment of a parsed phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed phrase template.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub segments: Vec<Segment>,
}

impl Phrase {
    /// Parse a phrase string.
    ///
    /// Syntax:
    /// - `{field}` → `Field` (see [`Field`] for the accepted names)
    /// - `{{` / `}}` → literal brace
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Phrase, PhraseError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal_buf.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal_buf.push('}');
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(PhraseError::TemplateParse(
                                    "nested braces are not allowed".to_string(),
                                ))
                            }
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(PhraseError::TemplateParse(
                                    "unclosed brace".to_string(),
                                ))
                            }
                        }
                    }
                    let field = Field::parse(name.trim()).ok_or_else(|| {
                        PhraseError::TemplateParse(format!("unknown field '{{{}}}'", name))
                    })?;
                    segments.push(Segment::Field(field));
                }
                '}' => {
                    return Err(PhraseError::TemplateParse(
                        "unmatched closing brace".to_string(),
                    ))
                }
                _ => literal_buf.push(c),
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Ok(Phrase { segments })
    }

    /// Fill the phrase for an actor standing in a room.
    pub fn render(&self, player: &Player, room: &Room) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::Name) => out.push_str(&player.name),
                Segment::Field(Field::Class) => out.push_str(&player.class),
                Segment::Field(Field::Avatar) => out.push_str(&player.avatar),
                Segment::Field(Field::Room) => out.push_str(&room.name),
                Segment::Field(Field::Description) => out.push_str(&room.description),
                Segment::Field(Field::FirstSentence) => out.push_str(&room.first_sentence()),
            }
        }
        out
    }
}

/// Phrasings keyed by action category. Always has `presence` phrasings.
#[derive(Debug, Clone)]
pub struct PhraseBook {
    phrases: FxHashMap<ActionCategory, Vec<Phrase>>,
}

impl PhraseBook {
    /// Load a phrase book from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PhraseBook, PhraseError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a phrase book from a RON map of category → phrase strings.
    ///
    /// Category names are case-insensitive; two keys naming the same
    /// category are rejected.
    pub fn parse_ron(input: &str) -> Result<PhraseBook, PhraseError> {
        let raw: BTreeMap<String, Vec<String>> = ron::from_str(input)?;
        let mut phrases: FxHashMap<ActionCategory, Vec<Phrase>> = FxHashMap::default();

        for (name, texts) in raw {
            let category = ActionCategory::parse(&name.to_lowercase())
                .ok_or_else(|| PhraseError::UnknownCategory(name.clone()))?;
            let parsed = texts
                .iter()
                .map(|text| Phrase::parse(text))
                .collect::<Result<Vec<_>, _>>()?;
            if phrases.insert(category, parsed).is_some() {
                return Err(PhraseError::DuplicateCategory(name));
            }
        }

        let has_fallback = phrases
            .get(&ActionCategory::Presence)
            .is_some_and(|p| !p.is_empty());
        if !has_fallback {
            return Err(PhraseError::MissingFallback(ActionCategory::Presence.name()));
        }

        Ok(PhraseBook { phrases })
    }

    /// The embedded default phrase book.
    pub fn builtin() -> Result<PhraseBook, PhraseError> {
        Self::parse_ron(DEFAULT_PHRASES_RON)
    }

    /// Phrasings used for a category, falling back to `presence`.
    pub fn phrases_for(&self, category: ActionCategory) -> &[Phrase] {
        match self.phrases.get(&category) {
            Some(list) if !list.is_empty() => list,
            _ => self
                .phrases
                .get(&ActionCategory::Presence)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Pick a phrasing uniformly at random and render it.
    ///
    /// Selection only affects displayed text, never game state, so peers
    /// may render the same action differently.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        category: ActionCategory,
        player: &Player,
        room: &Room,
        rng: &mut R,
    ) -> String {
        self.phrases_for(category)
            .choose(rng)
            .map(|phrase| phrase.render(player, room))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::player::CharacterSheet;
    use crate::schema::room::RoomId;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn actor() -> Player {
        CharacterSheet::new("Alda")
            .with_class("Ranger")
            .into_player(RoomId::new("hall"), 100)
            .unwrap()
    }

    fn hall() -> Room {
        Room {
            id: RoomId::new("hall"),
            name: "Great Hall".to_string(),
            description: "Banners hang from the rafters. It is cold.".to_string(),
            exits: BTreeMap::new(),
            items: vec![],
            npcs: vec![],
            art: String::new(),
        }
    }

    #[test]
    fn parse_fields_and_literals() {
        let p = Phrase::parse("{name} enters {room}.").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Field(Field::Name),
                Segment::Literal(" enters ".to_string()),
                Segment::Field(Field::Room),
                Segment::Literal(".".to_string()),
            ]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let p = Phrase::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            p.segments,
            vec![Segment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Phrase::parse("Bad {} here").is_err());
        assert!(Phrase::parse("Bad {outer{inner}} here").is_err());
        assert!(Phrase::parse("Bad {unclosed here").is_err());
        assert!(Phrase::parse("Bad } here").is_err());
        assert!(Phrase::parse("Who is {villain}?").is_err());
    }

    #[test]
    fn render_interpolates() {
        let p = Phrase::parse("The {class} arrives at {room}. {first_sentence}").unwrap();
        assert_eq!(
            p.render(&actor(), &hall()),
            "The Ranger arrives at Great Hall. Banners hang from the rafters."
        );
    }

    #[test]
    fn builtin_book_covers_commands() {
        let book = PhraseBook::builtin().unwrap();
        for category in [
            ActionCategory::Look,
            ActionCategory::Move,
            ActionCategory::Take,
            ActionCategory::Presence,
        ] {
            assert!(!book.phrases_for(category).is_empty(), "{}", category.name());
        }
    }

    #[test]
    fn unmapped_category_uses_presence() {
        let book = PhraseBook::parse_ron(r#"{ "presence": ["{name} lingers."] }"#).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            book.generate(ActionCategory::Take, &actor(), &hall(), &mut rng),
            "Alda lingers."
        );
    }

    #[test]
    fn injected_rng_controls_selection() {
        let book =
            PhraseBook::parse_ron(r#"{ "look": ["first", "second"], "presence": ["p"] }"#).unwrap();
        let mut zero = StepRng::new(0, 0);
        assert_eq!(
            book.generate(ActionCategory::Look, &actor(), &hall(), &mut zero),
            "first"
        );
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let book = PhraseBook::builtin().unwrap();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(
                book.generate(ActionCategory::Look, &actor(), &hall(), &mut a),
                book.generate(ActionCategory::Look, &actor(), &hall(), &mut b)
            );
        }
    }

    #[test]
    fn missing_presence_rejected() {
        assert!(matches!(
            PhraseBook::parse_ron(r#"{ "look": ["x"] }"#),
            Err(PhraseError::MissingFallback("presence"))
        ));
    }

    #[test]
    fn unknown_category_rejected() {
        assert!(matches!(
            PhraseBook::parse_ron(r#"{ "dance": ["x"], "presence": ["p"] }"#),
            Err(PhraseError::UnknownCategory(_))
        ));
    }

    #[test]
    fn category_names_collide_case_insensitively() {
        assert!(matches!(
            PhraseBook::parse_ron(r#"{ "Look": ["a"], "look": ["b"], "presence": ["p"] }"#),
            Err(PhraseError::DuplicateCategory(_))
        ));
        assert!(matches!(
            PhraseBook::parse_ron(r#"{ "emote": ["a"], "presence": ["p"] }"#),
            Err(PhraseError::DuplicateCategory(_))
        ));
        let book = PhraseBook::parse_ron(r#"{ "LOOK": ["a"], "Presence": ["p"] }"#).unwrap();
        assert_eq!(book.phrases_for(ActionCategory::Look).len(), 1);
    }
}
