use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single flashcard.
///
/// Cards are kept as the raw JSON object they were read from. Only `uid`,
/// `front` and `tags` are interpreted; every other field, and the order of all
/// fields, is written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(Map<String, Value>);

impl Card {
    /// The card's UID, or an empty string if it has none.
    #[must_use]
    pub fn uid(&self) -> &str {
        self.0.get("uid").and_then(Value::as_str).unwrap_or_default()
    }

    /// Replace the card's UID.
    pub fn set_uid(&mut self, uid: String) {
        self.0.insert("uid".to_string(), Value::String(uid));
    }

    /// The question side of the card, if present.
    #[must_use]
    pub fn front(&self) -> Option<&str> {
        self.0.get("front").and_then(Value::as_str)
    }

    /// The card's tags that are strings, in order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Swap one chapter tag for another.
    ///
    /// `old` is removed wherever it appears. `new` is inserted at the front
    /// unless already present. Other tags keep their relative order. A card
    /// without a `tags` array gets one.
    pub fn retag(&mut self, old: &str, new: &str) {
        let new_tag = Value::String(new.to_string());

        let Some(Value::Array(tags)) = self.0.get_mut("tags") else {
            self.0.insert("tags".to_string(), Value::Array(vec![new_tag]));
            return;
        };

        tags.retain(|tag| tag.as_str() != Some(old));
        if !tags.contains(&new_tag) {
            tags.insert(0, new_tag);
        }
    }
}

impl From<Map<String, Value>> for Card {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

const CARDS: &str = "cards";
const TITLE: &str = "title";

/// One lesson's worth of cards.
///
/// Only `cards` and `title` are interpreted. All top-level fields are written
/// back as they were read, a `null` title included, and `cards` keeps its slot
/// in the key order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Lesson {
    /// The lesson's cards, in file order.
    pub cards: Vec<Card>,

    /// All top-level fields. The `cards` entry is a placeholder marking its
    /// position.
    fields: Map<String, Value>,
}

impl Lesson {
    /// The lesson title. It also names the lesson's Anki subdeck.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.get(TITLE).and_then(Value::as_str)
    }

    /// Returns the index of the first card with the given UID.
    #[must_use]
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.cards.iter().position(|card| card.uid() == uid)
    }
}

impl TryFrom<Map<String, Value>> for Lesson {
    type Error = serde_json::Error;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let cards = match fields.get_mut(CARDS) {
            Some(cards) => serde_json::from_value(cards.take())?,
            None => Vec::new(),
        };
        Ok(Self { cards, fields })
    }
}

impl Serialize for Lesson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_slot = self.fields.contains_key(CARDS);
        let mut map =
            serializer.serialize_map(Some(self.fields.len() + usize::from(!has_slot)))?;
        for (key, value) in &self.fields {
            if key == CARDS {
                map.serialize_entry(key, &self.cards)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        if !has_slot {
            map.serialize_entry(CARDS, &self.cards)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn card(value: Value) -> Card {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_fields_survive_round_trip_in_order() {
        let text = r#"{"uid":"p-01-001","front":"Q","back":"A","tags":["ch01"],"source":{"page":3}}"#;
        let card: Card = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&card).unwrap(), text);
    }

    #[test]
    fn accessors() {
        let card = card(json!({"uid": "p-01-001", "front": "Q", "tags": ["ch01", 3, "x"]}));
        assert_eq!(card.uid(), "p-01-001");
        assert_eq!(card.front(), Some("Q"));
        assert_eq!(card.tags().collect::<Vec<_>>(), ["ch01", "x"]);
    }

    #[test]
    fn missing_fields_have_defaults() {
        let card = Card::default();
        assert_eq!(card.uid(), "");
        assert_eq!(card.front(), None);
        assert_eq!(card.tags().count(), 0);
    }

    #[test]
    fn retag_replaces_chapter_tag_at_front() {
        let mut card = card(json!({"uid": "u", "tags": ["ch12", "important"]}));
        card.retag("ch12", "ch08");
        assert_eq!(card.tags().collect::<Vec<_>>(), ["ch08", "important"]);
    }

    #[test]
    fn retag_keeps_existing_new_tag_in_place() {
        let mut card = card(json!({"tags": ["a", "ch08", "ch12"]}));
        card.retag("ch12", "ch08");
        assert_eq!(card.tags().collect::<Vec<_>>(), ["a", "ch08"]);
    }

    #[test]
    fn retag_without_old_tag_still_adds_new() {
        let mut card = card(json!({"tags": ["x", "y"]}));
        card.retag("ch12", "ch08");
        assert_eq!(card.tags().collect::<Vec<_>>(), ["ch08", "x", "y"]);
    }

    #[test]
    fn retag_creates_missing_tags() {
        let mut card = card(json!({"uid": "u", "front": "Q"}));
        card.retag("ch12", "ch08");
        assert_eq!(card.tags().collect::<Vec<_>>(), ["ch08"]);
    }

    #[test]
    fn lesson_preserves_extra_fields() {
        let lesson: Lesson =
            serde_json::from_value(json!({"title": "T", "cards": [], "level": 2})).unwrap();
        assert_eq!(lesson.title(), Some("T"));
        assert_eq!(
            serde_json::to_value(&lesson).unwrap(),
            json!({"title": "T", "cards": [], "level": 2})
        );
    }

    #[test]
    fn lesson_keeps_top_level_key_order() {
        let text = r#"{"level":2,"title":"T","cards":[{"uid":"a"}],"notes":"n"}"#;
        let lesson: Lesson = serde_json::from_str(text).unwrap();
        assert_eq!(lesson.cards.len(), 1);
        assert_eq!(serde_json::to_string(&lesson).unwrap(), text);
    }

    #[test]
    fn lesson_keeps_null_title() {
        let text = r#"{"title":null,"cards":[]}"#;
        let lesson: Lesson = serde_json::from_str(text).unwrap();
        assert_eq!(lesson.title(), None);
        assert_eq!(serde_json::to_string(&lesson).unwrap(), text);
    }

    #[test]
    fn lesson_without_cards_gains_them_last() {
        let mut lesson: Lesson = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        lesson.cards.push(card(json!({"uid": "a"})));
        assert_eq!(
            serde_json::to_string(&lesson).unwrap(),
            r#"{"title":"T","cards":[{"uid":"a"}]}"#
        );
    }

    #[test]
    fn malformed_cards_are_rejected() {
        assert!(serde_json::from_str::<Lesson>(r#"{"cards":{"uid":"a"}}"#).is_err());
    }

    #[test]
    fn lesson_position() {
        let lesson = Lesson {
            cards: vec![card(json!({"uid": "a"})), card(json!({"uid": "b"}))],
            ..Lesson::default()
        };
        assert_eq!(lesson.position("b"), Some(1));
        assert_eq!(lesson.position("c"), None);
    }
}
