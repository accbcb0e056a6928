//! Conversation and participant types.
//!
//! A [`ParsedConversation`] is built fresh by every parse call. Messages are
//! kept in parse order and each one contributes its sender to a
//! deduplicated participant set.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Metadata, ParsedMessage};

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\+?\d[\d\s\-()]+\d)").expect("valid phone regex"));

/// Extracts a phone number from a free-text sender string.
///
/// This is a heuristic. Long numeric codes in a name are reported as phone
/// numbers and numbers split by unusual punctuation are missed. Spaces,
/// dashes and parentheses inside the match are removed.
///
/// ```
/// use chatparse::extract_phone_number;
///
/// assert_eq!(extract_phone_number("+1 (234) 567-8900").as_deref(), Some("+12345678900"));
/// assert_eq!(extract_phone_number("Alice"), None);
/// ```
pub fn extract_phone_number(sender: &str) -> Option<String> {
    PHONE_PATTERN.find(sender).map(|m| {
        m.as_str()
            .chars()
            .filter(|c| !matches!(c, '-' | '(' | ')') && !c.is_whitespace())
            .collect()
    })
}

/// A conversation member.
///
/// Identity is the `(phone_number, display_name)` pair. The business flag and
/// metadata do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedParticipant {
    #[serde(default)]
    pub phone_number: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub is_business: bool,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    #[serde(default)]
    pub metadata: Metadata,
}

impl ParsedParticipant {
    pub fn new(phone_number: Option<String>, display_name: impl Into<String>) -> Self {
        Self {
            phone_number,
            display_name: display_name.into(),
            is_business: false,
            metadata: Metadata::new(),
        }
    }

    /// Builds the participant a message sender stands for.
    pub fn from_sender(sender: &str) -> Self {
        Self::new(extract_phone_number(sender), sender)
    }

    #[must_use]
    pub fn with_business(mut self, is_business: bool) -> Self {
        self.is_business = is_business;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl PartialEq for ParsedParticipant {
    fn eq(&self, other: &Self) -> bool {
        self.phone_number == other.phone_number && self.display_name == other.display_name
    }
}

impl Eq for ParsedParticipant {}

impl Hash for ParsedParticipant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.phone_number.hash(state);
        self.display_name.hash(state);
    }
}

/// The result of parsing one export.
///
/// # Example
///
/// ```
/// use chatparse::{ParsedConversation, ParsedMessage};
/// use chrono::{TimeZone, Utc};
///
/// let mut conv = ParsedConversation::new();
/// let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
/// conv.add_message(ParsedMessage::new(ts, "Alice", Some("Hi".into())));
/// conv.add_message(ParsedMessage::new(ts, "Alice", Some("Again".into())));
///
/// assert_eq!(conv.message_count(), 2);
/// assert_eq!(conv.participant_count(), 1);
/// assert_eq!(conv.started_at(), Some(ts));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedConversation {
    pub title: Option<String>,
    participants: Vec<ParsedParticipant>,
    messages: Vec<ParsedMessage>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
    #[serde(skip)]
    seen: HashSet<ParsedParticipant>,
}

impl ParsedConversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, widens the time range and records its sender.
    pub fn add_message(&mut self, message: ParsedMessage) {
        let ts = message.timestamp;
        if self.started_at.is_none_or(|start| ts < start) {
            self.started_at = Some(ts);
        }
        if self.ended_at.is_none_or(|end| ts > end) {
            self.ended_at = Some(ts);
        }

        self.add_participant(ParsedParticipant::from_sender(&message.sender));
        self.messages.push(message);
    }

    /// Adds a participant unless one with the same identity exists.
    ///
    /// Returns `true` if the participant was new.
    pub fn add_participant(&mut self, participant: ParsedParticipant) -> bool {
        if self.seen.contains(&participant) {
            return false;
        }
        self.seen.insert(participant.clone());
        self.participants.push(participant);
        true
    }

    /// Sets a title from the participant count if none is set yet.
    ///
    /// Two participants give `"Chat with {second}"`, anything else gives
    /// `"Group chat ({n} participants)"`.
    pub fn infer_title(&mut self) {
        if self.title.is_some() {
            return;
        }
        self.title = Some(match self.participants.as_slice() {
            [_, other] => format!("Chat with {}", other.display_name),
            all => format!("Group chat ({} participants)", all.len()),
        });
    }

    pub fn messages(&self) -> &[ParsedMessage] {
        &self.messages
    }

    pub fn participants(&self) -> &[ParsedParticipant] {
        &self.participants
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the conversation and returns its messages.
    pub fn into_messages(self) -> Vec<ParsedMessage> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(minute: u32, sender: &str) -> ParsedMessage {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap();
        ParsedMessage::new(ts, sender, Some("x".into()))
    }

    // =========================================================================
    // Phone extraction
    // =========================================================================

    #[test]
    fn test_extract_phone_number_formats() {
        assert_eq!(extract_phone_number("+1 234 567 8900").as_deref(), Some("+12345678900"));
        assert_eq!(
            extract_phone_number("+1234567890 (Business)").as_deref(),
            Some("+1234567890")
        );
        assert_eq!(extract_phone_number("John Doe"), None);
    }

    #[test]
    fn test_extract_phone_number_heuristic_limits() {
        // Digits inside a name are read as a number.
        assert_eq!(extract_phone_number("Team 420").as_deref(), Some("420"));
        // Fewer than three digits are never a number.
        assert_eq!(extract_phone_number("Agent 47"), None);
    }

    // =========================================================================
    // Participants
    // =========================================================================

    #[test]
    fn test_participant_identity_ignores_business_and_metadata() {
        let a = ParsedParticipant::new(Some("+1".into()), "Alice");
        let b = ParsedParticipant::new(Some("+1".into()), "Alice")
            .with_business(true)
            .with_metadata("status", "busy");
        assert_eq!(a, b);

        let c = ParsedParticipant::new(Some("+2".into()), "Alice");
        assert_ne!(a, c);
    }

    #[test]
    fn test_add_participant_dedup() {
        let mut conv = ParsedConversation::new();
        assert!(conv.add_participant(ParsedParticipant::new(None, "Alice")));
        assert!(!conv.add_participant(ParsedParticipant::new(None, "Alice")));
        assert!(conv.add_participant(ParsedParticipant::new(Some("+1".into()), "Alice")));
        assert_eq!(conv.participant_count(), 2);
    }

    // =========================================================================
    // Conversation
    // =========================================================================

    #[test]
    fn test_add_message_tracks_range_out_of_order() {
        let mut conv = ParsedConversation::new();
        conv.add_message(msg(5, "Alice"));
        conv.add_message(msg(1, "Bob"));
        conv.add_message(msg(9, "Alice"));

        assert_eq!(conv.message_count(), 3);
        assert_eq!(conv.participant_count(), 2);
        assert_eq!(conv.started_at(), Some(msg(1, "x").timestamp));
        assert_eq!(conv.ended_at(), Some(msg(9, "x").timestamp));
        // Insertion order is kept
        assert_eq!(conv.messages()[1].sender, "Bob");
    }

    #[test]
    fn test_infer_title_two_participants() {
        let mut conv = ParsedConversation::new();
        conv.add_message(msg(0, "Alice"));
        conv.add_message(msg(1, "Bob"));
        conv.infer_title();
        assert_eq!(conv.title.as_deref(), Some("Chat with Bob"));
    }

    #[test]
    fn test_infer_title_group_and_empty() {
        let mut conv = ParsedConversation::new();
        conv.infer_title();
        assert_eq!(conv.title.as_deref(), Some("Group chat (0 participants)"));

        let mut group = ParsedConversation::new();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            group.add_message(msg(i as u32, name));
        }
        group.infer_title();
        assert_eq!(group.title.as_deref(), Some("Group chat (3 participants)"));
    }

    #[test]
    fn test_infer_title_keeps_existing() {
        let mut conv = ParsedConversation::new();
        conv.title = Some("Family".into());
        conv.add_message(msg(0, "Alice"));
        conv.infer_title();
        assert_eq!(conv.title.as_deref(), Some("Family"));
    }

    #[test]
    fn test_serialize_skips_index() {
        let mut conv = ParsedConversation::new();
        conv.add_message(msg(0, "Alice"));
        let json = serde_json::to_value(&conv).unwrap();
        assert!(json.get("seen").is_none());
        assert_eq!(json["participants"][0]["display_name"], "Alice");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_into_messages() {
        let mut conv = ParsedConversation::new();
        conv.add_message(msg(0, "Alice"));
        assert_eq!(conv.into_messages().len(), 1);
    }
}
