//! JSON export parser.
//!
//! Three document shapes are accepted:
//!
//! ```json
//! {"name": "Family", "participants": [...], "messages": [...]}
//! [{"timestamp": 1704103200, "from": "Alice", "type": "text", ...}, ...]
//! [{"timestamp": ...}, {"name": "Family", "messages": [...]}]
//! ```
//!
//! Conversation objects may use `data` instead of `messages`. Message
//! nodes are read by [`parse_message_node`].

use encoding_rs::{Encoding, UTF_8};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::config::ParserConfig;
use crate::conversation::ParsedConversation;
use crate::error::{ChatparseError, ParseWarning, Result, WarningKind};
use crate::parser::Parser;
use crate::parsing::json::{parse_message_node, parse_participant, scalar_text, value_kind};

use super::finish_conversation;

/// Parser for JSON chat exports.
///
/// # Example
///
/// ```rust
/// # fn main() -> chatparse::Result<()> {
/// use chatparse::parser::Parser;
/// use chatparse::parsers::JsonParser;
///
/// let mut parser = JsonParser::new();
/// let conv = parser.parse_content(
///     r#"{"name": "Team", "messages": [{"timestamp": 1704103200, "from": "Alice", "text": {"body": "Hi"}}]}"#,
/// )?;
/// assert_eq!(conv.title.as_deref(), Some("Team"));
/// assert_eq!(conv.messages()[0].content.as_deref(), Some("Hi"));
/// # Ok(())
/// # }
/// ```
pub struct JsonParser {
    config: ParserConfig,
    encoding: &'static Encoding,
    warnings: Vec<ParseWarning>,
}

impl JsonParser {
    pub const FORMAT_ID: &'static str = "json";

    /// Creates a UTF-8 parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Creates a UTF-8 parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            encoding: UTF_8,
            warnings: Vec::new(),
        }
    }

    /// Sets the encoding used for bytes and files.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Reads title, participants and messages of a conversation object.
    fn read_conversation(&mut self, obj: &Map<String, Value>, conversation: &mut ParsedConversation) {
        if let Some(title) = ["name", "chat_name"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(scalar_text))
        {
            conversation.title = Some(title);
        }

        if let Some(participants) = obj.get("participants").and_then(Value::as_array) {
            for entry in participants {
                match parse_participant(entry) {
                    Some(participant) => {
                        conversation.add_participant(participant);
                    }
                    None => self.warnings.push(ParseWarning::new(
                        WarningKind::UnexpectedStructure,
                        format!("Skipping participant entry of kind {}", value_kind(entry)),
                    )),
                }
            }
        }

        let messages = match obj.get("messages") {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => obj.get("data").and_then(Value::as_array),
        };
        match messages {
            Some(items) => self.read_messages(items, conversation),
            None => {
                if let Some(other) = obj.get("messages").filter(|v| !v.is_array()) {
                    self.warnings.push(ParseWarning::new(
                        WarningKind::UnexpectedStructure,
                        format!("Expected a messages array, found {}", value_kind(other)),
                    ));
                }
            }
        }
    }

    fn read_messages(&mut self, items: &[Value], conversation: &mut ParsedConversation) {
        for item in items {
            if let Some(message) = parse_message_node(item, &mut self.warnings) {
                conversation.add_message(message);
            }
        }
    }

    /// Reads a top-level array of messages.
    ///
    /// The first conversation object in the array is read in place and ends
    /// the scan; messages before it are kept.
    fn read_array(&mut self, items: &[Value], conversation: &mut ParsedConversation) {
        for item in items {
            if let Some(obj) = item.as_object().filter(|o| is_conversation(o)) {
                self.read_conversation(obj, conversation);
                return;
            }
            if let Some(message) = parse_message_node(item, &mut self.warnings) {
                conversation.add_message(message);
            }
        }
    }
}

fn is_conversation(obj: &Map<String, Value>) -> bool {
    obj.contains_key("messages")
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for JsonParser {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn format_id(&self) -> &'static str {
        Self::FORMAT_ID
    }

    fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse_content(&mut self, content: &str) -> Result<ParsedConversation> {
        self.warnings.clear();

        let root: Value = serde_json::from_str(content).map_err(|e| {
            error!(line = e.line(), column = e.column(), "Invalid JSON document: {e}");
            ChatparseError::json_decode(e, None)
        })?;

        let mut conversation = ParsedConversation::new();
        match &root {
            Value::Object(obj) => self.read_conversation(obj, &mut conversation),
            Value::Array(items) => self.read_array(items, &mut conversation),
            other => self.warnings.push(ParseWarning::new(
                WarningKind::UnexpectedStructure,
                format!("Unexpected top-level {}", value_kind(other)),
            )),
        }

        for warning in &self.warnings {
            debug!(%warning, "JSON parse warning");
        }
        finish_conversation(
            &mut conversation,
            self.name(),
            Self::FORMAT_ID,
            self.encoding,
            &self.config,
            self.warnings.len(),
        );
        Ok(conversation)
    }

    fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }
}
