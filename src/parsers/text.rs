//! Transcript (`.txt`) export parser.
//!
//! Supported line shapes include:
//! - `[1/15/24, 10:30:45 AM] Sender: Message`
//! - `[15.01.24, 10:30:45] Sender: Message`
//! - `15/01/2024, 10:30 - Sender: Message`
//! - `2024-01-15 10:30 – Sender: Message`
//!
//! See [`crate::parsing::text`] for the pattern table and classification.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::config::ParserConfig;
use crate::conversation::ParsedConversation;
use crate::error::{ParseWarning, Result};
use crate::parser::{Parser, buffered_stream};
use crate::parsing::text::LineMachine;
use crate::streaming::{MessageChunks, TextChunkIterator};

use super::finish_conversation;

/// Parser for line-oriented chat transcripts.
///
/// # Example
///
/// ```rust
/// # fn main() -> chatparse::Result<()> {
/// use chatparse::parser::Parser;
/// use chatparse::parsers::TextParser;
///
/// let mut parser = TextParser::new();
/// let conv = parser.parse_content("12/31/23, 23:59 - Alice: Happy new year!")?;
/// assert_eq!(conv.messages()[0].sender, "Alice");
/// # Ok(())
/// # }
/// ```
pub struct TextParser {
    config: ParserConfig,
    encoding: &'static Encoding,
    warnings: Vec<ParseWarning>,
}

impl TextParser {
    pub const FORMAT_ID: &'static str = "text";

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
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for TextParser {
    fn name(&self) -> &'static str {
        "Transcript"
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

        let mut machine = LineMachine::new();
        let mut conversation = ParsedConversation::new();
        for line in content.split('\n') {
            if let Some(message) = machine.feed(line) {
                conversation.add_message(message);
            }
        }
        if let Some(message) = machine.finish() {
            conversation.add_message(message);
        }
        self.warnings = machine.take_warnings();

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

    /// Streams line by line when the encoding allows it.
    ///
    /// A byte order mark at the start of the file overrides the configured
    /// encoding. UTF-16 input is parsed whole and then chunked.
    fn parse_stream(&mut self, path: &Path, chunk_size: usize) -> Result<Box<dyn MessageChunks>> {
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();
        let mut reader = BufReader::with_capacity(self.config.buffer_size.max(1), file);

        let encoding = Encoding::for_bom(reader.fill_buf()?)
            .map_or(self.encoding, |(bom_encoding, _)| bom_encoding);
        if !encoding.is_ascii_compatible() {
            debug!(encoding = encoding.name(), "Encoding not line-splittable, buffering file");
            return buffered_stream(self, path, chunk_size);
        }

        self.warnings.clear();
        Ok(Box::new(TextChunkIterator::new(
            reader,
            encoding,
            self.config.lossy_decoding,
            chunk_size,
            Some(total_bytes),
        )))
    }

    fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }
}
