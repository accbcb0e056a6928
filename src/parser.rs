//! Unified parser trait for chat exports.
//!
//! Every input format implements [`Parser`]. The trait supplies file
//! reading, decoding and chunked streaming on top of a single required
//! `parse_content` method.
//!
//! # Example
//!
//! ```rust
//! # fn main() -> chatparse::Result<()> {
//! use chatparse::parser::Parser;
//! use chatparse::parsers::TextParser;
//!
//! let mut parser = TextParser::new();
//! let conv = parser.parse_content("[1/1/24, 10:00 AM] Alice: Hi\n[1/1/24, 10:01 AM] Bob: Hello")?;
//!
//! assert_eq!(conv.message_count(), 2);
//! assert!(parser.warnings().is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Warnings and reuse
//!
//! A parser keeps the warnings of its most recent parse call; each call
//! clears them first. Parse methods take `&mut self`, so one instance
//! cannot serve overlapping parses. Create one parser per thread instead.

use std::fs;
use std::path::Path;

use encoding_rs::Encoding;

use crate::config::ParserConfig;
use crate::conversation::ParsedConversation;
use crate::encoding::decode_bytes;
use crate::error::{ParseWarning, Result};
use crate::streaming::{BufferedChunks, MessageChunks};

/// A parser for one export format.
pub trait Parser: Send {
    /// Returns the human-readable name of this parser.
    fn name(&self) -> &'static str;

    /// Returns the registry identifier of the format (`"text"`, `"json"`).
    fn format_id(&self) -> &'static str;

    /// Returns the encoding used to decode bytes.
    fn encoding(&self) -> &'static Encoding;

    /// Returns the parser configuration.
    fn config(&self) -> &ParserConfig;

    /// Parses decoded content into a conversation.
    fn parse_content(&mut self, content: &str) -> Result<ParsedConversation>;

    /// Decodes `bytes` with [`encoding`](Self::encoding) and parses them.
    fn parse_bytes(&mut self, bytes: &[u8]) -> Result<ParsedConversation> {
        let text = decode_bytes(bytes, self.encoding(), self.config().lossy_decoding)?;
        self.parse_content(&text)
    }

    /// Reads and parses a file.
    ///
    /// # Errors
    ///
    /// Returns [`ChatparseError::Io`](crate::ChatparseError::Io) if the file
    /// cannot be read, and any decode error with the path attached.
    fn parse_file(&mut self, path: &Path) -> Result<ParsedConversation> {
        let bytes = fs::read(path)?;
        self.parse_bytes(&bytes).map_err(|e| e.with_path(path))
    }

    /// Parses a file into chunks of at most `chunk_size` messages.
    ///
    /// The default parses the whole file and then chunks the result.
    fn parse_stream(&mut self, path: &Path, chunk_size: usize) -> Result<Box<dyn MessageChunks>> {
        buffered_stream(self, path, chunk_size)
    }

    /// Warnings recorded by the most recent parse call.
    ///
    /// A streamed parse reports its warnings through
    /// [`MessageChunks::warnings`] on the returned iterator; text streaming
    /// leaves this list empty.
    fn warnings(&self) -> &[ParseWarning];

    /// Drains and returns the recorded warnings.
    fn take_warnings(&mut self) -> Vec<ParseWarning>;
}

/// Parses the whole file with `parser` and chunks the messages.
pub(crate) fn buffered_stream<P: Parser + ?Sized>(
    parser: &mut P,
    path: &Path,
    chunk_size: usize,
) -> Result<Box<dyn MessageChunks>> {
    let total_bytes = fs::metadata(path)?.len();
    let conversation = parser.parse_file(path)?;
    Ok(Box::new(BufferedChunks::new(
        conversation.into_messages(),
        parser.warnings().to_vec(),
        chunk_size,
        Some(total_bytes),
    )))
}
