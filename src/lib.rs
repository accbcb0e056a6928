//! # Chatparse
//!
//! A Rust library for turning exported chat transcripts into a normalized
//! conversation model.
//!
//! ## Overview
//!
//! Two export shapes are supported:
//! - **Transcripts** — line-oriented `.txt` exports with regional date
//!   formats, 12/24-hour clocks, bracket or dash framing, multi-line
//!   messages, system notices, attachments, deletions and edits
//! - **JSON** — conversation objects or bare message arrays with no fixed
//!   schema
//!
//! Format and encoding are detected when not given. Lines and nodes that
//! cannot be fully classified are kept where possible and reported as
//! [`ParseWarning`]s instead of failing the parse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatparse::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let report = parse_file("chat.txt", &ParseOptions::new())?;
//!
//!     for message in report.conversation.messages() {
//!         println!("{} {}: {:?}", message.timestamp, message.sender, message.content);
//!     }
//!     for warning in &report.warnings {
//!         eprintln!("{warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming for Large Files
//!
//! ```rust,no_run
//! use chatparse::prelude::*;
//! use std::path::Path;
//!
//! let mut parser = TextParser::new();
//! for chunk in parser.parse_stream(Path::new("huge_chat.txt"), 1000)? {
//!     println!("{} messages", chunk?.len());
//! }
//! # Ok::<(), chatparse::ChatparseError>(())
//! ```
//!
//! ## Module Structure
//!
//! - [`parser`] — the [`Parser`](parser::Parser) trait
//! - [`parsers`] — [`TextParser`], [`JsonParser`]
//! - [`factory`] — [`ParserFactory`], [`ParseOptions`], [`ParseReport`]
//! - [`format`] / [`encoding`] — input detection
//! - [`parsing`] — shared building blocks (date table, line state machine,
//!   JSON node helpers)
//! - [`streaming`] — chunked parsing with progress
//! - [`message`] / [`conversation`] — the output model
//! - [`config`] — [`ParserConfig`], [`DetectionConfig`]
//! - [`error`] — [`ChatparseError`], [`ParseWarning`], [`Result`]
//! - `async_parser` — tokio entry points (feature `async`)
//! - [`prelude`] — convenient re-exports

#[cfg(feature = "async")]
pub mod async_parser;
pub mod config;
pub mod conversation;
pub mod encoding;
pub mod error;
pub mod factory;
pub mod format;
pub mod message;
pub mod parser;
pub mod parsers;
pub mod parsing;
pub mod streaming;

// Re-export the main types at the crate root for convenience
pub use config::{DetectionConfig, ParserConfig};
pub use conversation::{ParsedConversation, ParsedParticipant, extract_phone_number};
pub use encoding_rs::Encoding;
pub use error::{ChatparseError, ParseWarning, Result, WarningKind};
pub use factory::{ParseOptions, ParseReport, ParserFactory, create_parser, parse_content, parse_file};
pub use format::FileFormat;
pub use message::{AttachmentType, MessageType, ParsedAttachment, ParsedMessage};
pub use parsers::{JsonParser, TextParser};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatparse::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{DetectionConfig, ParserConfig};
    pub use crate::conversation::{ParsedConversation, ParsedParticipant};
    pub use crate::error::{ChatparseError, ParseWarning, Result, WarningKind};
    pub use crate::factory::{
        ParseOptions, ParseReport, ParserFactory, create_parser, default_factory, parse_content,
        parse_file,
    };
    pub use crate::format::FileFormat;
    pub use crate::message::{AttachmentType, MessageType, ParsedAttachment, ParsedMessage};
    pub use crate::parser::Parser;
    pub use crate::parsers::{JsonParser, TextParser};
    pub use crate::streaming::MessageChunks;
}
