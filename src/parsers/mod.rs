//! Concrete parsers for each export format.
//!
//! # Available Parsers
//!
//! - [`TextParser`] - Line-oriented transcripts (`.txt`)
//! - [`JsonParser`] - JSON exports, conversation objects or message arrays
//!
//! Both implement [`Parser`](crate::parser::Parser). Use
//! [`ParserFactory`](crate::factory::ParserFactory) to pick one from a file.

mod json;
mod text;

pub use json::JsonParser;
pub use text::TextParser;

use encoding_rs::Encoding;
use serde_json::Value;
use tracing::info;

use crate::config::ParserConfig;
use crate::conversation::ParsedConversation;

/// Stamps format metadata on a finished conversation and logs the result.
pub(crate) fn finish_conversation(
    conversation: &mut ParsedConversation,
    parser: &str,
    format_id: &str,
    encoding: &'static Encoding,
    config: &ParserConfig,
    warnings: usize,
) {
    conversation
        .metadata
        .insert("format".into(), Value::from(format_id));
    conversation
        .metadata
        .insert("encoding".into(), Value::from(encoding.name()));

    if config.infer_title && conversation.participant_count() > 0 {
        conversation.infer_title();
    }

    info!(
        parser,
        messages = conversation.message_count(),
        participants = conversation.participant_count(),
        warnings,
        "Parsed conversation"
    );
}
