//! Shared parsing utilities.
//!
//! Parser-independent building blocks used by both the in-memory parsers
//! and the streaming iterators.

pub mod json;
pub mod text;

// Re-export commonly used items
pub use json::{extract_sender, extract_timestamp, parse_message_node, parse_participant};
pub use text::{LineMachine, PATTERN_TABLE, PatternRow, Prefix, classify, clean_line, match_prefix};
