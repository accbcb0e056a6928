//! Streaming parsing for large chat exports.
//!
//! [`Parser::parse_stream`](crate::parser::Parser::parse_stream) returns a
//! [`MessageChunks`] iterator that yields messages in fixed-size batches.
//!
//! # Strategies
//!
//! | Input | Iterator | Memory |
//! |-------|----------|--------|
//! | Transcript, ASCII-compatible encoding | [`TextChunkIterator`] | one chunk |
//! | Transcript, UTF-16 | [`BufferedChunks`] | whole file |
//! | JSON | [`BufferedChunks`] | whole file |
//!
//! A stream cannot be resumed part-way; parse again to restart it.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatparse::parser::Parser;
//! use chatparse::parsers::TextParser;
//! use std::path::Path;
//!
//! let mut parser = TextParser::new();
//! let mut total = 0;
//! for chunk in parser.parse_stream(Path::new("large_chat.txt"), 1000).unwrap() {
//!     total += chunk.unwrap().len();
//! }
//! println!("{total} messages");
//! ```

mod buffered;
mod text;
mod traits;

pub use buffered::BufferedChunks;
pub use text::TextChunkIterator;
pub use traits::MessageChunks;
