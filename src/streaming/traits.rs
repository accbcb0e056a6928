//! Core trait for streamed parsing.

use crate::error::{ParseWarning, Result};
use crate::message::ParsedMessage;

/// Iterator over chunks of finished messages with progress tracking.
///
/// Each item is a batch of at most `chunk_size` messages in parse order.
/// An `Err` item is fatal: the iterator yields nothing after it.
///
/// # Object Safety
///
/// This trait is object-safe, enabling dynamic dispatch via
/// `Box<dyn MessageChunks>`.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> chatparse::Result<()> {
/// use chatparse::parser::Parser;
/// use chatparse::parsers::TextParser;
/// use std::path::Path;
///
/// let mut parser = TextParser::new();
/// let mut chunks = parser.parse_stream(Path::new("chat.txt"), 500)?;
///
/// while let Some(chunk) = chunks.next() {
///     let chunk = chunk?;
///     if let Some(pct) = chunks.progress() {
///         eprintln!("{} messages, {:.1}%", chunk.len(), pct);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub trait MessageChunks: Iterator<Item = Result<Vec<ParsedMessage>>> + Send {
    /// Warnings recorded so far.
    fn warnings(&self) -> &[ParseWarning];

    /// Returns the number of bytes consumed so far.
    fn bytes_processed(&self) -> u64;

    /// Returns the total input size in bytes, if known.
    fn total_bytes(&self) -> Option<u64> {
        None
    }

    /// Returns approximate progress as a percentage (0.0 to 100.0).
    ///
    /// Returns `None` if the total size is unknown or zero.
    fn progress(&self) -> Option<f64> {
        self.total_bytes()
            .filter(|&total| total > 0)
            .map(|total| (self.bytes_processed() as f64 / total as f64 * 100.0).min(100.0))
    }
}
