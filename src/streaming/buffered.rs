//! Chunking over an already parsed message list.
//!
//! Used for inputs that cannot be read incrementally: JSON documents and
//! transcripts in encodings that are not ASCII compatible.

use std::vec::IntoIter;

use crate::error::{ParseWarning, Result};
use crate::message::ParsedMessage;

use super::MessageChunks;

/// Yields a fully parsed message list in fixed-size chunks.
///
/// Byte progress is estimated from the share of messages emitted.
pub struct BufferedChunks {
    messages: IntoIter<ParsedMessage>,
    chunk_size: usize,
    total_messages: usize,
    emitted: usize,
    total_bytes: Option<u64>,
    warnings: Vec<ParseWarning>,
}

impl BufferedChunks {
    /// Wraps `messages`. A `chunk_size` of 0 is treated as 1.
    pub fn new(
        messages: Vec<ParsedMessage>,
        warnings: Vec<ParseWarning>,
        chunk_size: usize,
        total_bytes: Option<u64>,
    ) -> Self {
        Self {
            total_messages: messages.len(),
            messages: messages.into_iter(),
            chunk_size: chunk_size.max(1),
            emitted: 0,
            total_bytes,
            warnings,
        }
    }
}

impl Iterator for BufferedChunks {
    type Item = Result<Vec<ParsedMessage>>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<_> = self.messages.by_ref().take(self.chunk_size).collect();
        if chunk.is_empty() {
            return None;
        }
        self.emitted += chunk.len();
        Some(Ok(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.messages.len().div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl MessageChunks for BufferedChunks {
    fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    fn bytes_processed(&self) -> u64 {
        match (self.total_bytes, self.total_messages) {
            (Some(total), count) if count > 0 => total * self.emitted as u64 / count as u64,
            (Some(total), _) => total,
            (None, _) => 0,
        }
    }

    fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}
