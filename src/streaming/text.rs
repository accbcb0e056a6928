//! Line-by-line streaming for transcripts.
//!
//! Reads raw lines with [`BufRead::read_until`], decodes each one and feeds
//! it to a [`LineMachine`]. Only the message being assembled and the current
//! chunk are held in memory.
//!
//! Splitting on `\n` bytes is only sound for ASCII-compatible encodings;
//! callers fall back to [`BufferedChunks`](super::BufferedChunks) otherwise.

use std::io::BufRead;

use encoding_rs::Encoding;
use tracing::debug;

use crate::encoding::decode_fragment;
use crate::error::{ParseWarning, Result};
use crate::message::ParsedMessage;
use crate::parsing::text::LineMachine;

use super::MessageChunks;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Iterator over chunks of transcript messages.
pub struct TextChunkIterator<R: BufRead> {
    reader: R,
    encoding: &'static Encoding,
    lossy: bool,
    machine: LineMachine,
    chunk_size: usize,
    line_buffer: Vec<u8>,
    bytes_read: u64,
    total_bytes: Option<u64>,
    finished: bool,
}

impl<R: BufRead> TextChunkIterator<R> {
    /// Creates an iterator. A `chunk_size` of 0 is treated as 1.
    pub fn new(
        reader: R,
        encoding: &'static Encoding,
        lossy: bool,
        chunk_size: usize,
        total_bytes: Option<u64>,
    ) -> Self {
        Self {
            reader,
            encoding,
            lossy,
            machine: LineMachine::new(),
            chunk_size: chunk_size.max(1),
            line_buffer: Vec::with_capacity(1024),
            bytes_read: 0,
            total_bytes,
            finished: false,
        }
    }
}

impl<R: BufRead + Send> Iterator for TextChunkIterator<R> {
    type Item = Result<Vec<ParsedMessage>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut chunk = Vec::new();
        loop {
            self.line_buffer.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line_buffer) {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            };

            if read == 0 {
                self.finished = true;
                chunk.extend(self.machine.finish());
                debug!(
                    lines = self.machine.line_number(),
                    bytes = self.bytes_read,
                    "Transcript stream finished"
                );
                break;
            }

            let mut bytes = self.line_buffer.as_slice();
            if self.bytes_read == 0 {
                bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            }
            self.bytes_read += read as u64;

            let line = match decode_fragment(bytes, self.encoding, self.lossy) {
                Ok(line) => line,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            if let Some(message) = self.machine.feed(&line) {
                chunk.push(message);
                if chunk.len() >= self.chunk_size {
                    return Some(Ok(chunk));
                }
            }
        }

        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

impl<R: BufRead + Send> MessageChunks for TextChunkIterator<R> {
    fn warnings(&self) -> &[ParseWarning] {
        self.machine.warnings()
    }

    fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}
