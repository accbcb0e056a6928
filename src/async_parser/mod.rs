//! Async entry points for use with tokio.
//!
//! Parsing is CPU-bound and has no suspension points, so every call runs
//! the synchronous factory on [`tokio::task::spawn_blocking`] and only
//! awaits the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatparse::async_parser;
//! use chatparse::factory::ParseOptions;
//!
//! # async fn example() -> chatparse::Result<()> {
//! let report = async_parser::parse_file("chat.txt", &ParseOptions::new()).await?;
//! println!("{} messages", report.conversation.message_count());
//!
//! let mut chunks = async_parser::parse_stream("large_chat.txt", &ParseOptions::new(), 4);
//! while let Some(chunk) = chunks.recv().await {
//!     println!("{} messages", chunk?.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! This module requires the `async` feature to be enabled:
//!
//! ```toml
//! [dependencies]
//! chatparse = { version = "0.1", features = ["async"] }
//! ```

use std::path::Path;
use std::sync::{Arc, LazyLock};

use tokio::sync::mpsc;
use tokio::task;
use tracing::debug;

use crate::error::Result;
use crate::factory::{ParseOptions, ParseReport, ParserFactory};
use crate::message::ParsedMessage;

/// Receiving end of a streamed parse.
pub type ChunkReceiver = mpsc::Receiver<Result<Vec<ParsedMessage>>>;

/// Async front end over a shared [`ParserFactory`].
///
/// Cloning is cheap; clones share the factory.
#[derive(Clone)]
pub struct AsyncParser {
    factory: Arc<ParserFactory>,
}

impl AsyncParser {
    /// Creates a front end over a factory with the built-in parsers.
    pub fn new() -> Self {
        Self::with_factory(ParserFactory::new())
    }

    /// Creates a front end over a custom factory.
    pub fn with_factory(factory: ParserFactory) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn factory(&self) -> &ParserFactory {
        &self.factory
    }

    /// Parses a file on a blocking worker.
    ///
    /// # Errors
    ///
    /// Returns the parse error, or [`ChatparseError::Task`](crate::ChatparseError::Task)
    /// if the worker panicked.
    pub async fn parse_file(&self, path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParseReport> {
        let factory = Arc::clone(&self.factory);
        let path = path.as_ref().to_path_buf();
        let options = options.clone();
        task::spawn_blocking(move || factory.parse_file(&path, &options)).await?
    }

    /// Parses decoded content on a blocking worker.
    pub async fn parse_content(&self, content: impl Into<String>, options: &ParseOptions) -> Result<ParseReport> {
        let factory = Arc::clone(&self.factory);
        let content = content.into();
        let options = options.clone();
        task::spawn_blocking(move || factory.parse_content(&content, &options)).await?
    }

    /// Streams a file into a channel holding at most `capacity` chunks.
    ///
    /// The worker blocks while the channel is full and stops once the
    /// receiver is dropped. An error ends the stream: failure to open the
    /// file is the first and only item, a failure mid-file the last one.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn parse_stream(&self, path: impl AsRef<Path>, options: &ParseOptions, capacity: usize) -> ChunkReceiver {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let factory = Arc::clone(&self.factory);
        let path = path.as_ref().to_path_buf();
        let options = options.clone();

        task::spawn_blocking(move || {
            let chunks = match factory.parse_stream(&path, &options) {
                Ok(chunks) => chunks,
                Err(e) => {
                    if tx.blocking_send(Err(e)).is_err() {
                        debug!("Stream receiver dropped before open error was delivered");
                    }
                    return;
                }
            };
            for chunk in chunks {
                if tx.blocking_send(chunk).is_err() {
                    debug!(path = %path.display(), "Stream receiver dropped, stopping worker");
                    return;
                }
            }
        });
        rx
    }
}

impl Default for AsyncParser {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_ASYNC: LazyLock<AsyncParser> = LazyLock::new(AsyncParser::new);

/// Parses a file with the built-in parsers on a blocking worker.
pub async fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParseReport> {
    DEFAULT_ASYNC.parse_file(path, options).await
}

/// Parses decoded content with the built-in parsers on a blocking worker.
pub async fn parse_content(content: impl Into<String>, options: &ParseOptions) -> Result<ParseReport> {
    DEFAULT_ASYNC.parse_content(content, options).await
}

/// Streams a file with the built-in parsers. See [`AsyncParser::parse_stream`].
pub fn parse_stream(path: impl AsRef<Path>, options: &ParseOptions, capacity: usize) -> ChunkReceiver {
    DEFAULT_ASYNC.parse_stream(path, options, capacity)
}
