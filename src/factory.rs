//! Parser registry and one-call entry points.
//!
//! A [`ParserFactory`] maps format identifiers to parser constructors and
//! resolves the format and encoding of an input before parsing it. New
//! formats are added with [`ParserFactory::register`] without touching the
//! dispatch code.
//!
//! # Example
//!
//! ```rust
//! # fn main() -> chatparse::Result<()> {
//! use chatparse::factory::{ParseOptions, parse_content};
//!
//! let report = parse_content(
//!     "[1/1/24, 10:00 AM] Alice: Hi",
//!     &ParseOptions::new().with_format("text"),
//! )?;
//! assert_eq!(report.conversation.message_count(), 1);
//! assert_eq!(report.format, "text");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DetectionConfig, ParserConfig};
use crate::conversation::ParsedConversation;
use crate::encoding::{detect_file_encoding, encoding_for_label};
use crate::error::{ChatparseError, ParseWarning, Result};
use crate::format::{FileFormat, detect_file_format};
use crate::parser::Parser;
use crate::parsers::{JsonParser, TextParser};
use crate::streaming::MessageChunks;

/// Builds a parser for a resolved encoding and configuration.
pub type ParserConstructor =
    Arc<dyn Fn(&'static Encoding, &ParserConfig) -> Box<dyn Parser> + Send + Sync>;

/// Per-call overrides that bypass detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Format identifier (`"text"`, `"txt"`, `"json"` or a registered id)
    pub format: Option<String>,

    /// Encoding label (`"utf-8"`, `"windows-1252"`, `"utf-16le"`, ...)
    pub encoding: Option<String>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }
}

/// Result of a factory parse.
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub conversation: ParsedConversation,

    /// Non-fatal problems recorded during the parse
    pub warnings: Vec<ParseWarning>,

    /// Identifier of the parser that ran
    pub format: String,

    /// Name of the encoding used for decoding
    pub encoding: &'static str,
}

impl ParseReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Registry of parser constructors keyed by format identifier.
pub struct ParserFactory {
    registry: HashMap<String, ParserConstructor>,
    config: ParserConfig,
    detection: DetectionConfig,
}

impl ParserFactory {
    /// Creates a factory with the `text` and `json` parsers registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register(TextParser::FORMAT_ID, |encoding, config| {
            Box::new(TextParser::with_config(config.clone()).with_encoding(encoding))
        });
        factory.register(JsonParser::FORMAT_ID, |encoding, config| {
            Box::new(JsonParser::with_config(config.clone()).with_encoding(encoding))
        });
        factory
    }

    /// Creates a factory with no parsers registered.
    pub fn empty() -> Self {
        Self {
            registry: HashMap::new(),
            config: ParserConfig::default(),
            detection: DetectionConfig::default(),
        }
    }

    /// Sets the configuration handed to every parser.
    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the detection configuration.
    #[must_use]
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Registers a constructor, replacing any previous one for the id.
    pub fn register<F>(&mut self, format_id: impl Into<String>, constructor: F)
    where
        F: Fn(&'static Encoding, &ParserConfig) -> Box<dyn Parser> + Send + Sync + 'static,
    {
        let format_id = format_id.into().to_lowercase();
        debug!(format = %format_id, "Registered parser");
        self.registry.insert(format_id, Arc::new(constructor));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_parser<F>(mut self, format_id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&'static Encoding, &ParserConfig) -> Box<dyn Parser> + Send + Sync + 'static,
    {
        self.register(format_id, constructor);
        self
    }

    /// Registered format identifiers, sorted.
    pub fn supported_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.registry.keys().cloned().collect();
        formats.sort();
        formats
    }

    pub fn is_supported(&self, format_id: &str) -> bool {
        self.registry.contains_key(&normalize_format(format_id))
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn detection(&self) -> &DetectionConfig {
        &self.detection
    }

    /// Instantiates the parser registered for `format_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatparseError::UnsupportedFormat`] if nothing is registered.
    pub fn create(&self, format_id: &str, encoding: &'static Encoding) -> Result<Box<dyn Parser>> {
        let format_id = normalize_format(format_id);
        let constructor = self
            .registry
            .get(&format_id)
            .ok_or_else(|| ChatparseError::unsupported_format(&format_id, self.supported_formats()))?;
        Ok(constructor(encoding, &self.config))
    }

    /// Resolves format and encoding for an input and instantiates a parser.
    ///
    /// Explicit options win. Otherwise the format is detected from `path`
    /// and the encoding is detected from its first bytes.
    ///
    /// # Errors
    ///
    /// - [`ChatparseError::InvalidRequest`] without a path or a format
    /// - [`ChatparseError::FormatUndetermined`] if detection gives up
    /// - [`ChatparseError::UnknownEncoding`] for a bad encoding label
    /// - [`ChatparseError::UnsupportedFormat`] for an unregistered format
    pub fn create_parser(&self, options: &ParseOptions, path: Option<&Path>) -> Result<Box<dyn Parser>> {
        let format = self.resolve_format(options, path)?;
        let encoding = self.resolve_encoding(options, path)?;
        debug!(%format, encoding = encoding.name(), "Creating parser");
        self.create(&format, encoding)
    }

    fn resolve_format(&self, options: &ParseOptions, path: Option<&Path>) -> Result<String> {
        if let Some(format) = &options.format {
            return Ok(normalize_format(format));
        }
        let path = path.ok_or_else(|| {
            ChatparseError::invalid_request("an explicit format is required when parsing content")
        })?;
        match detect_file_format(path, &self.detection) {
            FileFormat::Unknown => Err(ChatparseError::format_undetermined(path)),
            format => Ok(format.as_str().to_string()),
        }
    }

    fn resolve_encoding(&self, options: &ParseOptions, path: Option<&Path>) -> Result<&'static Encoding> {
        match (&options.encoding, path) {
            (Some(label), _) => encoding_for_label(label),
            (None, Some(path)) => Ok(detect_file_encoding(path, &self.detection)),
            (None, None) => Ok(UTF_8),
        }
    }

    /// Parses a file into a report.
    pub fn parse_file(&self, path: &Path, options: &ParseOptions) -> Result<ParseReport> {
        let mut parser = self.create_parser(options, Some(path))?;
        let conversation = parser.parse_file(path)?;
        Ok(report(parser.as_mut(), conversation))
    }

    /// Parses already decoded content. `options.format` is required.
    pub fn parse_content(&self, content: &str, options: &ParseOptions) -> Result<ParseReport> {
        let mut parser = self.create_parser(options, None)?;
        let conversation = parser.parse_content(content)?;
        Ok(report(parser.as_mut(), conversation))
    }

    /// Streams a file in chunks of the configured `chunk_size`.
    pub fn parse_stream(&self, path: &Path, options: &ParseOptions) -> Result<Box<dyn MessageChunks>> {
        let mut parser = self.create_parser(options, Some(path))?;
        parser.parse_stream(path, self.config.chunk_size)
    }
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn report(parser: &mut dyn Parser, conversation: ParsedConversation) -> ParseReport {
    ParseReport {
        conversation,
        warnings: parser.take_warnings(),
        format: parser.format_id().to_string(),
        encoding: parser.encoding().name(),
    }
}

/// Maps aliases such as `txt` onto registry ids.
fn normalize_format(format: &str) -> String {
    match format.parse::<FileFormat>() {
        Ok(known) => known.as_str().to_string(),
        Err(_) => format.trim().to_lowercase(),
    }
}

static DEFAULT_FACTORY: LazyLock<ParserFactory> = LazyLock::new(ParserFactory::new);

/// Returns the shared factory with the built-in parsers.
pub fn default_factory() -> &'static ParserFactory {
    &DEFAULT_FACTORY
}

/// Creates a UTF-8 parser for a built-in format.
///
/// # Example
///
/// ```rust
/// use chatparse::FileFormat;
/// use chatparse::factory::create_parser;
///
/// let parser = create_parser(FileFormat::Json).unwrap();
/// assert_eq!(parser.name(), "JSON");
/// ```
pub fn create_parser(format: FileFormat) -> Result<Box<dyn Parser>> {
    default_factory().create(format.as_str(), UTF_8)
}

/// Parses a file with the default factory.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParseReport> {
    default_factory().parse_file(path.as_ref(), options)
}

/// Parses decoded content with the default factory.
pub fn parse_content(content: &str, options: &ParseOptions) -> Result<ParseReport> {
    default_factory().parse_content(content, options)
}
