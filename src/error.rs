//! Unified error and warning types for chatparse.
//!
//! Two tiers of failure exist:
//!
//! - [`ChatparseError`] is fatal. The parse produced nothing usable
//!   (undetectable format, malformed JSON, undecodable bytes, I/O failure).
//! - [`ParseWarning`] is recorded on the parser and parsing continues.
//!   Orphaned lines, timestamps that cannot be read and unknown message
//!   types all end up here.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A specialized [`Result`] type for chatparse operations.
///
/// # Example
///
/// ```rust
/// use chatparse::error::Result;
/// use chatparse::ParsedConversation;
///
/// fn my_function() -> Result<ParsedConversation> {
///     Ok(ParsedConversation::new())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatparseError>;

/// The error type for all chatparse operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatparseError {
    /// An I/O error occurred while reading the input.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Extension, MIME sniffing and content sniffing all failed.
    ///
    /// No parser is attempted when this is returned.
    #[error("Could not determine the format of {}", path.display())]
    FormatUndetermined {
        /// The file that was inspected
        path: PathBuf,
    },

    /// No parser is registered for the requested format.
    #[error("Unsupported format '{format}'. Registered formats: {}", registered.join(", "))]
    UnsupportedFormat {
        /// The format identifier that was requested
        format: String,
        /// Format identifiers known to the factory
        registered: Vec<String>,
    },

    /// The document is not structurally valid.
    #[error("Failed to decode {format} document{}: {source}", display_path(path.as_deref()))]
    Decode {
        /// The format being decoded (e.g. "JSON")
        format: &'static str,
        /// The underlying decoder error
        #[source]
        source: serde_json::Error,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// An encoding label was supplied that no decoder knows.
    #[error("Unknown encoding label '{label}'")]
    UnknownEncoding {
        /// The label as given by the caller
        label: String,
    },

    /// The bytes are not valid in the selected encoding.
    #[error("Content is not valid {encoding}{}", display_path(path.as_deref()))]
    Undecodable {
        /// Name of the encoding that was used
        encoding: &'static str,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// The request cannot be served as given.
    ///
    /// Returned when neither a path nor an explicit format is available
    /// to pick a parser.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A background parse task panicked or was cancelled.
    #[cfg(feature = "async")]
    #[error("Background parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| format!(" (file: {})", p.display()))
        .unwrap_or_default()
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatparseError {
    /// Creates a decode error for a JSON document.
    pub fn json_decode(source: serde_json::Error, path: Option<PathBuf>) -> Self {
        ChatparseError::Decode {
            format: "JSON",
            source,
            path,
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>, registered: Vec<String>) -> Self {
        ChatparseError::UnsupportedFormat {
            format: format.into(),
            registered,
        }
    }

    /// Creates an undetermined format error.
    pub fn format_undetermined(path: impl Into<PathBuf>) -> Self {
        ChatparseError::FormatUndetermined { path: path.into() }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ChatparseError::InvalidRequest(message.into())
    }

    /// Attaches a file path to errors that carry one.
    #[must_use]
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            ChatparseError::Decode {
                format,
                source,
                path: None,
            } => ChatparseError::Decode {
                format,
                source,
                path: Some(file.to_path_buf()),
            },
            ChatparseError::Undecodable {
                encoding,
                path: None,
            } => ChatparseError::Undecodable {
                encoding,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatparseError::Io(_))
    }

    /// Returns `true` if this is a document decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, ChatparseError::Decode { .. })
    }

    /// Returns `true` if format detection gave up.
    pub fn is_format_undetermined(&self) -> bool {
        matches!(self, ChatparseError::FormatUndetermined { .. })
    }

    /// Returns `true` if no parser is registered for the format.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, ChatparseError::UnsupportedFormat { .. })
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Category of a non-fatal parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A text line had no date prefix and no message to continue.
    MalformedLine,
    /// A text line had a date prefix whose date or time is impossible.
    InvalidDate,
    /// A JSON message had no readable timestamp and was skipped.
    UnparseableTimestamp,
    /// A JSON message had an unrecognized type and was kept as text.
    UnknownMessageType,
    /// A JSON node had the wrong shape and was skipped.
    UnexpectedStructure,
}

impl WarningKind {
    /// Returns the snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::MalformedLine => "malformed_line",
            WarningKind::InvalidDate => "invalid_date",
            WarningKind::UnparseableTimestamp => "unparseable_timestamp",
            WarningKind::UnknownMessageType => "unknown_message_type",
            WarningKind::UnexpectedStructure => "unexpected_structure",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// What went wrong
    pub kind: WarningKind,
    /// Human-readable description
    pub message: String,
    /// 1-based line number for text input
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub line_number: Option<usize>,
}

impl ParseWarning {
    /// Creates a warning without a line number.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line_number: None,
        }
    }

    /// Creates a warning attached to a line of text input.
    pub fn at_line(kind: WarningKind, message: impl Into<String>, line_number: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line_number: Some(line_number),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "[{}] line {}: {}", self.kind, line, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ChatparseError::from(io_err);
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
        assert!(err.is_io());
    }

    #[test]
    fn test_decode_error_with_path() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err = ChatparseError::json_decode(json_err, Some(PathBuf::from("/tmp/chat.json")));
        let display = err.to_string();
        assert!(display.contains("JSON"));
        assert!(display.contains("/tmp/chat.json"));
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_error_without_path() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err = ChatparseError::json_decode(json_err, None);
        assert!(!err.to_string().contains("file:"));
    }

    #[test]
    fn test_with_path_fills_missing_path() {
        let err = ChatparseError::Undecodable {
            encoding: "UTF-8",
            path: None,
        }
        .with_path(Path::new("chat.txt"));
        assert!(err.to_string().contains("chat.txt"));
    }

    #[test]
    fn test_with_path_keeps_other_errors() {
        let err = ChatparseError::invalid_request("nothing to parse").with_path(Path::new("x.txt"));
        assert!(!err.to_string().contains("x.txt"));
    }

    #[test]
    fn test_unsupported_format_lists_registered() {
        let err = ChatparseError::unsupported_format("xml", vec!["json".into(), "text".into()]);
        let display = err.to_string();
        assert!(display.contains("'xml'"));
        assert!(display.contains("json, text"));
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_format_undetermined_display() {
        let err = ChatparseError::format_undetermined("/data/blob.bin");
        assert!(err.is_format_undetermined());
        assert!(err.to_string().contains("/data/blob.bin"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err = ChatparseError::json_decode(json_err, None);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_warning_display_with_line() {
        let warning = ParseWarning::at_line(WarningKind::MalformedLine, "Orphaned line: hi", 3);
        assert_eq!(
            warning.to_string(),
            "[malformed_line] line 3: Orphaned line: hi"
        );
    }

    #[test]
    fn test_warning_display_without_line() {
        let warning = ParseWarning::new(WarningKind::UnknownMessageType, "Unknown message type: poll");
        assert_eq!(
            warning.to_string(),
            "[unknown_message_type] Unknown message type: poll"
        );
    }

    #[test]
    fn test_warning_serialization_skips_missing_line() {
        let warning = ParseWarning::new(WarningKind::UnparseableTimestamp, "no timestamp");
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("unparseable_timestamp"));
        assert!(!json.contains("line_number"));
    }
}
