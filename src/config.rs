//! Configuration types for parsing and detection.
//!
//! Both structs are plain data with builder methods and serde support, so
//! they can be embedded in a host application's own configuration file.
//!
//! # Example
//!
//! ```rust
//! use chatparse::config::{DetectionConfig, ParserConfig};
//!
//! let parser = ParserConfig::new()
//!     .with_chunk_size(500)
//!     .with_lossy_decoding(true);
//!
//! let detection = DetectionConfig::new().with_confidence_threshold(0.8);
//! # assert_eq!(parser.chunk_size, 500);
//! # assert!(detection.confidence_threshold > 0.7);
//! ```

use serde::{Deserialize, Serialize};

/// Default number of messages per streamed chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Settings shared by every parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Messages per chunk in streaming mode (default: 1000)
    pub chunk_size: usize,

    /// Read buffer for streaming (default: 64KB)
    pub buffer_size: usize,

    /// Replace undecodable bytes with U+FFFD instead of failing (default: false)
    pub lossy_decoding: bool,

    /// Fill in a title from the participant count after parsing (default: true)
    pub infer_title: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_size: 64 * 1024, // 64KB
            lossy_decoding: false,
            infer_title: true,
        }
    }
}

impl ParserConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of messages per streamed chunk.
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the buffer size for streaming.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets whether undecodable bytes are replaced rather than rejected.
    #[must_use]
    pub fn with_lossy_decoding(mut self, lossy: bool) -> Self {
        self.lossy_decoding = lossy;
        self
    }

    /// Sets whether a missing title is inferred after parsing.
    #[must_use]
    pub fn with_infer_title(mut self, infer: bool) -> Self {
        self.infer_title = infer;
        self
    }
}

/// Settings for format and encoding detection.
///
/// Sample sizes bound how much of a file each detection layer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Bytes fed to the encoding detector (default: 10 000)
    pub encoding_sample_size: usize,

    /// Bytes inspected for magic numbers (default: 1024)
    pub mime_sample_size: usize,

    /// Bytes decoded for the content heuristic (default: 4096)
    pub content_sample_size: usize,

    /// Minimum confidence to accept a detected encoding (default: 0.7)
    pub confidence_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            encoding_sample_size: 10_000,
            mime_sample_size: 1024,
            content_sample_size: 4096,
            confidence_threshold: 0.7,
        }
    }
}

impl DetectionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_encoding_sample_size(mut self, size: usize) -> Self {
        self.encoding_sample_size = size;
        self
    }

    #[must_use]
    pub fn with_mime_sample_size(mut self, size: usize) -> Self {
        self.mime_sample_size = size;
        self
    }

    #[must_use]
    pub fn with_content_sample_size(mut self, size: usize) -> Self {
        self.content_sample_size = size;
        self
    }

    /// Sets the confidence an encoding guess must exceed.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_config_default() {
        let config = ParserConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.buffer_size, 64 * 1024);
        assert!(!config.lossy_decoding);
        assert!(config.infer_title);
    }

    #[test]
    fn test_parser_config_builder() {
        let config = ParserConfig::new()
            .with_chunk_size(10)
            .with_buffer_size(1024)
            .with_lossy_decoding(true)
            .with_infer_title(false);

        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.buffer_size, 1024);
        assert!(config.lossy_decoding);
        assert!(!config.infer_title);
    }

    #[test]
    fn test_detection_config_default() {
        let config = DetectionConfig::default();
        assert_eq!(config.encoding_sample_size, 10_000);
        assert_eq!(config.mime_sample_size, 1024);
        assert_eq!(config.content_sample_size, 4096);
        assert!((config.confidence_threshold - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: ParserConfig = serde_json::from_str(r#"{"chunk_size": 5}"#).unwrap();
        assert_eq!(config.chunk_size, 5);
        assert!(config.infer_title);
    }
}
