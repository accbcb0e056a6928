//! Input format identification.
//!
//! Detection runs in three layers, each consulted only when the previous one
//! is inconclusive:
//!
//! 1. File extension (`.txt` is text, `.json` is JSON).
//! 2. MIME sniffing of the first bytes. Textual content that starts with
//!    `{` or `[` is JSON, other textual content is a transcript. A `[`
//!    opening a bracketed date and time is a transcript line.
//! 3. Content heuristics on a decoded sample: a complete JSON document, or
//!    a date/time signature typical of transcripts.
//!
//! When all three fail the result is [`FileFormat::Unknown`]. Detection
//! never guesses beyond that.
//!
//! # Example
//!
//! ```rust
//! use chatparse::format::{FileFormat, detect_format_from_bytes};
//! use chatparse::config::DetectionConfig;
//!
//! let sample = b"12/31/23, 11:59 PM - Alice: Happy new year";
//! assert_eq!(detect_format_from_bytes(sample, &DetectionConfig::new()), FileFormat::Text);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::encoding::{decode_bytes, detect_encoding, is_utf8_prefix, read_sample};

/// Signature of a transcript line: a numeric date followed by a clock time.
static TRANSCRIPT_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}.*\d{1,2}:\d{2}")
        .expect("valid transcript signature regex")
});

/// Format of an export file.
///
/// # Example
///
/// ```rust
/// use chatparse::FileFormat;
/// use std::str::FromStr;
///
/// assert_eq!(FileFormat::from_str("txt").unwrap(), FileFormat::Text);
/// assert_eq!(FileFormat::Json.as_str(), "json");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Line-oriented transcript
    #[serde(alias = "txt")]
    Text,
    /// JSON export
    Json,
    /// Detection gave up
    Unknown,
}

impl FileFormat {
    /// Returns the format identifier used by the parser registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Text => "text",
            FileFormat::Json => "json",
            FileFormat::Unknown => "unknown",
        }
    }

    /// Classifies a path by its extension alone.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(FileFormat::Text),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FileFormat::Unknown)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(FileFormat::Text),
            "json" => Ok(FileFormat::Json),
            _ => Err(format!(
                "Unknown file format: '{}'. Expected one of: text, txt, json",
                s
            )),
        }
    }
}

/// Detects the format of a file.
///
/// Read failures are logged and leave the result at [`FileFormat::Unknown`].
pub fn detect_file_format(path: &Path, config: &DetectionConfig) -> FileFormat {
    if let Some(format) = FileFormat::from_extension(path) {
        debug!(path = %path.display(), %format, "Format resolved by extension");
        return format;
    }

    let sample_size = config.mime_sample_size.max(config.content_sample_size);
    match read_sample(path, sample_size) {
        Ok(sample) => detect_format_from_bytes(&sample, config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read file for format detection");
            FileFormat::Unknown
        }
    }
}

/// Detects the format of in-memory content (layers 2 and 3).
pub fn detect_format_from_bytes(sample: &[u8], config: &DetectionConfig) -> FileFormat {
    let head = &sample[..sample.len().min(config.mime_sample_size)];
    if let Some(format) = format_from_mime(head) {
        return format;
    }

    let format = format_from_content(&sample[..sample.len().min(config.content_sample_size)], config);
    debug!(%format, "Format resolved by content");
    format
}

/// Sniffs a MIME type from magic numbers, reporting plain text for samples
/// that look textual.
pub fn sniff_mime(sample: &[u8]) -> Option<&'static str> {
    if let Some(kind) = infer::get(sample) {
        return Some(kind.mime_type());
    }
    let has_bom = sample.starts_with(b"\xEF\xBB\xBF")
        || sample.starts_with(b"\xFF\xFE")
        || sample.starts_with(b"\xFE\xFF");
    if has_bom || (!sample.contains(&0) && is_utf8_prefix(sample)) {
        return Some("text/plain");
    }
    None
}

fn format_from_mime(sample: &[u8]) -> Option<FileFormat> {
    let mime = sniff_mime(sample)?;
    debug!(mime, "Sniffed MIME type");

    if mime == "application/json" {
        return Some(FileFormat::Json);
    }
    if mime.starts_with("text/") {
        let body = sample.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(sample);
        return Some(if starts_like_json(body.trim_ascii_start()) {
            FileFormat::Json
        } else {
            FileFormat::Text
        });
    }
    None
}

fn format_from_content(sample: &[u8], config: &DetectionConfig) -> FileFormat {
    let encoding = detect_encoding(sample).resolve(config.confidence_threshold);
    let Ok(text) = decode_bytes(sample, encoding, true) else {
        return FileFormat::Unknown;
    };
    let trimmed = text.trim();

    if starts_like_json(trimmed.as_bytes())
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return FileFormat::Json;
    }
    if TRANSCRIPT_SIGNATURE.is_match(trimmed) {
        return FileFormat::Text;
    }
    FileFormat::Unknown
}

fn starts_like_json(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(b'{') => true,
        Some(b'[') => !opens_bracket_transcript(bytes),
        _ => false,
    }
}

/// `[1/1/24, 10:00 AM] ...` rather than a JSON array.
fn opens_bracket_transcript(bytes: &[u8]) -> bool {
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or(bytes);
    let after_bracket = first_line.get(1..).unwrap_or_default().trim_ascii_start();
    after_bracket.first().is_some_and(u8::is_ascii_digit)
        && TRANSCRIPT_SIGNATURE.is_match(&String::from_utf8_lossy(first_line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("TEXT".parse::<FileFormat>().unwrap(), FileFormat::Text);
        assert_eq!("txt".parse::<FileFormat>().unwrap(), FileFormat::Text);
        assert_eq!("json".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert!("xml".parse::<FileFormat>().is_err());
    }

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(FileFormat::from_extension(Path::new("a.TXT")), Some(FileFormat::Text));
        assert_eq!(FileFormat::from_extension(Path::new("a.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension(Path::new("a.dat")), None);
        assert_eq!(FileFormat::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_extension_wins_over_content() {
        let file = write_temp(".json", b"1/1/24, 10:00 - Alice: Hi\n");
        assert_eq!(detect_file_format(file.path(), &DetectionConfig::new()), FileFormat::Json);
    }

    #[test]
    fn test_mime_text_peek_json() {
        let file = write_temp(".dat", b"  {\"messages\": []}");
        assert_eq!(detect_file_format(file.path(), &DetectionConfig::new()), FileFormat::Json);
    }

    #[test]
    fn test_mime_text_transcript() {
        let file = write_temp(".export", b"[1/1/24, 10:00 AM] Alice: Hi\n");
        assert_eq!(detect_file_format(file.path(), &DetectionConfig::new()), FileFormat::Text);
    }

    #[test]
    fn test_mime_json_array_of_numbers() {
        let file = write_temp(".dat", b"[1, 2, 3]");
        assert_eq!(detect_file_format(file.path(), &DetectionConfig::new()), FileFormat::Json);
    }

    #[test]
    fn test_bracket_transcript_is_not_json() {
        assert!(opens_bracket_transcript(b"[15.01.24, 22:10:00] Bob: hi"));
        assert!(opens_bracket_transcript(b"[ 1/1/24, 10:00 AM] A: x\n[2, 3]"));
        assert!(!opens_bracket_transcript(b"[{\"from\": \"A\"}]"));
        assert!(!opens_bracket_transcript(b"[1, 2, 3]"));
        assert!(!opens_bracket_transcript(b"["));
        assert!(starts_like_json(b"[]"));
        assert!(!starts_like_json(b"[1/1/24, 10:00 AM] Alice: Hi"));
    }

    #[test]
    fn test_content_layer_legacy_encoding() {
        // Latin-1 bytes are not UTF-8, so the MIME layer is inconclusive.
        let sample = b"31.12.23, 23:59 - Andr\xe9: Bonne ann\xe9e";
        assert_eq!(
            detect_format_from_bytes(sample, &DetectionConfig::new()),
            FileFormat::Text
        );
    }

    #[test]
    fn test_binary_is_unknown() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(sniff_mime(png), Some("image/png"));
        assert_eq!(
            detect_format_from_bytes(png, &DetectionConfig::new()),
            FileFormat::Unknown
        );
    }

    #[test]
    fn test_missing_file_is_unknown() {
        assert_eq!(
            detect_file_format(Path::new("/nonexistent/export.bin"), &DetectionConfig::new()),
            FileFormat::Unknown
        );
    }

    #[test]
    fn test_transcript_signature() {
        assert!(TRANSCRIPT_SIGNATURE.is_match("1.2.24 12:00 - Bob: hey"));
        assert!(TRANSCRIPT_SIGNATURE.is_match("[12/31/2023, 9:05:11 PM] Bob: hey"));
        assert!(!TRANSCRIPT_SIGNATURE.is_match("no dates here"));
    }
}
