//! Text encoding detection and decoding.
//!
//! Detection looks at a byte sample and reports a guess with a confidence
//! score. A guess that does not clear the configured threshold falls back to
//! UTF-8. Detection never fails; an unreadable file also yields UTF-8.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, info, warn};

use crate::config::DetectionConfig;
use crate::error::{ChatparseError, Result};

/// A detected encoding together with how sure the detector is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingGuess {
    pub encoding: &'static Encoding,
    /// In `0.0..=1.0`
    pub confidence: f32,
}

impl EncodingGuess {
    /// Returns the WHATWG name of the guessed encoding.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Returns the guessed encoding if it clears `threshold`, UTF-8 otherwise.
    pub fn resolve(&self, threshold: f32) -> &'static Encoding {
        if self.confidence > threshold {
            self.encoding
        } else {
            debug!(
                guessed = self.name(),
                confidence = self.confidence,
                threshold,
                "Encoding confidence below threshold, using UTF-8"
            );
            UTF_8
        }
    }
}

/// Returns `true` if `bytes` is UTF-8, tolerating a sequence cut off at the end.
pub(crate) fn is_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Weight applied to the text score when the detector reports it is unsure.
const UNASSURED_WEIGHT: f32 = 0.75;

/// Guesses the encoding of a byte sample.
///
/// A byte order mark is authoritative. Otherwise valid UTF-8 is preferred,
/// and anything else goes to the statistical detector. The confidence of
/// a statistical guess is the share of decoded characters that read as
/// text (letters, digits, whitespace, punctuation), weighted down when the
/// detector itself is not confident.
///
/// ```
/// use chatparse::encoding::detect_encoding;
///
/// let guess = detect_encoding("Привет".as_bytes());
/// assert_eq!(guess.name(), "UTF-8");
/// assert!(guess.confidence > 0.7);
/// ```
pub fn detect_encoding(sample: &[u8]) -> EncodingGuess {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return EncodingGuess {
            encoding,
            confidence: 1.0,
        };
    }

    if is_utf8_prefix(sample) {
        return EncodingGuess {
            encoding: UTF_8,
            confidence: 0.99,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let (encoding, assured) = detector.guess_assess(None, true);

    let (decoded, _) = encoding.decode_without_bom_handling(sample);
    let score = text_score(&decoded);
    let confidence = if assured { score } else { score * UNASSURED_WEIGHT };

    EncodingGuess {
        encoding,
        confidence,
    }
}

/// Share of `text` made of characters found in chat messages.
fn text_score(text: &str) -> f32 {
    let mut total = 0usize;
    let mut readable = 0usize;
    for c in text.chars() {
        total += 1;
        if c.is_alphanumeric()
            || c.is_whitespace()
            || c.is_ascii_punctuation()
            || matches!(c, '\u{2018}'..='\u{201F}' | '\u{2013}' | '\u{2014}' | '\u{2026}' | '\u{20AC}')
        {
            readable += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    readable as f32 / total as f32
}

/// Detects the encoding of a file from its first bytes.
///
/// Reads at most `config.encoding_sample_size` bytes. Any I/O failure is
/// logged and resolves to UTF-8.
pub fn detect_file_encoding(path: &Path, config: &DetectionConfig) -> &'static Encoding {
    let sample = match read_sample(path, config.encoding_sample_size) {
        Ok(sample) => sample,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Encoding detection failed, using UTF-8");
            return UTF_8;
        }
    };

    let guess = detect_encoding(&sample);
    let encoding = guess.resolve(config.confidence_threshold);
    info!(
        path = %path.display(),
        encoding = encoding.name(),
        confidence = guess.confidence,
        "Detected encoding"
    );
    encoding
}

/// Looks up an encoding by label (`"utf-8"`, `"latin1"`, `"utf-16le"`, ...).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ChatparseError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// Decodes a whole document.
///
/// A leading byte order mark overrides `encoding` and is removed. Without
/// `lossy`, malformed input is an [`ChatparseError::Undecodable`] error;
/// with it, malformed sequences become U+FFFD.
pub fn decode_bytes<'a>(
    bytes: &'a [u8],
    encoding: &'static Encoding,
    lossy: bool,
) -> Result<Cow<'a, str>> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) => (bom_encoding, &bytes[bom_len..]),
        None => (encoding, bytes),
    };
    decode_fragment(body, encoding, lossy)
}

/// Decodes a slice that is not the start of a document, so no BOM sniffing.
pub(crate) fn decode_fragment<'a>(
    bytes: &'a [u8],
    encoding: &'static Encoding,
    lossy: bool,
) -> Result<Cow<'a, str>> {
    if lossy {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(encoding = encoding.name(), "Replaced malformed byte sequences");
        }
        return Ok(text);
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(ChatparseError::Undecodable {
            encoding: encoding.name(),
            path: None,
        })
}

/// Reads up to `limit` bytes from the start of a file.
pub(crate) fn read_sample(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64).read_to_end(&mut sample)?;
    Ok(sample)
}
