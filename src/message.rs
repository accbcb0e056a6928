//! Parsed message and attachment types.
//!
//! Every parser produces [`ParsedMessage`] values. A message always has a
//! timestamp and a sender; the content is optional because pure media
//! messages carry none.
//!
//! # Examples
//!
//! ```
//! use chatparse::{MessageType, ParsedMessage};
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
//! let msg = ParsedMessage::new(ts, "Alice", Some("Hello!".to_string()));
//!
//! assert_eq!(msg.message_type, MessageType::Text);
//! assert_eq!(msg.generate_id(), msg.clone().generate_id());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Free-form metadata attached to messages, attachments and participants.
pub type Metadata = BTreeMap<String, Value>;

/// Width of [`ParsedMessage::generate_id`] output, in hex characters.
pub const MESSAGE_ID_LEN: usize = 16;

/// Category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text
    #[default]
    Text,
    /// Photo or picture
    Image,
    /// Video clip or GIF
    Video,
    /// Audio file or voice note
    Audio,
    /// Any other file
    Document,
    /// Shared location
    Location,
    /// Shared contact card
    Contact,
    /// Sticker
    Sticker,
    /// Group-management notice without user content
    System,
    /// Message removed by its author
    Deleted,
}

impl MessageType {
    /// Returns the lowercase name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::Document => "document",
            MessageType::Location => "location",
            MessageType::Contact => "contact",
            MessageType::Sticker => "sticker",
            MessageType::System => "system",
            MessageType::Deleted => "deleted",
        }
    }

    /// Returns `true` for types that stand for a media file.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            MessageType::Image
                | MessageType::Video
                | MessageType::Audio
                | MessageType::Document
                | MessageType::Sticker
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm"];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg", ".m4a", ".opus", ".aac"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".xls", ".xlsx", ".ppt", ".pptx",
];

impl AttachmentType {
    /// Infers the attachment type from a filename extension.
    ///
    /// ```
    /// use chatparse::AttachmentType;
    ///
    /// assert_eq!(AttachmentType::from_filename("IMG-001.JPG"), AttachmentType::Image);
    /// assert_eq!(AttachmentType::from_filename("notes.zip"), AttachmentType::Other);
    /// ```
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.trim().to_lowercase();
        let has_ext = |exts: &[&str]| exts.iter().any(|ext| lower.ends_with(ext));

        if has_ext(IMAGE_EXTENSIONS) {
            AttachmentType::Image
        } else if has_ext(VIDEO_EXTENSIONS) {
            AttachmentType::Video
        } else if has_ext(AUDIO_EXTENSIONS) {
            AttachmentType::Audio
        } else if has_ext(DOCUMENT_EXTENSIONS) {
            AttachmentType::Document
        } else {
            AttachmentType::Other
        }
    }

    /// Returns the lowercase name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Image => "image",
            AttachmentType::Video => "video",
            AttachmentType::Audio => "audio",
            AttachmentType::Document => "document",
            AttachmentType::Sticker => "sticker",
            AttachmentType::Other => "other",
        }
    }

    /// Message type of a message whose payload is this attachment.
    pub fn message_type(&self) -> MessageType {
        match self {
            AttachmentType::Image => MessageType::Image,
            AttachmentType::Video => MessageType::Video,
            AttachmentType::Audio => MessageType::Audio,
            AttachmentType::Sticker => MessageType::Sticker,
            AttachmentType::Document | AttachmentType::Other => MessageType::Document,
        }
    }
}

impl fmt::Display for AttachmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that accompanied a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAttachment {
    pub filename: String,
    pub attachment_type: AttachmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub metadata: Metadata,
}

impl ParsedAttachment {
    /// Creates an attachment with only a filename and a type.
    pub fn new(filename: impl Into<String>, attachment_type: AttachmentType) -> Self {
        Self {
            filename: filename.into(),
            attachment_type,
            mime_type: None,
            size: None,
            caption: None,
            metadata: Metadata::new(),
        }
    }

    /// Creates an attachment whose type is inferred from the filename.
    pub fn from_filename(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let attachment_type = AttachmentType::from_filename(&filename);
        Self::new(filename, attachment_type)
    }
}

/// A single message in normalized form.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `timestamp` | When the message was sent |
/// | `sender` | Sender exactly as it appeared in the export |
/// | `content` | Text, absent for pure media |
/// | `message_type` | Classified category |
/// | `attachments` | Zero or more files |
/// | `reply_to` | Quoted content or id of the message replied to |
/// | `raw_text` | Source lines the message was built from |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub attachments: Vec<ParsedAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl ParsedMessage {
    /// Creates a text message with no attachments or flags.
    pub fn new(timestamp: DateTime<Utc>, sender: impl Into<String>, content: Option<String>) -> Self {
        Self {
            timestamp,
            sender: sender.into(),
            content,
            message_type: MessageType::Text,
            attachments: Vec::new(),
            reply_to: None,
            is_deleted: false,
            is_edited: false,
            metadata: Metadata::new(),
            raw_text: None,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: ParsedAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    #[must_use]
    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = Some(raw_text.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Returns a content-derived identifier.
    ///
    /// The id is the first 16 hex characters of the SHA-256 digest of
    /// `"{timestamp}:{sender}:{content}"`, where an absent or empty content
    /// contributes the literal `media`. Parsing the same input twice yields
    /// the same ids.
    pub fn generate_id(&self) -> String {
        let content = self
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("media");
        let id_string = format!(
            "{}:{}:{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.sender,
            content
        );

        let digest = Sha256::digest(id_string.as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(MESSAGE_ID_LEN);
        id
    }

    /// Returns `true` if the message stands for a media file.
    pub fn is_media(&self) -> bool {
        self.message_type.is_media()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
