//! Building blocks for JSON exports.
//!
//! JSON exports have no fixed schema. These helpers read one node at a
//! time and fall back through alternative field names, so they work on
//! every known layout.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::conversation::ParsedParticipant;
use crate::error::{ParseWarning, WarningKind};
use crate::message::{AttachmentType, MessageType, ParsedAttachment, ParsedMessage};

/// Fields that may hold the send time, in priority order.
pub const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "sent_at", "created_at", "date", "time"];

/// Fields that may hold the sender, in priority order.
pub const SENDER_FIELDS: &[&str] = &["from", "sender", "author", "phone"];

/// Sender used when a message names none.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Numeric timestamps above this are milliseconds, below it seconds.
///
/// 10^10 seconds is in the year 2286, so seconds-based times far in the
/// future and millisecond times before April 1970 are misread.
pub const MILLIS_THRESHOLD: f64 = 1e10;

/// Naive layouts read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"];

/// Layout carrying its own offset.
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

// ============================================================================
// Scalars
// ============================================================================

/// Converts a Unix time in seconds or milliseconds.
pub fn unix_to_datetime(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value > MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}

/// Parses a timestamp string.
///
/// Numeric strings are Unix times. Otherwise the ISO-like layouts are
/// tried in order, then RFC 3339.
///
/// ```
/// use chatparse::parsing::json::parse_timestamp_str;
///
/// let a = parse_timestamp_str("2024-01-01T10:00:00Z").unwrap();
/// let b = parse_timestamp_str("1704103200").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(number) = s.parse::<f64>() {
        return unix_to_datetime(number);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_str(s, OFFSET_FORMAT)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Parses a timestamp given as a number or a string.
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(unix_to_datetime),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Returns the first timestamp field that holds a readable time.
pub fn extract_timestamp(node: &Map<String, Value>) -> Option<DateTime<Utc>> {
    TIMESTAMP_FIELDS
        .iter()
        .filter_map(|field| node.get(*field))
        .find_map(parse_timestamp_value)
}

/// Renders a scalar as text. Strings are returned without quotes; empty
/// strings, null, arrays and objects give `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(node: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| node.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

fn first_text(node: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| node.get(*key).and_then(scalar_text))
}

// ============================================================================
// Senders and participants
// ============================================================================

/// Extracts the sender of a message node.
///
/// The value may be a string, a number, or an object whose `name`, `phone`
/// or `id` is used.
pub fn extract_sender(node: &Map<String, Value>) -> Option<String> {
    SENDER_FIELDS.iter().find_map(|field| match node.get(*field)? {
        Value::Object(obj) => first_text(obj, &["name", "phone", "id"]),
        other => scalar_text(other),
    })
}

/// Reads a phone number from a declared participant.
///
/// Keeps digits and `+`; the result counts as a phone number when it starts
/// with `+` or has at least ten digits.
pub fn participant_phone(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let digits = cleaned.chars().filter(char::is_ascii_digit).count();
    (!cleaned.is_empty() && (cleaned.starts_with('+') || digits >= 10)).then_some(cleaned)
}

/// Parses an entry of a `participants` array.
///
/// Strings are display names. Objects may carry `phone`/`phone_number`/`id`,
/// `name`/`display_name`/`profile_name`, `is_business`, `profile_picture`
/// and `status`.
pub fn parse_participant(value: &Value) -> Option<ParsedParticipant> {
    match value {
        Value::String(name) => Some(ParsedParticipant::new(participant_phone(name), name.clone())),
        Value::Object(obj) => {
            let phone = first_text(obj, &["phone", "phone_number", "id"]);
            let name = first_text(obj, &["name", "display_name", "profile_name"])
                .or_else(|| phone.clone())?;

            let mut participant = ParsedParticipant::new(phone, name)
                .with_business(truthy(obj, &["is_business"]));
            for key in ["profile_picture", "status"] {
                if let Some(value) = obj.get(key).filter(|v| !v.is_null()) {
                    participant = participant.with_metadata(key, value.clone());
                }
            }
            Some(participant)
        }
        _ => None,
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Builds an attachment from a media sub-object such as `{"image": {...}}`.
///
/// Returns `None` when the sub-object is missing or empty.
pub fn parse_media_attachment(media: Option<&Value>, kind: AttachmentType) -> Option<ParsedAttachment> {
    let media = media?.as_object().filter(|m| !m.is_empty())?;

    let filename = first_text(media, &["filename"]).unwrap_or_else(|| format!("{kind}_file"));
    let mut attachment = ParsedAttachment::new(filename, kind);
    attachment.mime_type = first_text(media, &["mime_type"]);
    attachment.size = media.get("file_size").and_then(Value::as_u64);
    attachment.caption = first_text(media, &["caption"]);

    for (key, value) in [
        ("id", media.get("id")),
        ("sha256", media.get("sha256")),
        ("url", media.get("link").or_else(|| media.get("url"))),
    ] {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            attachment.metadata.insert(key.to_string(), value.clone());
        }
    }
    Some(attachment)
}

fn text_body(node: &Map<String, Value>) -> Option<String> {
    match node.get("text") {
        Some(Value::Object(text)) => first_text(text, &["body"]),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
    .or_else(|| first_text(node, &["body"]))
}

fn location_text(node: &Map<String, Value>) -> Option<String> {
    let location = node.get("location")?.as_object()?;
    let lat = location.get("latitude").and_then(scalar_text)?;
    let lon = location.get("longitude").and_then(scalar_text)?;
    let mut text = format!("Location: {lat}, {lon}");
    if let Some(name) = first_text(location, &["name"]) {
        text.push_str(&format!(" ({name})"));
    }
    Some(text)
}

fn contacts_text(node: &Map<String, Value>) -> Option<String> {
    let contacts = node.get("contacts")?.as_array().filter(|c| !c.is_empty())?;
    let names: Vec<String> = contacts
        .iter()
        .map(|contact| {
            contact
                .get("name")
                .and_then(|name| name.get("formatted_name"))
                .and_then(scalar_text)
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string())
        })
        .collect();
    Some(format!("Contact(s): {}", names.join(", ")))
}

fn media_kind(declared: &str) -> Option<AttachmentType> {
    match declared {
        "image" => Some(AttachmentType::Image),
        "video" => Some(AttachmentType::Video),
        "audio" => Some(AttachmentType::Audio),
        "document" => Some(AttachmentType::Document),
        "sticker" => Some(AttachmentType::Sticker),
        _ => None,
    }
}

/// Converts one message node.
///
/// A node that is not an object, or that has no readable timestamp, is
/// skipped with a warning. An unknown `type` is kept as text with the type
/// name in brackets as content, also with a warning.
pub fn parse_message_node(node: &Value, warnings: &mut Vec<ParseWarning>) -> Option<ParsedMessage> {
    let Some(obj) = node.as_object() else {
        warnings.push(ParseWarning::new(
            WarningKind::UnexpectedStructure,
            format!("Expected a message object, found {}", value_kind(node)),
        ));
        return None;
    };

    let Some(timestamp) = extract_timestamp(obj) else {
        let id = obj.get("id").and_then(scalar_text);
        warnings.push(ParseWarning::new(
            WarningKind::UnparseableTimestamp,
            format!("Message without timestamp: {}", id.as_deref().unwrap_or("unknown")),
        ));
        return None;
    };

    let sender = extract_sender(obj).unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let mut message = ParsedMessage::new(timestamp, sender, None);

    if let Some(id) = obj.get("id").filter(|v| !v.is_null()) {
        message.metadata.insert("original_id".into(), id.clone());
    }

    let declared = obj.get("type").and_then(Value::as_str).unwrap_or("text");
    match declared {
        "text" => message.content = text_body(obj),
        "location" => {
            message.message_type = MessageType::Location;
            message.content = location_text(obj);
        }
        "contact" | "contacts" => {
            message.message_type = MessageType::Contact;
            message.content = contacts_text(obj);
        }
        other => match media_kind(other) {
            Some(kind) => {
                message.message_type = kind.message_type();
                let media = obj.get(other);
                if matches!(
                    kind,
                    AttachmentType::Image | AttachmentType::Video | AttachmentType::Document
                ) {
                    message.content = media
                        .and_then(|m| m.get("caption"))
                        .and_then(scalar_text);
                }
                message.attachments.extend(parse_media_attachment(media, kind));
            }
            None => {
                message.content = Some(format!("[{other}]"));
                warnings.push(ParseWarning::new(
                    WarningKind::UnknownMessageType,
                    format!("Unknown message type: {other}"),
                ));
            }
        },
    }

    if truthy(obj, &["deleted", "is_deleted"]) {
        message.is_deleted = true;
        message.message_type = MessageType::Deleted;
    }
    message.is_edited = truthy(obj, &["edited", "is_edited"]);

    message.reply_to = obj
        .get("context")
        .and_then(Value::as_object)
        .and_then(|ctx| first_text(ctx, &["quoted_message_id", "id"]));

    message.metadata.insert("status".into(), obj.get("status").cloned().unwrap_or(Value::Null));
    for flag in ["forwarded", "broadcast", "starred"] {
        message.metadata.insert(flag.into(), Value::Bool(truthy(obj, &[flag])));
    }

    Some(message)
}

/// Short name of a JSON value's kind, for warnings.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
