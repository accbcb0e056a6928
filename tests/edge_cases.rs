//! Edge case tests for chatparse
//!
//! These tests cover boundary conditions of the transcript and JSON
//! parsers that the unit tests do not reach through the public API.

use chatparse::prelude::*;
use chrono::{Datelike, TimeZone, Timelike, Utc};

fn parse_text(content: &str) -> (Vec<ParsedMessage>, Vec<ParseWarning>) {
    let mut parser = TextParser::new();
    let conv = parser.parse_content(content).unwrap();
    (conv.into_messages(), parser.take_warnings())
}

fn parse_json(content: &str) -> (ParsedConversation, Vec<ParseWarning>) {
    let mut parser = JsonParser::new();
    let conv = parser.parse_content(content).unwrap();
    (conv, parser.take_warnings())
}

// =========================================================================
// Empty and blank input
// =========================================================================

#[test]
fn test_empty_transcript() {
    let mut parser = TextParser::new();
    let conv = parser.parse_content("").unwrap();
    assert!(conv.is_empty());
    assert_eq!(conv.started_at(), None);
    assert_eq!(conv.title, None);
    assert!(parser.warnings().is_empty());
}

#[test]
fn test_blank_lines_ignored() {
    let (msgs, warnings) = parse_text("\n\n   \n[1/1/24, 10:00 AM] A: hi\n\n\t\n");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].content.as_deref(), Some("hi"));
    assert!(warnings.is_empty());
}

#[test]
fn test_empty_json_array() {
    let (conv, warnings) = parse_json("[]");
    assert!(conv.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn test_empty_json_object() {
    let (conv, warnings) = parse_json("{}");
    assert!(conv.is_empty());
    assert!(warnings.is_empty());
    assert_eq!(conv.metadata["format"], "json");
}

// =========================================================================
// Line endings and invisible characters
// =========================================================================

#[test]
fn test_crlf_line_endings() {
    let (msgs, _) = parse_text("[1/1/24, 10:00 AM] A: one\r\nmore\r\n[1/1/24, 10:01 AM] B: two\r\n");
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].content.as_deref(), Some("one\nmore"));
    assert_eq!(msgs[1].content.as_deref(), Some("two"));
}

#[test]
fn test_leading_bidi_marks() {
    let (msgs, warnings) = parse_text("\u{200E}[1/1/24, 10:00 AM] \u{202A}Alice\u{202C}: hi \u{200F}there");
    assert!(warnings.is_empty());
    assert_eq!(msgs[0].sender, "Alice");
    assert_eq!(msgs[0].content.as_deref(), Some("hi there"));
}

#[test]
fn test_narrow_nbsp_before_meridiem() {
    let (msgs, _) = parse_text("[1/1/24, 10:00\u{202F}PM] A: late");
    assert_eq!(msgs[0].timestamp.hour(), 22);
}

#[test]
fn test_lowercase_dotted_meridiem() {
    let (msgs, _) = parse_text("1/1/24, 9:05 p.m. - A: evening");
    assert_eq!(msgs[0].timestamp.hour(), 21);
    assert_eq!(msgs[0].timestamp.minute(), 5);
}

#[test]
fn test_whitespace_collapsed_per_line() {
    let (msgs, _) = parse_text("[1/1/24, 10:00 AM] A:   lots   of\t\tspace\n   indented   line  ");
    assert_eq!(msgs[0].content.as_deref(), Some("lots of space\nindented line"));
}

// =========================================================================
// Dates
// =========================================================================

#[test]
fn test_two_digit_year_is_this_century() {
    let (msgs, _) = parse_text("[3/4/99, 10:00 AM] A: x");
    assert_eq!(msgs[0].timestamp.year(), 2099);
}

#[test]
fn test_four_digit_year_kept() {
    let (msgs, _) = parse_text("[3/4/1999, 10:00 AM] A: x");
    assert_eq!(msgs[0].timestamp.year(), 1999);
}

#[test]
fn test_ambiguous_slash_date_is_month_first() {
    let (msgs, _) = parse_text("[3/4/24, 10:00 AM] A: x");
    assert_eq!(msgs[0].timestamp.month(), 3);
    assert_eq!(msgs[0].timestamp.day(), 4);
}

#[test]
fn test_impossible_date_becomes_continuation() {
    let (msgs, warnings) = parse_text("[1/1/24, 10:00 AM] A: start\n[13/45/24, 10:01 AM] B: bogus");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].sender, "A");
    assert!(msgs[0].content.as_deref().unwrap().ends_with("B: bogus"));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::InvalidDate);
    assert_eq!(warnings[0].line_number, Some(2));
}

#[test]
fn test_impossible_date_without_message() {
    let (msgs, warnings) = parse_text("[13/45/24, 10:01 AM] B: bogus");
    assert!(msgs.is_empty());
    let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::InvalidDate, WarningKind::MalformedLine]);
}

#[test]
fn test_leap_day() {
    let (msgs, warnings) = parse_text("[2/29/24, 10:00 AM] A: leap\n[2/29/23, 10:00 AM] A: not leap");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].timestamp, Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap());
    assert_eq!(warnings[0].kind, WarningKind::InvalidDate);
}

#[test]
fn test_midnight_and_noon_in_12_hour_clock() {
    let (msgs, _) = parse_text("[1/1/24, 12:00 AM] A: midnight\n[1/1/24, 12:00 PM] A: noon");
    assert_eq!(msgs[0].timestamp.hour(), 0);
    assert_eq!(msgs[1].timestamp.hour(), 12);
}

#[test]
fn test_out_of_order_timestamps() {
    let mut parser = TextParser::new();
    let conv = parser
        .parse_content("[1/2/24, 10:00 AM] A: later\n[1/1/24, 10:00 AM] B: earlier")
        .unwrap();
    assert_eq!(conv.messages()[0].sender, "A");
    assert_eq!(conv.started_at().unwrap().day(), 1);
    assert_eq!(conv.ended_at().unwrap().day(), 2);
}

// =========================================================================
// Senders and content
// =========================================================================

#[test]
fn test_colon_in_content() {
    let (msgs, _) = parse_text("[1/1/24, 10:00 AM] Alice: Note: meet at 10:30");
    assert_eq!(msgs[0].sender, "Alice");
    assert_eq!(msgs[0].content.as_deref(), Some("Note: meet at 10:30"));
}

#[test]
fn test_empty_content() {
    let (msgs, _) = parse_text("[1/1/24, 10:00 AM] Alice:");
    assert_eq!(msgs[0].sender, "Alice");
    assert_eq!(msgs[0].content, None);
    assert_eq!(msgs[0].message_type, MessageType::Text);
}

#[test]
fn test_unicode_senders() {
    let (msgs, _) = parse_text(
        "[1/1/24, 10:00 AM] 田中太郎: こんにちは\n[1/1/24, 10:01 AM] User 🎉: Hello 👋\n[1/1/24, 10:02 AM] محمد: مرحبا",
    );
    let senders: Vec<_> = msgs.iter().map(|m| m.sender.as_str()).collect();
    assert_eq!(senders, vec!["田中太郎", "User 🎉", "محمد"]);
}

#[test]
fn test_phone_senders_deduplicated() {
    let mut conv = ParsedConversation::new();
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    conv.add_message(ParsedMessage::new(ts, "+1 555 0100", None));
    conv.add_message(ParsedMessage::new(ts, "+1 555 0100", None));
    conv.add_message(ParsedMessage::new(ts, "+1 555 0101", None));
    assert_eq!(conv.participant_count(), 2);
}

#[test]
fn test_russian_system_message() {
    let (msgs, _) = parse_text("15.01.24, 10:00 - Иван: Иван добавил Петра");
    assert_eq!(msgs[0].message_type, MessageType::System);
}

#[test]
fn test_multiple_attachments() {
    let (msgs, _) = parse_text(
        "[1/1/24, 10:00 AM] A: <attached: clip.mp4> <attached: notes.pdf> look",
    );
    let msg = &msgs[0];
    assert_eq!(msg.attachments.len(), 2);
    assert_eq!(msg.message_type, MessageType::Video);
    assert_eq!(msg.attachments[1].attachment_type, AttachmentType::Document);
    assert_eq!(msg.content.as_deref(), Some("look"));
}

#[test]
fn test_edited_and_deleted_flags_independent() {
    let (msgs, _) = parse_text("[1/1/24, 10:00 AM] A: fixed typo <This message was edited>");
    assert!(msgs[0].is_edited);
    assert!(!msgs[0].is_deleted);
    assert_eq!(msgs[0].message_type, MessageType::Text);
}

#[test]
fn test_very_long_multiline_message() {
    let mut content = String::from("[1/1/24, 10:00 AM] A: start\n");
    for i in 0..500 {
        content.push_str(&format!("line {i}\n"));
    }
    let (msgs, _) = parse_text(&content);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].content.as_deref().unwrap().lines().count(), 501);
}

// =========================================================================
// JSON shapes
// =========================================================================

#[test]
fn test_json_non_object_message_warns() {
    let (conv, warnings) = parse_json(r#"[42, "text", {"timestamp": 1, "from": "A"}]"#);
    assert_eq!(conv.message_count(), 1);
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.kind == WarningKind::UnexpectedStructure));
}

#[test]
fn test_json_timestamp_fallback_fields() {
    let (conv, warnings) = parse_json(
        r#"[{"timestamp": "not a date", "created_at": "2024-01-01T10:00:00.250Z", "from": "A"}]"#,
    );
    assert!(warnings.is_empty());
    assert_eq!(conv.messages()[0].timestamp.timestamp_subsec_millis(), 250);
}

#[test]
fn test_json_numeric_string_timestamp() {
    let (conv, _) = parse_json(r#"[{"timestamp": "1704103200", "from": "A"}]"#);
    assert_eq!(
        conv.messages()[0].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    );
}

#[test]
fn test_json_numeric_sender() {
    let (conv, _) = parse_json(r#"[{"timestamp": 1, "from": 15550100}]"#);
    assert_eq!(conv.messages()[0].sender, "15550100");
}

#[test]
fn test_json_missing_sender() {
    let (conv, _) = parse_json(r#"[{"timestamp": 1, "text": "anon"}]"#);
    assert_eq!(conv.messages()[0].sender, "Unknown");
}

#[test]
fn test_json_deleted_message() {
    let (conv, _) = parse_json(r#"[{"timestamp": 1, "from": "A", "deleted": true, "text": "gone"}]"#);
    let msg = &conv.messages()[0];
    assert!(msg.is_deleted);
    assert_eq!(msg.message_type, MessageType::Deleted);
}

#[test]
fn test_json_contacts_alias() {
    let (conv, warnings) = parse_json(
        r#"[{"timestamp": 1, "from": "A", "type": "contacts",
             "contacts": [{"name": {"formatted_name": "Bea"}}, {}]}]"#,
    );
    assert!(warnings.is_empty());
    let msg = &conv.messages()[0];
    assert_eq!(msg.message_type, MessageType::Contact);
    assert_eq!(msg.content.as_deref(), Some("Contact(s): Bea, Unknown"));
}

#[test]
fn test_json_deeply_nested_is_still_valid() {
    let nested = format!("{}{}", "[".repeat(100), "]".repeat(100));
    let (conv, warnings) = parse_json(&nested);
    assert!(conv.is_empty());
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_json_truncated_is_fatal() {
    let err = JsonParser::new()
        .parse_content(r#"{"messages": [{"timestamp": 1"#)
        .unwrap_err();
    assert!(err.is_decode());
    assert!(err.to_string().contains("JSON"));
}
