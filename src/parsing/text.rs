//! Building blocks for line-oriented transcripts.
//!
//! Transcripts have one date-prefixed line per message:
//!
//! - `[1/15/24, 10:30:45 AM] Sender: Message`
//! - `15.01.24, 10:30 - Sender: Message`
//! - `2024-01-15 10:30 – Sender: Message`
//!
//! Lines without a prefix continue the previous message. [`LineMachine`]
//! consumes lines one at a time and emits finished messages, so the
//! in-memory and streaming parsers share a single implementation.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::{ParseWarning, WarningKind};
use crate::message::{MessageType, ParsedAttachment, ParsedMessage};

/// Sender given to lines that have a prefix but no `Sender:` part.
pub const SYSTEM_SENDER: &str = "System";

/// Replacement text for media-omitted markers.
pub const MEDIA_PLACEHOLDER: &str = "[Media file]";

// ============================================================================
// Date/time pattern table
// ============================================================================

/// How the date/time prefix is set off from the rest of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `[date, time] rest`
    Bracket,
    /// `date, time - rest` (hyphen, en dash or em dash)
    Dash,
}

/// Order and separator of the date components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `1/15/24`
    SlashMdy,
    /// `15/1/24`, tried only after month-first failed
    SlashDmy,
    /// `15.01.24`
    DotDmy,
    /// `2024-01-15`
    IsoYmd,
    /// `01-15-2024`
    DashMdy,
}

impl DateLayout {
    fn pattern(self) -> &'static str {
        match self {
            DateLayout::SlashMdy | DateLayout::SlashDmy => r"\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})",
            DateLayout::DotDmy => r"\d{1,2}\.\d{1,2}\.(?:\d{4}|\d{2})",
            DateLayout::IsoYmd => r"\d{4}-\d{1,2}-\d{1,2}",
            DateLayout::DashMdy => r"\d{1,2}-\d{1,2}-(?:\d{4}|\d{2})",
        }
    }

    /// chrono format for the date once its year has four digits.
    pub fn chrono_format(self) -> &'static str {
        match self {
            DateLayout::SlashMdy => "%m/%d/%Y",
            DateLayout::SlashDmy => "%d/%m/%Y",
            DateLayout::DotDmy => "%d.%m.%Y",
            DateLayout::IsoYmd => "%Y-%m-%d",
            DateLayout::DashMdy => "%m-%d-%Y",
        }
    }

    fn separator(self) -> char {
        match self {
            DateLayout::SlashMdy | DateLayout::SlashDmy => '/',
            DateLayout::DotDmy => '.',
            DateLayout::IsoYmd | DateLayout::DashMdy => '-',
        }
    }

    /// Parses a matched date token. A trailing two-digit year means `20YY`.
    pub fn parse(self, token: &str) -> Option<NaiveDate> {
        let sep = self.separator();
        let expanded = match token.rsplit_once(sep) {
            Some((head, year)) if self != DateLayout::IsoYmd && year.len() == 2 => {
                format!("{head}{sep}20{year}")
            }
            _ => token.to_string(),
        };
        NaiveDate::parse_from_str(&expanded, self.chrono_format()).ok()
    }
}

/// 12-hour or 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    H12,
    H24,
}

impl Clock {
    fn pattern(self) -> &'static str {
        match self {
            Clock::H12 => r"\d{1,2}:\d{2}(?::\d{2})?\s?[AaPp]\.?\s?[Mm]\.?",
            Clock::H24 => r"\d{1,2}:\d{2}(?::\d{2})?",
        }
    }

    /// chrono formats tried in order against the normalized time token.
    pub fn chrono_formats(self) -> &'static [&'static str] {
        match self {
            Clock::H12 => &["%I:%M:%S %p", "%I:%M %p"],
            Clock::H24 => &["%H:%M:%S", "%H:%M"],
        }
    }

    /// Parses a matched time token (`10:30 PM`, `10:30\u{202f}p.m.`, `22:30:05`).
    pub fn parse(self, token: &str) -> Option<NaiveTime> {
        let compact: String = token
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        let normalized = match self {
            Clock::H12 => {
                let split = compact.find(|c: char| c.is_ascii_alphabetic())?;
                let (clock, meridiem) = compact.split_at(split);
                format!("{} {}", clock, meridiem.to_ascii_uppercase())
            }
            Clock::H24 => compact,
        };
        self.chrono_formats()
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
    }
}

/// One row of the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRow {
    pub framing: Framing,
    pub layout: DateLayout,
    pub clock: Clock,
}

const fn row(framing: Framing, layout: DateLayout, clock: Clock) -> PatternRow {
    PatternRow {
        framing,
        layout,
        clock,
    }
}

/// Date/time prefixes in the order they are tried.
///
/// Within each layout the 12-hour clock comes first so that `10:30 PM` is
/// never read as a 24-hour `10:30` followed by text. Month-first slash
/// dates come before day-first ones; the day-first row only wins when the
/// month-first reading is impossible.
pub static PATTERN_TABLE: &[PatternRow] = &[
    row(Framing::Bracket, DateLayout::SlashMdy, Clock::H12),
    row(Framing::Bracket, DateLayout::SlashMdy, Clock::H24),
    row(Framing::Bracket, DateLayout::SlashDmy, Clock::H12),
    row(Framing::Bracket, DateLayout::SlashDmy, Clock::H24),
    row(Framing::Bracket, DateLayout::DotDmy, Clock::H12),
    row(Framing::Bracket, DateLayout::DotDmy, Clock::H24),
    row(Framing::Bracket, DateLayout::IsoYmd, Clock::H12),
    row(Framing::Bracket, DateLayout::IsoYmd, Clock::H24),
    row(Framing::Bracket, DateLayout::DashMdy, Clock::H12),
    row(Framing::Bracket, DateLayout::DashMdy, Clock::H24),
    row(Framing::Dash, DateLayout::SlashMdy, Clock::H12),
    row(Framing::Dash, DateLayout::SlashMdy, Clock::H24),
    row(Framing::Dash, DateLayout::SlashDmy, Clock::H12),
    row(Framing::Dash, DateLayout::SlashDmy, Clock::H24),
    row(Framing::Dash, DateLayout::DotDmy, Clock::H12),
    row(Framing::Dash, DateLayout::DotDmy, Clock::H24),
    row(Framing::Dash, DateLayout::IsoYmd, Clock::H12),
    row(Framing::Dash, DateLayout::IsoYmd, Clock::H24),
    row(Framing::Dash, DateLayout::DashMdy, Clock::H12),
    row(Framing::Dash, DateLayout::DashMdy, Clock::H24),
];

impl PatternRow {
    /// Regex source for this row, with `date` and `time` capture groups.
    pub fn regex_source(&self) -> String {
        let date = self.layout.pattern();
        let time = self.clock.pattern();
        match self.framing {
            Framing::Bracket => format!(r"^\[(?P<date>{date}),?\s+(?P<time>{time})\]\s*"),
            Framing::Dash => format!(r"^(?P<date>{date}),?\s+(?P<time>{time})\s*[-–—]\s*"),
        }
    }

    fn timestamp(&self, date: &str, time: &str) -> Option<DateTime<Utc>> {
        let date = self.layout.parse(date)?;
        let time = self.clock.parse(time)?;
        Some(NaiveDateTime::new(date, time).and_utc())
    }
}

static COMPILED_TABLE: LazyLock<Vec<(PatternRow, Regex)>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|row| {
            let regex = Regex::new(&row.regex_source()).expect("valid date pattern");
            (*row, regex)
        })
        .collect()
});

/// Outcome of matching a line against the pattern table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix<'a> {
    /// The line starts a new message.
    Message {
        timestamp: DateTime<Utc>,
        pattern: PatternRow,
        rest: &'a str,
    },
    /// A row matched the shape of the line but no row yields a real date.
    InvalidDate,
    /// The line has no date prefix.
    None,
}

/// Matches the start of `line` against [`PATTERN_TABLE`].
///
/// ```
/// use chatparse::parsing::text::{match_prefix, Prefix};
///
/// match match_prefix("[1/1/24, 10:00 AM] Alice: Hi") {
///     Prefix::Message { timestamp, rest, .. } => {
///         assert_eq!(timestamp.to_rfc3339(), "2024-01-01T10:00:00+00:00");
///         assert_eq!(rest, "Alice: Hi");
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn match_prefix(line: &str) -> Prefix<'_> {
    let line = line.trim_start_matches(is_bidi_control);
    if !line.starts_with(|c: char| c == '[' || c.is_ascii_digit()) {
        return Prefix::None;
    }

    let mut shape_matched = false;
    for (row, regex) in COMPILED_TABLE.iter() {
        let Some(caps) = regex.captures(line) else {
            continue;
        };
        shape_matched = true;

        if let Some(timestamp) = row.timestamp(&caps["date"], &caps["time"]) {
            let end = caps.get(0).map_or(0, |m| m.end());
            return Prefix::Message {
                timestamp,
                pattern: *row,
                rest: &line[end..],
            };
        }
    }

    if shape_matched {
        Prefix::InvalidDate
    } else {
        Prefix::None
    }
}

// ============================================================================
// Cleanup
// ============================================================================

/// Returns `true` for invisible bidirectional controls found in exports.
pub fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}'
    )
}

/// Removes bidi controls, collapses whitespace runs to one space and trims.
///
/// ```
/// use chatparse::parsing::text::clean_line;
///
/// assert_eq!(clean_line("\u{200E}  hello \t  world "), "hello world");
/// ```
pub fn clean_line(line: &str) -> String {
    let stripped: String = line.chars().filter(|c| !is_bidi_control(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Classification
// ============================================================================

static MESSAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?):\s*(.*)$").expect("valid message regex"));

static ATTACHMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<attached:\s*(.+?)>").expect("valid attachment regex"));

static MEDIA_OMITTED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<?\b(media|image|video|audio|document|sticker|gif)\s+omitted\b>?")
        .expect("valid media regex")
});

static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)location:|maps\.google\.com|goo\.gl/maps|maps\.apple\.com")
        .expect("valid location regex")
});

static DELETED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)this message was deleted|you deleted this message")
        .expect("valid deleted regex")
});

static EDITED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<this message was edited>").expect("valid edited regex")
});

const SYSTEM_KEYWORDS: &[&str] = &[
    "messages and calls are end-to-end encrypted",
    "created group",
    "added",
    "removed",
    "left",
    "changed the subject",
    "changed this group's icon",
    "changed the group description",
    "deleted this group's icon",
    "changed their phone number",
    "joined using this group's invite link",
    "security code changed",
    "you're now an admin",
    "is now an admin",
    "turned on disappearing messages",
    "turned off disappearing messages",
    "сообщения и звонки защищены сквозным шифрованием",
    "создал(а) группу",
    "добавил",
    "удалил",
    "вышел",
    "покинул",
    "изменил тему",
    "изменил иконку группы",
    "изменил описание группы",
    "изменил номер телефона",
    "присоединился по ссылке",
    "теперь администратор",
    "включил исчезающие сообщения",
    "выключил исчезающие сообщения",
];

static SYSTEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = SYSTEM_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})", alternatives.join("|"))).expect("valid system regex")
});

/// Result of classifying assembled message content.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub message_type: MessageType,
    pub content: Option<String>,
    pub attachments: Vec<ParsedAttachment>,
    pub is_deleted: bool,
    pub is_edited: bool,
}

/// Classifies a user message.
///
/// The edit marker is always stripped and only sets a flag. The type is the
/// first of these that applies: attachment tag, media-omitted marker,
/// location, deletion, system keyword, plain text.
pub fn classify(content: &str) -> Classification {
    let is_edited = EDITED_PATTERN.is_match(content);
    let mut text = if is_edited {
        tidy(&EDITED_PATTERN.replace_all(content, ""))
    } else {
        content.to_string()
    };

    let mut attachments = Vec::new();
    let mut is_deleted = false;

    let message_type = if ATTACHMENT_PATTERN.is_match(&text) {
        attachments = ATTACHMENT_PATTERN
            .captures_iter(&text)
            .map(|caps| ParsedAttachment::from_filename(caps[1].trim()))
            .collect();
        let stripped = tidy(&ATTACHMENT_PATTERN.replace_all(&text, ""));
        text = stripped;
        attachments
            .first()
            .map_or(MessageType::Document, |a| a.attachment_type.message_type())
    } else if let Some(caps) = MEDIA_OMITTED_PATTERN.captures(&text) {
        let message_type = media_category(&caps[1], &text);
        let replaced = tidy(&MEDIA_OMITTED_PATTERN.replace_all(&text, MEDIA_PLACEHOLDER));
        text = replaced;
        message_type
    } else if LOCATION_PATTERN.is_match(&text) {
        MessageType::Location
    } else if DELETED_PATTERN.is_match(&text) {
        is_deleted = true;
        MessageType::Deleted
    } else if SYSTEM_PATTERN.is_match(&text) {
        MessageType::System
    } else {
        MessageType::Text
    };

    Classification {
        message_type,
        content: (!text.is_empty()).then_some(text),
        attachments,
        is_deleted,
        is_edited,
    }
}

fn media_category(keyword: &str, content: &str) -> MessageType {
    let keyword = keyword.to_lowercase();
    let hint = if keyword == "media" {
        content.to_lowercase()
    } else {
        keyword
    };

    if hint.contains("video") || hint.contains("gif") {
        MessageType::Video
    } else if hint.contains("audio") {
        MessageType::Audio
    } else if hint.contains("document") {
        MessageType::Document
    } else if hint.contains("sticker") {
        MessageType::Sticker
    } else {
        MessageType::Image
    }
}

/// Trims each line after a marker was removed, dropping lines left empty.
fn tidy(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Line state machine
// ============================================================================

#[derive(Debug)]
struct PendingMessage {
    timestamp: DateTime<Utc>,
    sender: String,
    system: bool,
    lines: Vec<String>,
    raw_lines: Vec<String>,
}

impl PendingMessage {
    fn start(timestamp: DateTime<Utc>, rest: &str, raw: &str) -> Self {
        let rest = clean_line(rest);
        let (sender, first, system) = match MESSAGE_PATTERN.captures(&rest) {
            Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string(), false),
            None => (SYSTEM_SENDER.to_string(), rest.clone(), true),
        };

        let mut lines = Vec::new();
        if !first.is_empty() {
            lines.push(first);
        }
        Self {
            timestamp,
            sender,
            system,
            lines,
            raw_lines: vec![raw.to_string()],
        }
    }

    fn push_continuation(&mut self, cleaned: String, raw: &str) {
        self.lines.push(cleaned);
        self.raw_lines.push(raw.to_string());
    }

    fn finish(self) -> ParsedMessage {
        let content = self.lines.join("\n");
        let mut message = ParsedMessage::new(self.timestamp, self.sender, None)
            .with_raw_text(self.raw_lines.join("\n"));

        if self.system {
            message.message_type = MessageType::System;
            message.content = (!content.is_empty()).then_some(content);
            return message;
        }

        let classified = classify(&content);
        message.message_type = classified.message_type;
        message.content = classified.content;
        message.attachments = classified.attachments;
        message.is_deleted = classified.is_deleted;
        message.is_edited = classified.is_edited;
        message
    }
}

/// Incremental transcript parser.
///
/// Feed lines in order with [`feed`](Self::feed); a finished message is
/// returned whenever a new date prefix closes the previous one. Call
/// [`finish`](Self::finish) at end of input to flush the last message.
///
/// ```
/// use chatparse::parsing::text::LineMachine;
///
/// let mut machine = LineMachine::new();
/// assert!(machine.feed("[1/1/24, 10:00 AM] Alice: Hi").is_none());
/// assert!(machine.feed("second line").is_none());
/// let first = machine.feed("[1/1/24, 10:01 AM] Bob: Hello").unwrap();
/// assert_eq!(first.content.as_deref(), Some("Hi\nsecond line"));
/// assert_eq!(machine.finish().unwrap().sender, "Bob");
/// ```
#[derive(Debug, Default)]
pub struct LineMachine {
    pending: Option<PendingMessage>,
    line_number: usize,
    warnings: Vec<ParseWarning>,
}

impl LineMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one line (a trailing `\r` or `\n` is ignored).
    pub fn feed(&mut self, line: &str) -> Option<ParsedMessage> {
        self.line_number += 1;
        let raw = line.trim_end_matches(['\r', '\n']);
        if raw.trim().is_empty() {
            return None;
        }

        match match_prefix(raw) {
            Prefix::Message { timestamp, rest, .. } => {
                let previous = self.pending.take().map(PendingMessage::finish);
                self.pending = Some(PendingMessage::start(timestamp, rest, raw));
                previous
            }
            Prefix::InvalidDate => {
                self.warn(WarningKind::InvalidDate, format!("Invalid date in line: {}", raw.trim()));
                self.continue_message(raw);
                None
            }
            Prefix::None => {
                self.continue_message(raw);
                None
            }
        }
    }

    fn continue_message(&mut self, raw: &str) {
        let cleaned = clean_line(raw);
        if cleaned.is_empty() {
            return;
        }
        match self.pending.as_mut() {
            Some(pending) => pending.push_continuation(cleaned, raw),
            None => self.warn(WarningKind::MalformedLine, format!("Orphaned line: {cleaned}")),
        }
    }

    fn warn(&mut self, kind: WarningKind, message: String) {
        let warning = ParseWarning::at_line(kind, message, self.line_number);
        debug!(kind = %warning.kind, line = self.line_number, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Flushes the message still being assembled, if any.
    pub fn finish(&mut self) -> Option<ParsedMessage> {
        self.pending.take().map(PendingMessage::finish)
    }

    /// Returns the number of lines fed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }
}
