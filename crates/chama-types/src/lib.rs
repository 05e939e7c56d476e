//! Shared types for chama
//!
//! This crate contains data structures used across multiple chama crates.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Time
// ============================================================================

/// Source of the current instant and the viewer's calendar offset
pub trait Clock: Send + Sync {
    /// Current absolute instant
    fn now(&self) -> DateTime<Utc>;

    /// Offset used to decide which calendar day an instant belongs to
    fn offset(&self) -> FixedOffset {
        Utc.fix()
    }
}

/// Wall clock, bucketing days in the process local offset unless overridden
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed offset instead of the local one
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset.unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// Clock frozen at a given instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Naive layouts tried after RFC 3339, all read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
];

/// Parse an ISO-8601 or locale-formatted date-time into an absolute instant
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Deserialization helpers
// ============================================================================

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ids arrive as strings or numbers depending on the endpoint
fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

/// An explicit `null` reads the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    #[default]
    Unknown,
}

impl LogLevel {
    /// All concrete levels, most severe first
    pub const ALL: [LogLevel; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    /// Parse log level from common spellings, case-insensitively
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" | "erro" => Self::Error,
            "warn" | "warning" | "wrn" => Self::Warn,
            "info" | "inf" | "information" => Self::Info,
            "debug" | "dbg" | "debg" => Self::Debug,
            _ => Self::Unknown,
        }
    }

    /// Canonical uppercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log entry as returned by the log listing endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawLogEntry")]
pub struct LogEntry {
    /// Backend identifier, if the backend sent one
    pub id: Option<String>,

    /// Time the entry was recorded
    pub timestamp: String,

    /// Dedicated date field, preferred over `timestamp` when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Severity as sent: a numeric code like `3` or a name like `"ERROR"`
    pub level: Option<String>,

    /// Symbolic severity
    pub level_name: LogLevel,

    /// Origin path or component
    pub source: Option<String>,

    pub message: Option<String>,

    /// Present only for error-level entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// Wire shape of a log entry; every field may be missing or `null`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEntry {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    level: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    level_name: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack_trace: Option<String>,
}

impl From<RawLogEntry> for LogEntry {
    fn from(raw: RawLogEntry) -> Self {
        let level = raw.level.map(|l| l.trim().to_string());
        // Without `levelName` the symbolic level, if any, names the severity
        let level_name = raw
            .level_name
            .as_deref()
            .or(level.as_deref())
            .map(LogLevel::parse)
            .unwrap_or_default();

        Self {
            id: raw.id,
            timestamp: raw.timestamp.unwrap_or_default(),
            date: raw.date,
            level,
            level_name,
            source: raw.source,
            message: raw.message,
            stack_trace: raw.stack_trace,
        }
    }
}

impl LogEntry {
    /// Create a new log entry with minimal fields
    pub fn new(level_name: LogLevel, timestamp: &str, message: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            level_name,
            message: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Stable key within one result set: the id, or the position when absent
    pub fn key(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| index.to_string())
    }

    /// Key that survives refetches: the id, or the entry's content when absent
    pub fn identity(&self) -> String {
        match &self.id {
            Some(id) => format!("id:{id}"),
            None => format!(
                "{}|{}|{}|{}",
                self.effective_date(),
                self.level.as_deref().unwrap_or(self.level_name.as_str()),
                self.source(),
                self.message()
            ),
        }
    }

    /// Message text, empty when missing
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Source text, empty when missing
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    /// The date string used for range checks (`date` wins over `timestamp`)
    pub fn effective_date(&self) -> &str {
        self.date.as_deref().unwrap_or(&self.timestamp)
    }

    /// Parsed effective date, `None` when it cannot be parsed
    pub fn effective_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(self.effective_date())
    }
}

/// Envelope used by list endpoints: `{ "data": [...] }`
#[derive(Clone, Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

// ============================================================================
// Chat Types
// ============================================================================

/// Attachments above this size are rejected before a message is built
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Who wrote a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    #[default]
    User,
    Admin,
    Agent,
    #[serde(other)]
    Other,
}

impl SenderType {
    /// Admin and agent messages render on the support side
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Agent)
    }
}

/// Delivery state of a message; `Sending` is client-optimistic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    #[default]
    #[serde(other)]
    Delivered,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }
}

/// File metadata attached to a message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
}

impl Attachment {
    pub fn within_limit(&self) -> bool {
        self.size <= MAX_ATTACHMENT_BYTES
    }
}

/// A chat message as fetched from the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,

    /// Alternate id some endpoints send instead of `id`
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_id: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub conversation_id: String,

    /// May be empty when an attachment carries the message
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_type: SenderType,

    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub read: bool,

    #[serde(default)]
    pub attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
}

impl ChatMessage {
    pub fn new(conversation_id: &str, id: &str, created_at: &str, content: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            created_at: created_at.to_string(),
            ..Self::default()
        }
    }

    /// `id`, falling back to the alternate id field
    pub fn resolved_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.alt_id.as_deref())
    }
}

// ============================================================================
// Support Ticket Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown ticket status '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// The member on the other side of a support conversation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Support conversation summary; `messages` is filled in lazily
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default, deserialize_with = "string_or_number")]
    pub conversation_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participant: Participant,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TicketStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<ChatMessage>,
}
