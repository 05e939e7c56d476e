//! Plain-text rendering of derived state

use std::fmt::Write;

use chama_chat::{DisplayMessage, format_relative};
use chama_logs::{LogEntry, LogLevel, LogStats};
use chama_types::{Clock, Conversation, MessageStatus, parse_instant};

/// Maximum characters of a last-message preview in ticket rows
const PREVIEW_WIDTH: usize = 48;

pub fn log_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "{} {:<5} {}",
        entry.effective_date(),
        entry.level_name.as_str(),
        entry.message()
    );
    if !entry.source().is_empty() {
        let _ = write!(line, "  ({})", entry.source());
    }
    if let Some(trace) = &entry.stack_trace {
        for frame in trace.lines() {
            let _ = write!(line, "\n    {frame}");
        }
    }
    line
}

pub fn log_stats(stats: &LogStats) -> String {
    let mut out = format!("{} entries, {} in the last hour\n", stats.total, stats.recent);
    for level in LogLevel::ALL {
        let _ = writeln!(out, "  {:<7} {}", level.as_str(), stats.by_level.get(level));
    }
    if stats.by_level.unknown > 0 {
        let _ = writeln!(out, "  {:<7} {}", LogLevel::Unknown.as_str(), stats.by_level.unknown);
    }
    out
}

/// Thread with a divider line before the first message of each day
pub fn thread(messages: &[DisplayMessage], clock: &dyn Clock) -> String {
    let offset = clock.offset();
    let mut out = String::new();
    for message in messages {
        if message.starts_new_day {
            let _ = writeln!(out, "-- {} --", message.day);
        }

        let time = message
            .created_at
            .map(|t| t.with_timezone(&offset).format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let who = if message.sender_type.is_staff() { "support" } else { "member" };
        let _ = write!(out, "[{time}] {who}: {}", message.content);

        if let Some(attachment) = &message.attachment {
            let _ = write!(out, " <{}, {} bytes>", attachment.name, attachment.size);
        }
        if message.status == MessageStatus::Sending {
            out.push_str(" (sending)");
        }
        out.push('\n');
    }
    out
}

pub fn ticket_row(conversation: &Conversation, clock: &dyn Clock) -> String {
    let when = conversation
        .last_message_time
        .as_deref()
        .and_then(parse_instant)
        .map(|t| format_relative(t, clock))
        .unwrap_or_default();
    let preview: String = conversation
        .last_message
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(PREVIEW_WIDTH)
        .collect();
    let unread = match conversation.unread_count {
        0 => String::new(),
        n => format!(" [{n}]"),
    };

    format!(
        "{:<10} {:<11} {:<6} {}{}  {}  {}",
        conversation.conversation_id,
        conversation.status.as_str(),
        conversation.priority.as_str(),
        conversation.participant.name,
        unread,
        preview,
        when
    )
}
