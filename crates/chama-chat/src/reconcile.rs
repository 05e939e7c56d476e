use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use chama_types::{
    Attachment, ChatMessage, Clock, MessageStatus, SenderType, parse_instant,
};

use crate::day::DayBucket;

/// A normalized message ready for display
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayMessage {
    /// `id` or the alternate id; `None` only if the backend sent neither
    pub id: Option<String>,
    pub conversation_id: String,
    pub content: String,
    pub sender_type: SenderType,

    /// `None` when `createdAt` could not be parsed; such messages sort first
    pub created_at: Option<DateTime<Utc>>,
    pub read: bool,
    pub attachment: Option<Attachment>,
    pub status: MessageStatus,

    /// Calendar bucket, re-evaluated on every reconciliation
    pub day: DayBucket,

    /// First message of its day group
    pub starts_new_day: bool,
}

/// Unify ids and fill defaults; day grouping is assigned by the reconciler
pub fn normalize(raw: &ChatMessage) -> DisplayMessage {
    DisplayMessage {
        id: raw.resolved_id().map(str::to_string),
        conversation_id: raw.conversation_id.clone(),
        content: raw.content.clone(),
        sender_type: raw.sender_type,
        created_at: parse_instant(&raw.created_at),
        read: raw.read,
        attachment: raw.attachment.clone(),
        status: raw.status.unwrap_or_default(),
        day: DayBucket::Unknown,
        starts_new_day: false,
    }
}

/// Deduplicated, chronologically ordered view of one conversation
pub fn reconcile(
    raw: &[ChatMessage],
    conversation_id: &str,
    clock: &dyn Clock,
) -> Vec<DisplayMessage> {
    let thread = order_thread(
        raw.iter().filter(|m| m.conversation_id == conversation_id),
        clock,
    );
    debug!(
        conversation_id,
        fetched = raw.len(),
        shown = thread.len(),
        "reconciled conversation"
    );
    thread
}

/// Reconcile every conversation present in `raw` independently
pub fn group_by_conversation(
    raw: &[ChatMessage],
    clock: &dyn Clock,
) -> BTreeMap<String, Vec<DisplayMessage>> {
    let mut groups: BTreeMap<String, Vec<&ChatMessage>> = BTreeMap::new();
    for message in raw {
        groups
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
    }

    groups
        .into_iter()
        .map(|(id, messages)| (id, order_thread(messages.into_iter(), clock)))
        .collect()
}

/// Append a fetched batch, dropping earlier copies of any id it re-delivers
pub fn merge_messages(existing: &mut Vec<ChatMessage>, fetched: Vec<ChatMessage>) {
    let incoming: HashSet<&str> = fetched.iter().filter_map(|m| m.resolved_id()).collect();
    existing.retain(|m| m.resolved_id().is_none_or(|id| !incoming.contains(id)));
    existing.extend(fetched);
}

fn order_thread<'a>(
    messages: impl Iterator<Item = &'a ChatMessage>,
    clock: &dyn Clock,
) -> Vec<DisplayMessage> {
    let normalized: Vec<DisplayMessage> = messages.map(normalize).collect();

    // Last occurrence of an id (in fetch order) replaces earlier ones
    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    for (i, message) in normalized.iter().enumerate() {
        if let Some(id) = message.id.as_deref() {
            last_seen.insert(id, i);
        }
    }
    let keep: Vec<bool> = normalized
        .iter()
        .enumerate()
        .map(|(i, m)| m.id.as_deref().is_none_or(|id| last_seen.get(id) == Some(&i)))
        .collect();

    let mut thread: Vec<DisplayMessage> = normalized
        .into_iter()
        .zip(keep)
        .filter_map(|(message, keep)| keep.then_some(message))
        .collect();

    // Stable: equal instants keep fetch order
    thread.sort_by_key(|m| m.created_at);

    let mut previous: Option<DayBucket> = None;
    for message in &mut thread {
        message.day = DayBucket::of(message.created_at, clock);
        message.starts_new_day = previous != Some(message.day);
        previous = Some(message.day);
    }

    thread
}
