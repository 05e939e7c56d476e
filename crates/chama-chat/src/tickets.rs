use serde::Serialize;
use tracing::debug;

use chama_types::{ChatMessage, Clock, Conversation, Priority, TicketStatus};

use crate::reconcile::{DisplayMessage, merge_messages, reconcile};

/// Support list criteria, sent as the request body and applied locally
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Case-insensitive match on participant name, email or last message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
}

impl TicketFilter {
    pub fn matches(&self, conversation: &Conversation) -> bool {
        if self.status.is_some_and(|s| s != conversation.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != conversation.priority) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }

        let needle = self.search.to_lowercase();
        let participant = &conversation.participant;
        [
            Some(participant.name.as_str()),
            participant.email.as_deref(),
            conversation.last_message.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Read model for the admin support view
#[derive(Clone, Debug, Default)]
pub struct TicketBoard {
    conversations: Vec<Conversation>,
    selected: Option<String>,
}

impl TicketBoard {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations,
            selected: None,
        }
    }

    /// Replace summaries with a fresh fetch, keeping already loaded messages
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        let mut fresh = conversations;
        for conversation in &mut fresh {
            if !conversation.messages.is_empty() {
                continue;
            }
            if let Some(old) = self.get(&conversation.conversation_id) {
                conversation.messages = old.messages.clone();
            }
        }
        self.conversations = fresh;
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.conversation_id == conversation_id)
    }

    fn get_mut(&mut self, conversation_id: &str) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.conversation_id == conversation_id)
    }

    /// Select a conversation and zero its unread count before the server confirms
    pub fn open(&mut self, conversation_id: &str) -> bool {
        let Some(conversation) = self.get_mut(conversation_id) else {
            return false;
        };
        debug!(
            conversation_id,
            unread = conversation.unread_count,
            "opening conversation"
        );
        conversation.unread_count = 0;
        self.selected = Some(conversation_id.to_string());
        true
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Merge a fetched page of messages into its conversation
    pub fn add_messages(&mut self, conversation_id: &str, messages: Vec<ChatMessage>) -> bool {
        match self.get_mut(conversation_id) {
            Some(conversation) => {
                merge_messages(&mut conversation.messages, messages);
                true
            }
            None => false,
        }
    }

    /// Mark every loaded message of a conversation as read
    pub fn mark_read(&mut self, conversation_id: &str) {
        if let Some(conversation) = self.get_mut(conversation_id) {
            conversation.unread_count = 0;
            for message in &mut conversation.messages {
                message.read = true;
            }
        }
    }

    /// Display thread for a conversation, recomputed on each call
    pub fn thread(&self, conversation_id: &str, clock: &dyn Clock) -> Vec<DisplayMessage> {
        self.get(conversation_id)
            .map(|c| reconcile(&c.messages, conversation_id, clock))
            .unwrap_or_default()
    }

    pub fn visible<'a>(&'a self, filter: &'a TicketFilter) -> impl Iterator<Item = &'a Conversation> {
        self.conversations.iter().filter(move |c| filter.matches(c))
    }

    /// Sum of server-supplied unread counts
    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }
}
