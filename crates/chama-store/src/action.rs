use chama_chat::ChatMessage;
use chama_logs::{LogEntry, LogFilterPatch};
use chama_types::Conversation;

use crate::tracker::Ticket;

/// All state transitions of the application (command pattern)
///
/// Async flows come in `Request`/`Success`/`Fail` triples sharing a [`Ticket`].
#[derive(Clone, Debug)]
pub enum Action {
    // Logs
    FetchLogsRequest { ticket: Ticket },
    FetchLogsSuccess { ticket: Ticket, logs: Vec<LogEntry> },
    FetchLogsFail { ticket: Ticket, error: String },
    UpdateLogFilter(LogFilterPatch),
    ClearLogFilter,
    SetAutoRefresh(bool),

    // Chat messages
    FetchMessagesRequest { ticket: Ticket, conversation_id: String },
    FetchMessagesSuccess {
        ticket: Ticket,
        conversation_id: String,
        messages: Vec<ChatMessage>,
    },
    FetchMessagesFail {
        ticket: Ticket,
        conversation_id: String,
        error: String,
    },

    // Sending
    SendMessageRequest { ticket: Ticket, pending: ChatMessage },
    SendMessageSuccess {
        ticket: Ticket,
        conversation_id: String,
        local_id: String,
        message: ChatMessage,
    },
    SendMessageFail {
        ticket: Ticket,
        conversation_id: String,
        local_id: String,
        error: String,
    },

    // Read receipts
    MarkReadRequest { ticket: Ticket, conversation_id: String },
    MarkReadSuccess { ticket: Ticket },
    MarkReadFail { ticket: Ticket, error: String },
    UnreadCountRequest { ticket: Ticket },
    UnreadCountSuccess { ticket: Ticket, count: u32 },
    UnreadCountFail { ticket: Ticket, error: String },

    // Support tickets
    FetchTicketsRequest { ticket: Ticket },
    FetchTicketsSuccess {
        ticket: Ticket,
        conversations: Vec<Conversation>,
    },
    FetchTicketsFail { ticket: Ticket, error: String },
    OpenConversation(String),

    // Session
    Logout,

    // Alerts
    ShowAlert(String),
    DismissAlert,
}

impl Action {
    /// Short name for tracing
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchLogsRequest { .. } => "FETCH_LOGS_REQUEST",
            Self::FetchLogsSuccess { .. } => "FETCH_LOGS_SUCCESS",
            Self::FetchLogsFail { .. } => "FETCH_LOGS_FAIL",
            Self::UpdateLogFilter(_) => "UPDATE_LOG_FILTER",
            Self::ClearLogFilter => "CLEAR_LOG_FILTER",
            Self::SetAutoRefresh(_) => "SET_AUTO_REFRESH",
            Self::FetchMessagesRequest { .. } => "FETCH_MESSAGES_REQUEST",
            Self::FetchMessagesSuccess { .. } => "FETCH_MESSAGES_SUCCESS",
            Self::FetchMessagesFail { .. } => "FETCH_MESSAGES_FAIL",
            Self::SendMessageRequest { .. } => "SEND_MESSAGE_REQUEST",
            Self::SendMessageSuccess { .. } => "SEND_MESSAGE_SUCCESS",
            Self::SendMessageFail { .. } => "SEND_MESSAGE_FAIL",
            Self::MarkReadRequest { .. } => "MARK_READ_REQUEST",
            Self::MarkReadSuccess { .. } => "MARK_READ_SUCCESS",
            Self::MarkReadFail { .. } => "MARK_READ_FAIL",
            Self::UnreadCountRequest { .. } => "UNREAD_COUNT_REQUEST",
            Self::UnreadCountSuccess { .. } => "UNREAD_COUNT_SUCCESS",
            Self::UnreadCountFail { .. } => "UNREAD_COUNT_FAIL",
            Self::FetchTicketsRequest { .. } => "FETCH_TICKETS_REQUEST",
            Self::FetchTicketsSuccess { .. } => "FETCH_TICKETS_SUCCESS",
            Self::FetchTicketsFail { .. } => "FETCH_TICKETS_FAIL",
            Self::OpenConversation(_) => "OPEN_CONVERSATION",
            Self::Logout => "LOGOUT",
            Self::ShowAlert(_) => "SHOW_ALERT",
            Self::DismissAlert => "DISMISS_ALERT",
        }
    }

    /// Ticket of a resolving action (`Success`/`Fail`)
    pub fn resolution_ticket(&self) -> Option<&Ticket> {
        match self {
            Self::FetchLogsSuccess { ticket, .. }
            | Self::FetchLogsFail { ticket, .. }
            | Self::FetchMessagesSuccess { ticket, .. }
            | Self::FetchMessagesFail { ticket, .. }
            | Self::SendMessageSuccess { ticket, .. }
            | Self::SendMessageFail { ticket, .. }
            | Self::MarkReadSuccess { ticket }
            | Self::MarkReadFail { ticket, .. }
            | Self::UnreadCountSuccess { ticket, .. }
            | Self::UnreadCountFail { ticket, .. }
            | Self::FetchTicketsSuccess { ticket, .. }
            | Self::FetchTicketsFail { ticket, .. } => Some(ticket),
            _ => None,
        }
    }
}
