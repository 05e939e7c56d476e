use std::collections::HashMap;

use tracing::debug;

use chama_chat::{ChatMessage, DisplayMessage, TicketBoard, merge_messages, reconcile};
use chama_logs::{LogEntry, LogFilterSpec, LogStats, filter};
use chama_types::Clock;

use super::Action;
use crate::tracker::RequestTracker;

/// Data fetched through a `Request`/`Success`/`Fail` flow
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Remote<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Remote<T> {
    fn begin(&mut self) {
        self.loading = true;
    }

    fn settle(&mut self) {
        self.loading = false;
        self.error = None;
    }

    fn succeed(&mut self, data: T) {
        self.data = data;
        self.settle();
    }

    fn fail(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
    }
}

/// Where the front end should navigate next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
}

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub authenticated: bool,

    /// Set when the session ends; the front end performs the navigation
    pub redirect: Option<Route>,
}

/// Log view state
#[derive(Clone, Debug, Default)]
pub struct LogsState {
    /// Raw entries from the last accepted fetch
    pub entries: Remote<Vec<LogEntry>>,

    pub filter: LogFilterSpec,

    /// Whether the poller should re-fetch on each tick
    pub auto_refresh: bool,
}

impl LogsState {
    pub fn filtered(&self) -> Vec<LogEntry> {
        filter(&self.entries.data, &self.filter)
    }
}

/// Chat view state: raw fetched messages per conversation
#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub threads: HashMap<String, Remote<Vec<ChatMessage>>>,

    /// Conversation currently on screen
    pub active: Option<String>,

    /// Server-supplied total across conversations
    pub unread: Remote<u32>,

    pub send_error: Option<String>,

    /// Last failed mark-read; the optimistic read state stays in place
    pub read_error: Option<String>,
}

impl ChatState {
    fn thread_mut(&mut self, conversation_id: &str) -> &mut Remote<Vec<ChatMessage>> {
        self.threads.entry(conversation_id.to_string()).or_default()
    }

    /// Display thread, reconciled from the raw messages on every call
    pub fn thread(&self, conversation_id: &str, clock: &dyn Clock) -> Vec<DisplayMessage> {
        self.threads
            .get(conversation_id)
            .map(|t| reconcile(&t.data, conversation_id, clock))
            .unwrap_or_default()
    }

    fn remove_pending(&mut self, conversation_id: &str, local_id: &str) {
        if let Some(thread) = self.threads.get_mut(conversation_id) {
            thread.data.retain(|m| m.resolved_id() != Some(local_id));
        }
    }
}

/// Global application state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub session: SessionState,
    pub logs: LogsState,
    pub chat: ChatState,

    /// Admin support view
    pub support: Remote<TicketBoard>,

    /// User-facing alert (if any)
    pub alert: Option<String>,

    requests: RequestTracker,
}

impl AppState {
    pub fn new(authenticated: bool) -> Self {
        Self {
            session: SessionState {
                authenticated,
                redirect: None,
            },
            ..Self::default()
        }
    }

    /// Apply one action; the only way state changes
    pub fn reduce(&mut self, action: Action) {
        if let Some(ticket) = action.resolution_ticket() {
            if !self.requests.is_current(ticket) {
                debug!(
                    action = action.name(),
                    resource = ?ticket.resource,
                    seq = ticket.seq,
                    "discarding superseded response"
                );
                return;
            }
            self.requests.finish(ticket);
        }

        match action {
            Action::FetchLogsRequest { ticket } => {
                self.requests.begin(&ticket);
                self.logs.entries.begin();
            }
            Action::FetchLogsSuccess { logs, .. } => self.logs.entries.succeed(logs),
            Action::FetchLogsFail { error, .. } => self.logs.entries.fail(error),
            Action::UpdateLogFilter(patch) => self.logs.filter.apply(patch),
            Action::ClearLogFilter => self.logs.filter = LogFilterSpec::default(),
            Action::SetAutoRefresh(enabled) => self.logs.auto_refresh = enabled,

            Action::FetchMessagesRequest {
                ticket,
                conversation_id,
            } => {
                self.requests.begin(&ticket);
                self.chat.thread_mut(&conversation_id).begin();
            }
            Action::FetchMessagesSuccess {
                conversation_id,
                messages,
                ..
            } => {
                self.support.data.add_messages(&conversation_id, messages.clone());
                let thread = self.chat.thread_mut(&conversation_id);
                merge_messages(&mut thread.data, messages);
                thread.settle();
            }
            Action::FetchMessagesFail {
                conversation_id,
                error,
                ..
            } => self.chat.thread_mut(&conversation_id).fail(error),

            Action::SendMessageRequest { ticket, pending } => {
                self.requests.begin(&ticket);
                self.chat.send_error = None;
                let conversation_id = pending.conversation_id.clone();
                self.chat.thread_mut(&conversation_id).data.push(pending);
            }
            Action::SendMessageSuccess {
                conversation_id,
                local_id,
                mut message,
                ..
            } => {
                if message.conversation_id.is_empty() {
                    message.conversation_id = conversation_id.clone();
                }
                self.chat.remove_pending(&conversation_id, &local_id);
                self.support
                    .data
                    .add_messages(&conversation_id, vec![message.clone()]);
                merge_messages(&mut self.chat.thread_mut(&conversation_id).data, vec![message]);
            }
            Action::SendMessageFail {
                conversation_id,
                local_id,
                error,
                ..
            } => {
                self.chat.remove_pending(&conversation_id, &local_id);
                self.chat.send_error = Some(error);
            }

            Action::MarkReadRequest {
                ticket,
                conversation_id,
            } => {
                // Optimistic: no rollback if the call fails
                self.requests.begin(&ticket);
                self.chat.read_error = None;
                if let Some(thread) = self.chat.threads.get_mut(&conversation_id) {
                    for message in &mut thread.data {
                        message.read = true;
                    }
                }
                self.support.data.mark_read(&conversation_id);
            }
            Action::MarkReadSuccess { .. } => {}
            Action::MarkReadFail { error, .. } => self.chat.read_error = Some(error),

            Action::UnreadCountRequest { ticket } => {
                self.requests.begin(&ticket);
                self.chat.unread.begin();
            }
            Action::UnreadCountSuccess { count, .. } => self.chat.unread.succeed(count),
            Action::UnreadCountFail { error, .. } => self.chat.unread.fail(error),

            Action::FetchTicketsRequest { ticket } => {
                self.requests.begin(&ticket);
                self.support.begin();
            }
            Action::FetchTicketsSuccess { conversations, .. } => {
                self.support.data.replace(conversations);
                self.support.settle();
            }
            Action::FetchTicketsFail { error, .. } => self.support.fail(error),
            Action::OpenConversation(conversation_id) => {
                self.support.data.open(&conversation_id);
                self.chat.active = Some(conversation_id);
            }

            Action::Logout => {
                let filter = std::mem::take(&mut self.logs.filter);
                let alert = self.alert.take();
                *self = Self::default();
                self.logs.filter = filter;
                self.alert = alert;
                self.session.redirect = Some(Route::Login);
            }

            Action::ShowAlert(message) => self.alert = Some(message),
            Action::DismissAlert => self.alert = None,
        }
    }

    /// Log entries passing the current filter
    pub fn filtered_logs(&self) -> Vec<LogEntry> {
        self.logs.filtered()
    }

    /// Statistics over the filtered log entries
    pub fn log_stats(&self, clock: &dyn Clock) -> LogStats {
        LogStats::compute(&self.filtered_logs(), clock)
    }

    pub fn requests_in_flight(&self) -> usize {
        self.requests.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Resource, Ticket};
    use chama_chat::MessageStatus;
    use chama_logs::{LevelFilter, LogFilterPatch, LogLevel};
    use chama_types::{Conversation, FixedClock};
    use chrono::{TimeZone, Utc};

    fn ticket(resource: Resource, seq: u64) -> Ticket {
        Ticket { resource, seq }
    }

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
    }

    fn logs() -> Vec<LogEntry> {
        vec![
            LogEntry::new(LogLevel::Error, "2024-01-02T11:30:00Z", "disk full"),
            LogEntry::new(LogLevel::Info, "2024-01-02T11:45:00Z", "ok"),
        ]
    }

    #[test]
    fn test_fetch_logs_flow() {
        let mut state = AppState::default();
        let t = ticket(Resource::Logs, 1);

        state.reduce(Action::FetchLogsRequest { ticket: t.clone() });
        assert!(state.logs.entries.loading);

        state.reduce(Action::FetchLogsSuccess {
            ticket: t,
            logs: logs(),
        });
        assert!(!state.logs.entries.loading);
        assert_eq!(state.logs.entries.data.len(), 2);
        assert_eq!(state.requests_in_flight(), 0);
    }

    #[test]
    fn test_superseded_logs_response_is_discarded() {
        let mut state = AppState::default();
        let old = ticket(Resource::Logs, 1);
        let new = ticket(Resource::Logs, 2);
        state.reduce(Action::FetchLogsRequest { ticket: old.clone() });
        state.reduce(Action::FetchLogsRequest { ticket: new.clone() });

        state.reduce(Action::FetchLogsSuccess {
            ticket: new,
            logs: logs(),
        });
        state.reduce(Action::FetchLogsSuccess {
            ticket: old,
            logs: Vec::new(),
        });
        assert_eq!(state.logs.entries.data.len(), 2);
    }

    #[test]
    fn test_fail_keeps_previous_data() {
        let mut state = AppState::default();
        let first = ticket(Resource::Logs, 1);
        state.reduce(Action::FetchLogsRequest { ticket: first.clone() });
        state.reduce(Action::FetchLogsSuccess {
            ticket: first,
            logs: logs(),
        });

        let second = ticket(Resource::Logs, 2);
        state.reduce(Action::FetchLogsRequest { ticket: second.clone() });
        state.reduce(Action::FetchLogsFail {
            ticket: second,
            error: "boom".to_string(),
        });
        assert_eq!(state.logs.entries.error.as_deref(), Some("boom"));
        assert_eq!(state.logs.entries.data.len(), 2);
    }

    #[test]
    fn test_filter_patch_and_clear() {
        let mut state = AppState::default();
        state.logs.entries.data = logs();

        state.reduce(Action::UpdateLogFilter(
            LogFilterPatch::default().level(LevelFilter::Matching("error".to_string())),
        ));
        assert_eq!(state.filtered_logs().len(), 1);
        assert_eq!(state.log_stats(&clock()).by_level.error, 1);

        state.reduce(Action::ClearLogFilter);
        assert_eq!(state.filtered_logs(), logs());
        assert_eq!(state.log_stats(&clock()).recent, 2);
    }

    #[test]
    fn test_optimistic_send_replaced_by_confirmed_copy() {
        let mut state = AppState::default();
        let t = ticket(Resource::SendMessage("local-1".into()), 1);
        let mut pending = ChatMessage::new("c1", "local-1", "2024-01-02T11:59:00Z", "hi");
        pending.status = Some(MessageStatus::Sending);

        state.reduce(Action::SendMessageRequest {
            ticket: t.clone(),
            pending,
        });
        let thread = state.chat.thread("c1", &clock());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].status, MessageStatus::Sending);

        let mut confirmed = ChatMessage::new("", "srv-9", "2024-01-02T11:59:01Z", "hi");
        confirmed.status = Some(MessageStatus::Sent);
        state.reduce(Action::SendMessageSuccess {
            ticket: t,
            conversation_id: "c1".to_string(),
            local_id: "local-1".to_string(),
            message: confirmed,
        });

        let thread = state.chat.thread("c1", &clock());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id.as_deref(), Some("srv-9"));
        assert_eq!(thread[0].status, MessageStatus::Sent);
    }

    #[test]
    fn test_failed_send_removes_pending() {
        let mut state = AppState::default();
        let t = ticket(Resource::SendMessage("local-2".into()), 2);
        state.reduce(Action::SendMessageRequest {
            ticket: t.clone(),
            pending: ChatMessage::new("c1", "local-2", "2024-01-02T11:59:00Z", "hi"),
        });
        state.reduce(Action::SendMessageFail {
            ticket: t,
            conversation_id: "c1".to_string(),
            local_id: "local-2".to_string(),
            error: "Message too long".to_string(),
        });
        assert!(state.chat.thread("c1", &clock()).is_empty());
        assert_eq!(state.chat.send_error.as_deref(), Some("Message too long"));
    }

    #[test]
    fn test_repeated_fetch_does_not_duplicate() {
        let mut state = AppState::default();
        let page = vec![
            ChatMessage::new("c1", "1", "2024-01-02T10:00:00Z", "a"),
            ChatMessage::new("c1", "2", "2024-01-02T09:00:00Z", "b"),
        ];
        for seq in 1..=2 {
            let t = ticket(Resource::ChatMessages("c1".into()), seq);
            state.reduce(Action::FetchMessagesRequest {
                ticket: t.clone(),
                conversation_id: "c1".to_string(),
            });
            state.reduce(Action::FetchMessagesSuccess {
                ticket: t,
                conversation_id: "c1".to_string(),
                messages: page.clone(),
            });
        }
        let thread = state.chat.thread("c1", &clock());
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].content, "b");
    }

    #[test]
    fn test_open_and_mark_read_zero_unread() {
        let mut state = AppState::default();
        let t = ticket(Resource::SupportTickets, 1);
        state.reduce(Action::FetchTicketsRequest { ticket: t.clone() });
        state.reduce(Action::FetchTicketsSuccess {
            ticket: t,
            conversations: vec![Conversation {
                conversation_id: "c1".to_string(),
                unread_count: 4,
                ..Conversation::default()
            }],
        });
        assert_eq!(state.support.data.total_unread(), 4);

        state.reduce(Action::OpenConversation("c1".to_string()));
        assert_eq!(state.support.data.total_unread(), 0);
        assert_eq!(state.chat.active.as_deref(), Some("c1"));
    }

    #[test]
    fn test_mark_read_failure_kept_apart_from_send_error() {
        let mut state = AppState::default();
        let fetch = ticket(Resource::ChatMessages("c1".into()), 1);
        state.reduce(Action::FetchMessagesRequest {
            ticket: fetch.clone(),
            conversation_id: "c1".to_string(),
        });
        state.reduce(Action::FetchMessagesSuccess {
            ticket: fetch,
            conversation_id: "c1".to_string(),
            messages: vec![ChatMessage::new("c1", "1", "2024-01-02T10:00:00Z", "a")],
        });

        let t = ticket(Resource::MarkRead("c1".into()), 1);
        state.reduce(Action::MarkReadRequest {
            ticket: t.clone(),
            conversation_id: "c1".to_string(),
        });
        state.reduce(Action::MarkReadFail {
            ticket: t,
            error: "Server unavailable".to_string(),
        });

        assert_eq!(state.chat.read_error.as_deref(), Some("Server unavailable"));
        assert!(state.chat.send_error.is_none());
        assert!(state.chat.thread("c1", &clock())[0].read);

        state.reduce(Action::MarkReadRequest {
            ticket: ticket(Resource::MarkRead("c1".into()), 2),
            conversation_id: "c1".to_string(),
        });
        assert!(state.chat.read_error.is_none());
    }

    #[test]
    fn test_logout_resets_and_redirects() {
        let mut state = AppState::new(true);
        state.chat.active = Some("c1".to_string());
        state.logs.filter.search = "disk".to_string();
        let t = ticket(Resource::Logs, 1);
        state.reduce(Action::FetchLogsRequest { ticket: t.clone() });

        state.reduce(Action::Logout);
        assert!(!state.session.authenticated);
        assert_eq!(state.session.redirect, Some(Route::Login));
        assert!(state.chat.active.is_none());
        assert_eq!(state.logs.filter.search, "disk");

        // In-flight responses from the old session are dropped
        state.reduce(Action::FetchLogsSuccess { ticket: t, logs: logs() });
        assert!(state.logs.entries.data.is_empty());
    }

    #[test]
    fn test_alerts() {
        let mut state = AppState::default();
        state.reduce(Action::ShowAlert("Server unavailable".to_string()));
        assert_eq!(state.alert.as_deref(), Some("Server unavailable"));
        state.reduce(Action::DismissAlert);
        assert!(state.alert.is_none());
    }
}
