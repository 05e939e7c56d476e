//! Action creators: each runs one `Request` → `Success`|`Fail` flow against
//! the API and returns the outcome to the caller as well.

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use chama_api::{ApiClient, Result, SendMessage};
use chama_chat::{ChatMessage, MessageStatus, TicketFilter};
use chama_types::{Attachment, SenderType};

use crate::Action;
use crate::store::Store;
use crate::tracker::{Resource, Ticket};

pub async fn fetch_logs(store: &Store, api: &ApiClient) -> Result<usize> {
    let ticket = store.ticket(Resource::Logs);
    store.dispatch(Action::FetchLogsRequest {
        ticket: ticket.clone(),
    });

    match api.list_logs().await {
        Ok(logs) => {
            let count = logs.len();
            store.dispatch(Action::FetchLogsSuccess { ticket, logs });
            Ok(count)
        }
        Err(e) => {
            store.dispatch(Action::FetchLogsFail {
                ticket,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

pub async fn fetch_messages(
    store: &Store,
    api: &ApiClient,
    conversation_id: &str,
    page: u32,
    limit: u32,
) -> Result<usize> {
    let ticket = store.ticket(Resource::ChatMessages(conversation_id.to_string()));
    store.dispatch(Action::FetchMessagesRequest {
        ticket: ticket.clone(),
        conversation_id: conversation_id.to_string(),
    });

    match api.chat_messages(conversation_id, page, limit).await {
        Ok(messages) => {
            let count = messages.len();
            store.dispatch(Action::FetchMessagesSuccess {
                ticket,
                conversation_id: conversation_id.to_string(),
                messages,
            });
            Ok(count)
        }
        Err(e) => {
            store.dispatch(Action::FetchMessagesFail {
                ticket,
                conversation_id: conversation_id.to_string(),
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Show the message as `sending` right away, then swap in the server copy
pub async fn send_message(
    store: &Store,
    api: &ApiClient,
    conversation_id: &str,
    content: &str,
    attachment: Option<Attachment>,
) -> Result<ChatMessage> {
    let seq = store.next_seq();
    let local_id = format!("local-{seq}");
    let ticket = Ticket {
        resource: Resource::SendMessage(local_id.clone()),
        seq,
    };

    let pending = ChatMessage {
        id: Some(local_id.clone()),
        conversation_id: conversation_id.to_string(),
        content: content.to_string(),
        sender_type: SenderType::User,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        attachment: attachment.clone(),
        status: Some(MessageStatus::Sending),
        ..ChatMessage::default()
    };
    store.dispatch(Action::SendMessageRequest {
        ticket: ticket.clone(),
        pending,
    });

    let request = SendMessage {
        conversation_id: conversation_id.to_string(),
        content: content.to_string(),
        attachment,
    };
    match api.send_message(&request).await {
        Ok(message) => {
            debug!(conversation_id, %local_id, "message confirmed");
            store.dispatch(Action::SendMessageSuccess {
                ticket,
                conversation_id: conversation_id.to_string(),
                local_id,
                message: message.clone(),
            });
            Ok(message)
        }
        Err(e) => {
            store.dispatch(Action::SendMessageFail {
                ticket,
                conversation_id: conversation_id.to_string(),
                local_id,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

pub async fn mark_read(store: &Store, api: &ApiClient, conversation_id: &str) -> Result<()> {
    let ticket = store.ticket(Resource::MarkRead(conversation_id.to_string()));
    store.dispatch(Action::MarkReadRequest {
        ticket: ticket.clone(),
        conversation_id: conversation_id.to_string(),
    });

    match api.mark_read(conversation_id).await {
        Ok(()) => {
            store.dispatch(Action::MarkReadSuccess { ticket });
            Ok(())
        }
        Err(e) => {
            store.dispatch(Action::MarkReadFail {
                ticket,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

pub async fn fetch_unread_count(store: &Store, api: &ApiClient) -> Result<u32> {
    let ticket = store.ticket(Resource::UnreadCount);
    store.dispatch(Action::UnreadCountRequest {
        ticket: ticket.clone(),
    });

    match api.unread_count().await {
        Ok(count) => {
            store.dispatch(Action::UnreadCountSuccess { ticket, count });
            Ok(count)
        }
        Err(e) => {
            store.dispatch(Action::UnreadCountFail {
                ticket,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

pub async fn fetch_tickets(store: &Store, api: &ApiClient, filter: &TicketFilter) -> Result<usize> {
    let ticket = store.ticket(Resource::SupportTickets);
    store.dispatch(Action::FetchTicketsRequest {
        ticket: ticket.clone(),
    });

    match api.support_conversations(filter).await {
        Ok(conversations) => {
            let count = conversations.len();
            store.dispatch(Action::FetchTicketsSuccess {
                ticket,
                conversations,
            });
            Ok(count)
        }
        Err(e) => {
            store.dispatch(Action::FetchTicketsFail {
                ticket,
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Select a conversation, then mark it read and load its messages concurrently
pub async fn open_conversation(
    store: &Store,
    api: &ApiClient,
    conversation_id: &str,
    limit: u32,
) -> Result<()> {
    store.dispatch(Action::OpenConversation(conversation_id.to_string()));

    let (read, fetched) = futures::join!(
        mark_read(store, api, conversation_id),
        fetch_messages(store, api, conversation_id, 1, limit),
    );
    read?;
    fetched.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chama_api::{ApiConfig, LoggingHooks, TokenStore};
    use chama_types::FixedClock;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::AppState;
    use crate::store::StoreHooks;

    fn client(store: &Store, base_url: &str) -> ApiClient {
        let tokens = TokenStore::in_memory();
        let hooks = Arc::new(StoreHooks::new(store.clone(), tokens.clone()));
        ApiClient::new(ApiConfig::new(base_url), tokens, hooks).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_logs_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"timestamp": "2024-01-02T10:00:00Z", "levelName": "WARN", "message": "slow"}]
            })))
            .mount(&server)
            .await;

        let store = Store::default();
        let api = client(&store, &server.uri());
        assert_eq!(fetch_logs(&store, &api).await.unwrap(), 1);

        let state = store.snapshot();
        assert!(!state.logs.entries.loading);
        assert_eq!(state.logs.entries.data[0].message(), "slow");
    }

    #[tokio::test]
    async fn test_unauthorized_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = Store::new(AppState::new(true));
        let api = client(&store, &server.uri());
        assert!(fetch_unread_count(&store, &api).await.is_err());

        let state = store.snapshot();
        assert!(!state.session.authenticated);
        assert!(state.session.redirect.is_some());
    }

    #[tokio::test]
    async fn test_server_error_sets_alert_and_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
            .mount(&server)
            .await;

        let store = Store::default();
        let api = client(&store, &server.uri());
        assert!(fetch_messages(&store, &api, "c1", 1, 50).await.is_err());

        let state = store.snapshot();
        assert_eq!(state.alert.as_deref(), Some("database offline"));
        assert!(state.chat.threads["c1"].error.is_some());
    }

    #[tokio::test]
    async fn test_send_message_confirms() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "srv-1", "conversationId": "c1", "content": "habari",
                         "createdAt": "2024-01-02T10:00:00Z", "status": "sent"}
            })))
            .mount(&server)
            .await;

        let store = Store::default();
        let api = ApiClient::new(
            ApiConfig::new(server.uri()),
            TokenStore::in_memory(),
            Arc::new(LoggingHooks),
        )
        .unwrap();
        send_message(&store, &api, "c1", "habari", None).await.unwrap();

        let clock = FixedClock::at(chrono::Utc::now());
        let thread = store.read(|s| s.chat.thread("c1", &clock));
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id.as_deref(), Some("srv-1"));
    }

    #[tokio::test]
    async fn test_open_conversation_marks_read_and_loads() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/chat/mark-read"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "m1", "conversationId": "c1", "content": "hi",
                          "createdAt": "2024-01-02T10:00:00Z"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Store::default();
        let api = client(&store, &server.uri());
        open_conversation(&store, &api, "c1", 50).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.chat.active.as_deref(), Some("c1"));
        assert_eq!(state.chat.threads["c1"].data.len(), 1);
    }
}
