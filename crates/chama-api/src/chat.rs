use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::debug;

use chama_chat::TicketFilter;
use chama_types::{Attachment, ChatMessage, Conversation};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::payload::{ConversationPage, MessagePage, Payload, UnreadCount};

/// Body of `POST /chat/send`
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub conversation_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessagesQuery<'a> {
    conversation_id: &'a str,
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkRead<'a> {
    conversation_id: &'a str,
}

impl ApiClient {
    /// Send a message; the server-confirmed copy is returned
    pub async fn send_message(&self, request: &SendMessage) -> Result<ChatMessage> {
        if let Some(attachment) = &request.attachment
            && !attachment.within_limit()
        {
            return Err(ApiError::Rejected {
                status: 413,
                message: format!("{} exceeds the 5 MB attachment limit", attachment.name),
            });
        }

        let payload: Payload<ChatMessage> = self.post("/chat/send", request).await?;
        Ok(payload.into_inner())
    }

    /// One page of a conversation, in whatever order the server returns
    pub async fn chat_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ChatMessage>> {
        let query = MessagesQuery {
            conversation_id,
            page,
            limit,
        };
        let payload: Payload<MessagePage<ChatMessage>> = self.post("/chat/messages", &query).await?;
        let mut messages = payload.into_inner().into_vec();

        // Pages may omit the conversation id on each message
        for message in &mut messages {
            if message.conversation_id.is_empty() {
                message.conversation_id = conversation_id.to_string();
            }
        }
        debug!(conversation_id, page, count = messages.len(), "fetched chat messages");
        Ok(messages)
    }

    pub async fn mark_read(&self, conversation_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .put("/chat/mark-read", &MarkRead { conversation_id })
            .await?;
        Ok(())
    }

    pub async fn unread_count(&self) -> Result<u32> {
        let payload: Payload<UnreadCount> = self.get("/chat/unread-count").await?;
        Ok(payload.into_inner().value())
    }

    /// Admin list of support conversations matching `filter`
    pub async fn support_conversations(&self, filter: &TicketFilter) -> Result<Vec<Conversation>> {
        let payload: Payload<ConversationPage<Conversation>> =
            self.post("/chat/support/messages", filter).await?;
        Ok(payload.into_inner().into_vec())
    }
}
