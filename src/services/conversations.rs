//! Direct-message conversations: find-or-create per unordered participant
//! pair, append-only messages, chronological retrieval.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{Conversation, ConversationSummary, Message};
use crate::error::{AppError, AppResult};
use crate::repository::{ConversationRepository, UserRepository};

#[derive(Clone)]
pub struct ConversationThread {
    conversations: Arc<dyn ConversationRepository>,
    users: Arc<dyn UserRepository>,
}

impl ConversationThread {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            conversations,
            users,
        }
    }

    /// Conversation for the unordered pair (a, b), created on first use.
    /// Canonical participant ordering guarantees (a, b) and (b, a) land on
    /// the same row.
    pub async fn find_or_create(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        if a == b {
            return Err(AppError::InvalidOperand(
                "users cannot message themselves".to_string(),
            ));
        }
        if !self.users.exists(a).await? || !self.users.exists(b).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }

        self.conversations.find_or_create(a, b).await
    }

    /// Append a message to an existing conversation. The sender must be one
    /// of the two participants.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "message content cannot be empty".to_string(),
            ));
        }

        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no conversation found".to_string()))?;

        if !conversation.has_participant(sender_id) {
            return Err(AppError::NotOwner);
        }

        let message = self
            .conversations
            .append_message(conversation_id, sender_id, content)
            .await?;

        info!(%conversation_id, %sender_id, message_id = %message.id, "message sent");
        Ok(message)
    }

    /// Find-or-create the conversation with `recipient_id` and append in one
    /// call; the path a first message takes.
    pub async fn send_direct(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let conversation = self.find_or_create(sender_id, recipient_id).await?;
        self.append_message(conversation.id, sender_id, content)
            .await
    }

    /// Messages in ascending creation order; only participants may read.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
    ) -> AppResult<Vec<Message>> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no conversation found".to_string()))?;

        if !conversation.has_participant(requester_id) {
            return Err(AppError::NotOwner);
        }

        self.conversations.list_messages(conversation_id).await
    }

    /// The user's inbox, newest activity first; conversations without
    /// messages sort by their creation time.
    pub async fn list_conversations(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        self.conversations.list_for_user(user_id).await
    }
}
