use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{canonical_pair, Conversation, ConversationSummary, Message};
use crate::error::AppResult;
use crate::repository::ConversationRepository;

/// Repository for direct-message conversations.
///
/// Participants are stored in canonical order and covered by a unique
/// constraint, so `find_or_create` can upsert without a read-then-write
/// window: two concurrent first messages between the same pair converge on
/// one row.
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_or_create(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        let (participant_a, participant_b) = canonical_pair(a, b);

        // The no-op DO UPDATE makes RETURNING yield the existing row on
        // conflict.
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (participant_a, participant_b)
            VALUES ($1, $2)
            ON CONFLICT (participant_a, participant_b) DO UPDATE
            SET participant_a = EXCLUDED.participant_a
            RETURNING id, participant_a, participant_b, created_at
            "#,
        )
        .bind(participant_a)
        .bind(participant_b)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, participant_a, participant_b, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, content, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let conversations = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id, c.participant_a, c.participant_b,
                   m.content AS last_message,
                   COALESCE(m.created_at, c.created_at) AS last_activity_at
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT content, created_at
                FROM messages
                WHERE conversation_id = c.id
                ORDER BY created_at DESC
                LIMIT 1
            ) m ON TRUE
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY COALESCE(m.created_at, c.created_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }
}
