// src/db/message_repository.rs
// DOCUMENTATION: Conversation and message database operations
// PURPOSE: Find-or-create conversations, append and page messages, read receipts

use crate::errors::MarketplaceError;
use crate::models::{Conversation, ConversationSummary, Message, MessageListQuery};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct MessageRepository;

impl MessageRepository {
    /// Find the conversation for an ordered participant pair and optional gear
    pub async fn find_conversation(
        conn: &mut PgConnection,
        participant_a: Uuid,
        participant_b: Uuid,
        gear_id: Option<Uuid>,
    ) -> Result<Option<Conversation>, MarketplaceError> {
        sqlx::query_as::<_, Conversation>(
            r#"
            SELECT * FROM conversations
            WHERE participant_a = $1
              AND participant_b = $2
              AND gear_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(participant_a)
        .bind(participant_b)
        .bind(gear_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to look up conversation: {}", e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Insert the conversation unless a concurrent request already did
    pub async fn create_conversation(
        conn: &mut PgConnection,
        participant_a: Uuid,
        participant_b: Uuid,
        gear_id: Option<Uuid>,
        rental_id: Option<Uuid>,
    ) -> Result<Conversation, MarketplaceError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (participant_a, participant_b, gear_id, rental_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(participant_a)
        .bind(participant_b)
        .bind(gear_id)
        .bind(rental_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            log::error!("Failed to create conversation: {}", e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        Self::find_conversation(conn, participant_a, participant_b, gear_id)
            .await?
            .ok_or(MarketplaceError::InternalError)
    }

    pub async fn get_conversation(pool: &PgPool, id: Uuid) -> Result<Conversation, MarketplaceError> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching conversation {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| MarketplaceError::NotFound(format!("Conversation {}", id)))
    }

    /// Conversations of a user with last message and unread count
    pub async fn list_conversations(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, MarketplaceError> {
        sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id, c.gear_id, c.rental_id,
                   other.id AS other_user_id,
                   other.full_name AS other_user_name,
                   last_msg.content AS last_message,
                   c.last_message_at,
                   (
                       SELECT COUNT(*) FROM messages m
                       WHERE m.conversation_id = c.id
                         AND m.sender_id <> $1
                         AND m.read_at IS NULL
                   ) AS unread_count
            FROM conversations c
            JOIN users other
              ON other.id = CASE WHEN c.participant_a = $1 THEN c.participant_b ELSE c.participant_a END
            LEFT JOIN LATERAL (
                SELECT content FROM messages
                WHERE conversation_id = c.id
                ORDER BY created_at DESC
                LIMIT 1
            ) last_msg ON true
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY c.last_message_at DESC NULLS LAST
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list conversations for {}: {}", user_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Append a message and bump the conversation timestamp
    pub async fn insert_message(
        conn: &mut PgConnection,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<Message, MarketplaceError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            log::error!("Failed to insert message in {}: {}", conversation_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        sqlx::query("UPDATE conversations SET last_message_at = $1 WHERE id = $2")
            .bind(message.created_at)
            .bind(conversation_id)
            .execute(conn)
            .await
            .map_err(|e| {
                log::error!("Failed to touch conversation {}: {}", conversation_id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?;

        Ok(message)
    }

    /// Newest first, cursor on created_at
    pub async fn list_messages(
        pool: &PgPool,
        conversation_id: Uuid,
        query: &MessageListQuery,
    ) -> Result<Vec<Message>, MarketplaceError> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(conversation_id)
        .bind(query.before)
        .bind(query.limit())
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list messages for {}: {}", conversation_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Mark the other party's messages as read; returns rows touched
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, MarketplaceError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to mark messages read in {}: {}", conversation_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected())
    }

    pub async fn count_unread(pool: &PgPool, user_id: Uuid) -> Result<i64, MarketplaceError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.participant_a = $1 OR c.participant_b = $1)
              AND m.sender_id <> $1
              AND m.read_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to count unread messages for {}: {}", user_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }
}
