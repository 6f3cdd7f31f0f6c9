// src/models/message.rs
// DOCUMENTATION: Conversation and chat message models
// PURPOSE: One conversation per participant pair (and optional gear)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub gear_id: Option<Uuid>,
    pub rental_id: Option<Uuid>,
    /// Lower of the two participant ids
    pub participant_a: Uuid,
    /// Higher of the two participant ids
    pub participant_b: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant_a == user_id {
            self.participant_b
        } else {
            self.participant_a
        }
    }

    /// Participant ids are stored ordered so each pair maps to one row
    pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Realtime channel name for this conversation
    pub fn channel(&self) -> String {
        format!("conversation:{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Conversation list entry for GET /conversations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub gear_id: Option<Uuid>,
    pub rental_id: Option<Uuid>,
    pub other_user_id: Uuid,
    pub other_user_name: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// Request DTO for POST /conversations
#[derive(Debug, Deserialize, Validate)]
pub struct StartConversationRequest {
    pub recipient_id: Uuid,
    pub gear_id: Option<Uuid>,
    pub rental_id: Option<Uuid>,

    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Request DTO for POST /conversations/{id}/messages
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Timestamp cursor for message history
#[derive(Debug, Deserialize, Default)]
pub struct MessageListQuery {
    /// Only messages created strictly before this instant
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl MessageListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }
}

/// Response for POST /conversations
#[derive(Debug, Serialize)]
pub struct ConversationWithMessage {
    pub conversation: Conversation,
    pub message: Message,
}
