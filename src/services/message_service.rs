// src/services/message_service.rs
// DOCUMENTATION: Conversations between users and realtime fan-out
// PURPOSE: Participant checks, find-or-create conversations, best-effort broadcast

use crate::auth::AuthenticatedUser;
use crate::db::{begin_transaction, commit_transaction, MessageRepository, UserRepository};
use crate::errors::MarketplaceError;
use crate::models::{
    Conversation, ConversationSummary, ConversationWithMessage, Message, MessageListQuery,
    StartConversationRequest,
};
use crate::services::cache::ResponseCache;
use crate::services::realtime::{RealtimePublisher, NEW_MESSAGE_EVENT};
use sqlx::PgPool;
use uuid::Uuid;

pub struct MessageService;

impl MessageService {
    /// Open (or reuse) the conversation with `recipient_id` and post the first message
    /// DOCUMENTATION: The sender may not have a profile row yet; it is created from the token
    pub async fn start_conversation(
        pool: &PgPool,
        publisher: &dyn RealtimePublisher,
        cache: &ResponseCache,
        sender: &AuthenticatedUser,
        req: StartConversationRequest,
    ) -> Result<ConversationWithMessage, MarketplaceError> {
        let sender_id = sender.id;
        if req.recipient_id == sender_id {
            return Err(MarketplaceError::InvalidInput(
                "You cannot message yourself".to_string(),
            ));
        }
        UserRepository::get_by_id(pool, req.recipient_id).await?;
        UserRepository::ensure_user(pool, sender_id, &sender.email).await?;

        let (a, b) = Conversation::ordered_pair(sender_id, req.recipient_id);

        let mut tx = begin_transaction(pool).await?;
        let conversation = match MessageRepository::find_conversation(&mut *tx, a, b, req.gear_id).await? {
            Some(existing) => existing,
            None => {
                let created =
                    MessageRepository::create_conversation(&mut *tx, a, b, req.gear_id, req.rental_id).await?;
                log::info!("Conversation {} started by {}", created.id, sender_id);
                created
            }
        };
        let message =
            MessageRepository::insert_message(&mut *tx, conversation.id, sender_id, &req.content).await?;
        commit_transaction(tx).await?;

        Self::broadcast(publisher, &conversation, &message).await;
        cache.invalidate(&ResponseCache::dashboard_key(req.recipient_id)).await;

        Ok(ConversationWithMessage { conversation, message })
    }

    pub async fn list_conversations(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, MarketplaceError> {
        MessageRepository::list_conversations(pool, user_id).await
    }

    async fn get_for_participant(
        pool: &PgPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Conversation, MarketplaceError> {
        let conversation = MessageRepository::get_conversation(pool, conversation_id).await?;
        if !conversation.has_participant(user_id) {
            log::warn!("User {} is not part of conversation {}", user_id, conversation_id);
            return Err(MarketplaceError::Forbidden);
        }
        Ok(conversation)
    }

    pub async fn list_messages(
        pool: &PgPool,
        user_id: Uuid,
        conversation_id: Uuid,
        query: MessageListQuery,
    ) -> Result<Vec<Message>, MarketplaceError> {
        Self::get_for_participant(pool, conversation_id, user_id).await?;
        MessageRepository::list_messages(pool, conversation_id, &query).await
    }

    pub async fn send_message(
        pool: &PgPool,
        publisher: &dyn RealtimePublisher,
        cache: &ResponseCache,
        sender_id: Uuid,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Message, MarketplaceError> {
        let conversation = Self::get_for_participant(pool, conversation_id, sender_id).await?;

        let mut tx = begin_transaction(pool).await?;
        let message = MessageRepository::insert_message(&mut *tx, conversation.id, sender_id, content).await?;
        commit_transaction(tx).await?;

        Self::broadcast(publisher, &conversation, &message).await;
        cache
            .invalidate(&ResponseCache::dashboard_key(conversation.other_participant(sender_id)))
            .await;

        Ok(message)
    }

    /// Mark the other party's messages as read; returns how many changed
    pub async fn mark_read(
        pool: &PgPool,
        cache: &ResponseCache,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<u64, MarketplaceError> {
        Self::get_for_participant(pool, conversation_id, user_id).await?;
        let updated = MessageRepository::mark_read(pool, conversation_id, user_id).await?;
        if updated > 0 {
            cache.invalidate(&ResponseCache::dashboard_key(user_id)).await;
        }
        Ok(updated)
    }

    /// Push a stored message to subscribers; failures are logged only
    async fn broadcast(publisher: &dyn RealtimePublisher, conversation: &Conversation, message: &Message) {
        let payload = match serde_json::to_value(message) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Could not serialize message {} for broadcast: {}", message.id, e);
                return;
            }
        };

        if let Err(e) = publisher
            .publish(&conversation.channel(), NEW_MESSAGE_EVENT, payload)
            .await
        {
            log::warn!("Realtime publish failed for message {}: {}", message.id, e);
        }
    }
}
