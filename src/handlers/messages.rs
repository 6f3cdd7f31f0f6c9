// src/handlers/messages.rs
// DOCUMENTATION: HTTP handlers for conversations and messages
// PURPOSE: Chat between renters and owners with realtime delivery

use crate::auth::AuthenticatedUser;
use crate::errors::MarketplaceError;
use crate::models::{MessageListQuery, SendMessageRequest, StartConversationRequest};
use crate::services::{MessageService, RateLimiters, RealtimePublisher, ResponseCache};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /conversations
pub async fn start_conversation(
    pool: web::Data<PgPool>,
    publisher: web::Data<Arc<dyn RealtimePublisher>>,
    cache: web::Data<Arc<ResponseCache>>,
    limiters: web::Data<Arc<RateLimiters>>,
    user: AuthenticatedUser,
    req: web::Json<StartConversationRequest>,
) -> Result<impl Responder, MarketplaceError> {
    limiters.check_write(user.id)?;
    req.validate()?;

    let result = MessageService::start_conversation(
        pool.get_ref(),
        publisher.get_ref().as_ref(),
        cache.get_ref(),
        &user,
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(result))
}

/// GET /conversations
pub async fn list_conversations(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, MarketplaceError> {
    let conversations = MessageService::list_conversations(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

/// GET /conversations/{id}/messages?before=..&limit=..
pub async fn list_messages(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<MessageListQuery>,
) -> Result<impl Responder, MarketplaceError> {
    let messages =
        MessageService::list_messages(pool.get_ref(), user.id, path.into_inner(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /conversations/{id}/messages
pub async fn send_message(
    pool: web::Data<PgPool>,
    publisher: web::Data<Arc<dyn RealtimePublisher>>,
    cache: web::Data<Arc<ResponseCache>>,
    limiters: web::Data<Arc<RateLimiters>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> Result<impl Responder, MarketplaceError> {
    limiters.check_write(user.id)?;
    req.validate()?;

    let message = MessageService::send_message(
        pool.get_ref(),
        publisher.get_ref().as_ref(),
        cache.get_ref(),
        user.id,
        path.into_inner(),
        &req.content,
    )
    .await?;
    Ok(HttpResponse::Created().json(message))
}

/// POST /conversations/{id}/read
pub async fn mark_read(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let updated = MessageService::mark_read(pool.get_ref(), cache.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "marked_read": updated })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/conversations")
            .route("", web::post().to(start_conversation))
            .route("", web::get().to(list_conversations))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/messages", web::post().to(send_message))
            .route("/{id}/read", web::post().to(mark_read)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_cannot_message_self() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;
        let me = Uuid::new_v4();

        let req = test::TestRequest::post()
            .uri("/conversations")
            .insert_header(test_support::bearer(me))
            .set_json(json!({ "recipient_id": me, "content": "hello" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[actix_web::test]
    async fn test_message_length_is_validated() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        let uri = format!("/conversations/{}/messages", Uuid::new_v4());
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(test_support::bearer(Uuid::new_v4()))
            .set_json(json!({ "content": "x".repeat(2001) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
