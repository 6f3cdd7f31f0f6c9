// src/handlers/rentals.rs
// DOCUMENTATION: HTTP handlers for rentals
// PURPOSE: Booking requests, lifecycle actions; checkout and disputes hang off the same scope

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::errors::MarketplaceError;
use crate::handlers::{disputes, payments};
use crate::models::{CreateRentalRequest, RentalListQuery};
use crate::services::{PaymentProvider, RateLimiters, RentalAction, RentalService, ResponseCache};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /rentals
/// Request a booking; 201 with the pending rental
pub async fn create_rental(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<ResponseCache>>,
    limiters: web::Data<Arc<RateLimiters>>,
    user: AuthenticatedUser,
    req: web::Json<CreateRentalRequest>,
) -> Result<impl Responder, MarketplaceError> {
    limiters.check_write(user.id)?;
    req.validate()?;

    let rental = RentalService::create_rental(
        pool.get_ref(),
        config.get_ref(),
        cache.get_ref(),
        &user,
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(rental))
}

/// GET /rentals?role=renter|owner&status=..
pub async fn list_rentals(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<RentalListQuery>,
) -> Result<impl Responder, MarketplaceError> {
    let rentals = RentalService::list_rentals(pool.get_ref(), user.id, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rentals))
}

/// GET /rentals/{id}
pub async fn get_rental(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let rental = RentalService::get_rental(pool.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rental))
}

async fn apply(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    id: Uuid,
    action: RentalAction,
) -> Result<HttpResponse, MarketplaceError> {
    let rental = RentalService::transition(
        pool.get_ref(),
        provider.get_ref().as_ref(),
        cache.get_ref(),
        user.id,
        id,
        action,
    )
    .await?;
    Ok(HttpResponse::Ok().json(rental))
}

/// POST /rentals/{id}/approve
pub async fn approve_rental(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    apply(pool, provider, cache, user, path.into_inner(), RentalAction::Approve).await
}

/// POST /rentals/{id}/reject
pub async fn reject_rental(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    apply(pool, provider, cache, user, path.into_inner(), RentalAction::Reject).await
}

/// POST /rentals/{id}/cancel
/// Either participant; open payments are cancelled or refunded
pub async fn cancel_rental(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    apply(pool, provider, cache, user, path.into_inner(), RentalAction::Cancel).await
}

/// POST /rentals/{id}/activate
pub async fn activate_rental(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    apply(pool, provider, cache, user, path.into_inner(), RentalAction::Activate).await
}

/// POST /rentals/{id}/complete
pub async fn complete_rental(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    apply(pool, provider, cache, user, path.into_inner(), RentalAction::Complete).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rentals")
            .route("", web::post().to(create_rental))
            .route("", web::get().to(list_rentals))
            .route("/{id}", web::get().to(get_rental))
            .route("/{id}/approve", web::post().to(approve_rental))
            .route("/{id}/reject", web::post().to(reject_rental))
            .route("/{id}/cancel", web::post().to(cancel_rental))
            .route("/{id}/activate", web::post().to(activate_rental))
            .route("/{id}/complete", web::post().to(complete_rental))
            .route("/{id}/payment-intent", web::post().to(payments::create_payment_intent))
            .route("/{id}/disputes", web::post().to(disputes::open_dispute))
            .route("/{id}/disputes", web::get().to(disputes::list_disputes)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::{http::StatusCode, test, App};

    fn inverted_request() -> serde_json::Value {
        serde_json::json!({
            "gear_id": Uuid::new_v4(),
            "start_date": "2030-06-10",
            "end_date": "2030-06-01"
        })
    }

    #[actix_web::test]
    async fn test_create_rejects_inverted_dates() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/rentals")
            .insert_header(test_support::bearer(Uuid::new_v4()))
            .set_json(inverted_request())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_create_is_write_rate_limited() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state_with_write_limit(1))
                .configure(config),
        )
        .await;
        let user = Uuid::new_v4();

        let first = test::TestRequest::post()
            .uri("/rentals")
            .insert_header(test_support::bearer(user))
            .set_json(inverted_request())
            .to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::BAD_REQUEST);

        let second = test::TestRequest::post()
            .uri("/rentals")
            .insert_header(test_support::bearer(user))
            .set_json(inverted_request())
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    }

    #[actix_web::test]
    async fn test_actions_require_auth() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        for action in ["approve", "reject", "cancel", "activate", "complete", "payment-intent"] {
            let uri = format!("/rentals/{}/{}", Uuid::new_v4(), action);
            let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "action {}", action);
        }
    }
}
