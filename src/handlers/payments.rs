// src/handlers/payments.rs
// DOCUMENTATION: Checkout and payment processor callbacks
// PURPOSE: PaymentIntent creation for renters, signed webhook intake

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::errors::MarketplaceError;
use crate::services::{PaymentProvider, PaymentService, ResponseCache};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// POST /rentals/{id}/payment-intent
/// Renter checkout for an approved rental
pub async fn create_payment_intent(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let response = PaymentService::create_payment_intent(
        pool.get_ref(),
        config.get_ref(),
        provider.get_ref().as_ref(),
        cache.get_ref(),
        &user,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /payments/webhook
/// DOCUMENTATION: Body is read raw because the signature covers the exact bytes.
/// Non-2xx responses make the processor retry, so only bad signatures and
/// storage failures return errors
pub async fn payment_webhook(
    pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn PaymentProvider>>,
    cache: web::Data<Arc<ResponseCache>>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, MarketplaceError> {
    let payload = std::str::from_utf8(&body)
        .map_err(|_| MarketplaceError::InvalidInput("Webhook body is not valid UTF-8".to_string()))?;

    let signature = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok());

    let event = provider.validate_webhook(signature, payload).map_err(|e| {
        log::warn!("Rejected {} webhook: {}", provider.name(), e);
        MarketplaceError::from(e)
    })?;

    match event {
        Some(event) => {
            log::info!("Webhook {} received ({})", event.event_id, event.event_type);
            PaymentService::handle_webhook(pool.get_ref(), cache.get_ref(), event).await?;
        }
        None => log::debug!("Payment provider {} does not use webhooks", provider.name()),
    }

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/payments/webhook", web::post().to(payment_webhook));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use crate::services::payments::stripe::{tests::signature_header, StripeProvider};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_webhook_accepted_for_dummy_provider() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/payments/webhook")
            .set_payload("{}")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["received"], true);
    }

    #[actix_web::test]
    async fn test_webhook_signature_is_enforced() {
        let provider: Arc<dyn PaymentProvider> = Arc::new(StripeProvider::new(
            "sk_test_123".to_string(),
            "whsec_test".to_string(),
        ));
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .app_data(web::Data::new(provider))
                .configure(config),
        )
        .await;

        let payload = r#"{"id":"evt_1","type":"customer.created","data":{"object":{"id":"cus_1","object":"customer"}}}"#;

        let unsigned = test::TestRequest::post()
            .uri("/payments/webhook")
            .set_payload(payload)
            .to_request();
        assert_eq!(test::call_service(&app, unsigned).await.status(), StatusCode::UNAUTHORIZED);

        let forged = test::TestRequest::post()
            .uri("/payments/webhook")
            .insert_header(("Stripe-Signature", "t=1,v1=00"))
            .set_payload(payload)
            .to_request();
        assert_eq!(test::call_service(&app, forged).await.status(), StatusCode::UNAUTHORIZED);

        // Stale deliveries are refused even when correctly signed
        let stale = signature_header(chrono::Utc::now().timestamp() - 3600, payload, "whsec_test");
        let replayed = test::TestRequest::post()
            .uri("/payments/webhook")
            .insert_header(("Stripe-Signature", stale))
            .set_payload(payload)
            .to_request();
        assert_eq!(test::call_service(&app, replayed).await.status(), StatusCode::UNAUTHORIZED);
    }
}
