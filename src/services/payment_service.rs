// src/services/payment_service.rs
// DOCUMENTATION: Rental checkout and payment webhook handling
// PURPOSE: Charge total + deposit through the provider, track outcome per rental

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::{begin_transaction, commit_transaction, RentalRepository};
use crate::errors::MarketplaceError;
use crate::models::{PaymentIntentResponse, PaymentStatus, RentalStatus};
use crate::services::cache::ResponseCache;
use crate::services::payments::{CreatePaymentIntent, PaymentProvider, WebhookEvent, WebhookEventKind};
use crate::services::pricing::to_minor_units;
use crate::services::rental_service::RentalService;
use sqlx::PgPool;
use uuid::Uuid;

/// Payment state a webhook moves a rental into, or None when it changes nothing
/// DOCUMENTATION: Paid and refunded are final except that paid can become refunded,
/// so replayed or out-of-order deliveries are no-ops
pub fn next_payment_status(current: PaymentStatus, kind: WebhookEventKind) -> Option<PaymentStatus> {
    let target = match kind {
        WebhookEventKind::PaymentSucceeded => PaymentStatus::Paid,
        WebhookEventKind::PaymentFailed => PaymentStatus::Failed,
        WebhookEventKind::Refunded => PaymentStatus::Refunded,
        WebhookEventKind::Other => return None,
    };

    match (current, target) {
        (current, target) if current == target => None,
        (PaymentStatus::Paid, PaymentStatus::Refunded) => Some(PaymentStatus::Refunded),
        (current, _) if current.is_final() => None,
        (_, target) => Some(target),
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Create or reuse the PaymentIntent for an approved rental
    pub async fn create_payment_intent(
        pool: &PgPool,
        config: &Config,
        provider: &dyn PaymentProvider,
        cache: &ResponseCache,
        user: &AuthenticatedUser,
        rental_id: Uuid,
    ) -> Result<PaymentIntentResponse, MarketplaceError> {
        let rental = RentalRepository::get_by_id(pool, rental_id).await?;

        if rental.renter_id != user.id {
            return Err(MarketplaceError::Forbidden);
        }
        if rental.status != RentalStatus::Approved {
            return Err(MarketplaceError::Conflict(format!(
                "Rental must be approved before payment (currently {})",
                rental.status
            )));
        }
        if rental.payment_status.is_final() {
            return Err(MarketplaceError::Conflict("Rental is already paid".to_string()));
        }

        let amount = to_minor_units(rental.amount_due())?;

        if let Some(existing) = rental.payment_intent_id.as_deref() {
            let intent = provider.retrieve_payment_intent(existing).await?;
            if intent.is_reusable() && intent.amount == amount {
                if let Some(client_secret) = intent.client_secret {
                    log::info!("Reusing PaymentIntent {} for rental {}", intent.id, rental.id);
                    return Ok(PaymentIntentResponse {
                        payment_intent_id: intent.id,
                        client_secret,
                        amount: intent.amount,
                        currency: intent.currency,
                    });
                }
            }
        }

        let idempotency_key = match rental.payment_intent_id.as_deref() {
            Some(previous) => format!("rental-{}-after-{}", rental.id, previous),
            None => format!("rental-{}", rental.id),
        };

        let intent = provider
            .create_payment_intent(&CreatePaymentIntent {
                amount,
                currency: config.currency.clone(),
                rental_id: rental.id,
                receipt_email: Some(user.email.clone()).filter(|e| !e.is_empty()),
                idempotency_key,
            })
            .await?;

        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            log::error!("PaymentIntent {} came back without a client secret", intent.id);
            MarketplaceError::ExternalApiError("PaymentIntent has no client secret".to_string())
        })?;

        let updated =
            RentalRepository::set_payment_intent(pool, rental.id, &intent.id, intent.payment_status()).await?;
        RentalService::invalidate_caches(cache, &updated).await;

        log::info!(
            "PaymentIntent {} created for rental {} ({} {})",
            intent.id,
            rental.id,
            amount,
            intent.currency
        );

        Ok(PaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    /// Apply a verified webhook event; unknown intents and events are ignored
    pub async fn handle_webhook(
        pool: &PgPool,
        cache: &ResponseCache,
        event: WebhookEvent,
    ) -> Result<(), MarketplaceError> {
        if event.kind == WebhookEventKind::Other {
            log::debug!("Ignoring webhook event {} ({})", event.event_id, event.event_type);
            return Ok(());
        }

        let intent_id = match event.payment_intent_id.as_deref() {
            Some(id) => id,
            None => {
                log::warn!("Webhook event {} has no payment intent", event.event_id);
                return Ok(());
            }
        };

        let rental = match RentalRepository::get_by_payment_intent(pool, intent_id).await? {
            Some(rental) => rental,
            None => {
                log::warn!("No rental for PaymentIntent {} (event {})", intent_id, event.event_id);
                return Ok(());
            }
        };

        let mut tx = begin_transaction(pool).await?;
        let locked = RentalRepository::get_for_update(&mut *tx, rental.id).await?;

        let next = match next_payment_status(locked.payment_status, event.kind) {
            Some(next) => next,
            None => {
                log::info!(
                    "Webhook {} leaves rental {} at {:?}",
                    event.event_type,
                    locked.id,
                    locked.payment_status
                );
                return Ok(());
            }
        };

        let updated = RentalRepository::set_payment_status(&mut *tx, locked.id, next).await?;
        commit_transaction(tx).await?;

        log::info!(
            "Rental {} payment {:?} -> {:?} ({})",
            updated.id,
            locked.payment_status,
            next,
            event.event_type
        );
        RentalService::invalidate_caches(cache, &updated).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_moves_open_payments() {
        assert_eq!(
            next_payment_status(PaymentStatus::Processing, WebhookEventKind::PaymentSucceeded),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Processing, WebhookEventKind::PaymentFailed),
            Some(PaymentStatus::Failed)
        );
        // A retry after a failure can still succeed
        assert_eq!(
            next_payment_status(PaymentStatus::Failed, WebhookEventKind::PaymentSucceeded),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Paid, WebhookEventKind::Refunded),
            Some(PaymentStatus::Refunded)
        );
    }

    #[test]
    fn test_webhook_replays_are_noops() {
        assert_eq!(
            next_payment_status(PaymentStatus::Paid, WebhookEventKind::PaymentSucceeded),
            None
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Paid, WebhookEventKind::PaymentFailed),
            None
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Refunded, WebhookEventKind::PaymentSucceeded),
            None
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Refunded, WebhookEventKind::Refunded),
            None
        );
        assert_eq!(
            next_payment_status(PaymentStatus::Processing, WebhookEventKind::Other),
            None
        );
    }

    mod db {
        use super::*;
        use crate::db::test_fixtures::{day, insert_gear, insert_rental, insert_user};

        fn event(id: &str, kind: WebhookEventKind, intent: &str) -> WebhookEvent {
            WebhookEvent {
                event_id: id.to_string(),
                event_type: format!("{:?}", kind),
                kind,
                payment_intent_id: Some(intent.to_string()),
            }
        }

        #[sqlx::test]
        async fn test_webhook_updates_matching_rental(pool: PgPool) {
            let cache = ResponseCache::new(60);
            let owner = insert_user(&pool).await;
            let renter = insert_user(&pool).await;
            let gear = insert_gear(&pool, owner, "Surfboard", "water", 22).await;
            let rental = insert_rental(&pool, &gear, renter, day(3), day(6), RentalStatus::Approved).await;
            RentalRepository::set_payment_intent(&pool, rental.id, "pi_surf", PaymentStatus::Processing)
                .await
                .unwrap();

            PaymentService::handle_webhook(&pool, &cache, event("evt_1", WebhookEventKind::PaymentSucceeded, "pi_surf"))
                .await
                .unwrap();
            let paid = RentalRepository::get_by_id(&pool, rental.id).await.unwrap();
            assert_eq!(paid.payment_status, PaymentStatus::Paid);

            // A late failure for an intent that already succeeded changes nothing
            PaymentService::handle_webhook(&pool, &cache, event("evt_2", WebhookEventKind::PaymentFailed, "pi_surf"))
                .await
                .unwrap();
            let still_paid = RentalRepository::get_by_id(&pool, rental.id).await.unwrap();
            assert_eq!(still_paid.payment_status, PaymentStatus::Paid);

            PaymentService::handle_webhook(&pool, &cache, event("evt_3", WebhookEventKind::Refunded, "pi_surf"))
                .await
                .unwrap();
            let refunded = RentalRepository::get_by_id(&pool, rental.id).await.unwrap();
            assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
        }

        #[sqlx::test]
        async fn test_webhook_for_unknown_intent_is_acknowledged(pool: PgPool) {
            let cache = ResponseCache::new(60);
            let result = PaymentService::handle_webhook(
                &pool,
                &cache,
                event("evt_9", WebhookEventKind::PaymentSucceeded, "pi_nobody"),
            )
            .await;
            assert!(result.is_ok());
        }
    }
}
