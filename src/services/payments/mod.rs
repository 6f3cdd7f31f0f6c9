//! Payment provider abstraction layer
//!
//! Rentals are charged through a PaymentIntent-style flow: the backend creates an
//! intent for the amount due, the client confirms it with the returned secret, and
//! the provider reports the outcome through a signed webhook.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::MarketplaceError;
use crate::models::PaymentStatus;

pub mod dummy;
pub mod stripe;

/// Create a payment provider from configuration
///
/// Stripe when a secret key is configured, otherwise the dummy provider.
pub fn create_provider(config: &Config) -> Arc<dyn PaymentProvider> {
    if config.stripe_secret_key.is_empty() {
        log::info!("Using dummy payment provider");
        Arc::new(dummy::DummyProvider::default())
    } else {
        log::info!("Using Stripe payment provider");
        Arc::new(stripe::StripeProvider::new(
            config.stripe_secret_key.clone(),
            config.stripe_webhook_secret.clone(),
        ))
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,
}

impl From<PaymentError> for MarketplaceError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::ProviderApi(msg) => MarketplaceError::ExternalApiError(msg),
            PaymentError::InvalidData(msg) => MarketplaceError::InvalidInput(msg),
            PaymentError::InvalidSignature => MarketplaceError::Unauthorized,
        }
    }
}

/// Parameters for a new PaymentIntent
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Amount in minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub rental_id: Uuid,
    pub receipt_email: Option<String>,
    /// Sent as Idempotency-Key so retried requests never double-charge
    pub idempotency_key: String,
}

/// Provider-side view of a PaymentIntent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    /// Provider status string (requires_payment_method, processing, succeeded, canceled, ...)
    pub status: String,
}

impl PaymentIntent {
    /// Local payment state implied by the provider status
    pub fn payment_status(&self) -> PaymentStatus {
        match self.status.as_str() {
            "succeeded" => PaymentStatus::Paid,
            "canceled" => PaymentStatus::Failed,
            _ => PaymentStatus::Processing,
        }
    }

    /// Whether the intent can still be confirmed by the client
    pub fn is_reusable(&self) -> bool {
        !matches!(self.status.as_str(), "succeeded" | "canceled")
    }
}

/// Kind of webhook notification the marketplace reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentSucceeded,
    PaymentFailed,
    Refunded,
    Other,
}

/// Represents a verified webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event_id: String,
    /// Raw provider event type (e.g., "payment_intent.succeeded")
    pub event_type: String,
    pub kind: WebhookEventKind,
    pub payment_intent_id: Option<String>,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> Result<PaymentIntent>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent>;

    async fn cancel_payment_intent(&self, id: &str) -> Result<()>;

    /// Refund the full captured amount of an intent
    async fn refund_payment_intent(&self, id: &str) -> Result<()>;

    /// Verify and decode a webhook delivery
    ///
    /// Returns None if this provider doesn't support webhooks.
    /// Returns Err if validation fails (invalid signature, malformed data, etc.)
    fn validate_webhook(&self, signature: Option<&str>, body: &str) -> Result<Option<WebhookEvent>>;
}
