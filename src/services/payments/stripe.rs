//! Stripe payment provider implementation

use async_trait::async_trait;
use stripe::{
    CancelPaymentIntent, Client, CreatePaymentIntent as StripeCreatePaymentIntent, CreateRefund, Currency, EventObject,
    EventType, Metadata, PaymentIntentId, Refund, RequestStrategy, Webhook,
};

use super::{CreatePaymentIntent, PaymentError, PaymentIntent, PaymentProvider, Result, WebhookEvent, WebhookEventKind};

/// Stripe payment provider
pub struct StripeProvider {
    client: Client,
    webhook_secret: String,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret,
        }
    }

    fn parse_intent_id(id: &str) -> Result<PaymentIntentId> {
        id.parse()
            .map_err(|_| PaymentError::InvalidData(format!("Invalid Stripe PaymentIntent id: {}", id)))
    }
}

fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_lowercase()))
        .map_err(|_| PaymentError::InvalidData(format!("Unsupported currency: {}", code)))
}

fn provider_error(context: &str, err: stripe::StripeError) -> PaymentError {
    log::error!("{}: {:?}", context, err);
    PaymentError::ProviderApi(err.to_string())
}

impl From<stripe::PaymentIntent> for PaymentIntent {
    fn from(intent: stripe::PaymentIntent) -> Self {
        Self {
            id: intent.id.to_string(),
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency.to_string(),
            status: intent.status.as_str().to_string(),
        }
    }
}

/// Marketplace meaning of a Stripe event type
pub fn event_kind(event_type: &EventType) -> WebhookEventKind {
    match event_type {
        EventType::PaymentIntentSucceeded => WebhookEventKind::PaymentSucceeded,
        EventType::PaymentIntentPaymentFailed | EventType::PaymentIntentCanceled => WebhookEventKind::PaymentFailed,
        EventType::ChargeRefunded => WebhookEventKind::Refunded,
        _ => WebhookEventKind::Other,
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> Result<PaymentIntent> {
        let mut metadata = Metadata::new();
        metadata.insert("rental_id".to_string(), params.rental_id.to_string());

        let mut create = StripeCreatePaymentIntent::new(params.amount, parse_currency(&params.currency)?);
        create.metadata = Some(metadata);
        create.receipt_email = params.receipt_email.as_deref();

        // Retried requests with the same key return the original intent
        let client = self
            .client
            .clone()
            .with_strategy(RequestStrategy::Idempotent(params.idempotency_key.clone()));

        let intent = stripe::PaymentIntent::create(&client, create)
            .await
            .map_err(|e| provider_error("Failed to create Stripe PaymentIntent", e))?;

        log::info!("Created Stripe PaymentIntent {} for rental {}", intent.id, params.rental_id);
        Ok(intent.into())
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent> {
        let intent_id = Self::parse_intent_id(id)?;
        let intent = stripe::PaymentIntent::retrieve(&self.client, &intent_id, &[])
            .await
            .map_err(|e| provider_error("Failed to retrieve Stripe PaymentIntent", e))?;
        Ok(intent.into())
    }

    async fn cancel_payment_intent(&self, id: &str) -> Result<()> {
        let intent_id = Self::parse_intent_id(id)?;
        stripe::PaymentIntent::cancel(&self.client, &intent_id, CancelPaymentIntent { cancellation_reason: None })
            .await
            .map_err(|e| provider_error("Failed to cancel Stripe PaymentIntent", e))?;
        log::info!("Cancelled Stripe PaymentIntent {}", id);
        Ok(())
    }

    async fn refund_payment_intent(&self, id: &str) -> Result<()> {
        let mut refund = CreateRefund::new();
        refund.payment_intent = Some(Self::parse_intent_id(id)?);

        let client = self
            .client
            .clone()
            .with_strategy(RequestStrategy::Idempotent(format!("refund-{}", id)));

        Refund::create(&client, refund)
            .await
            .map_err(|e| provider_error("Failed to refund Stripe PaymentIntent", e))?;
        log::info!("Refunded Stripe PaymentIntent {}", id);
        Ok(())
    }

    fn validate_webhook(&self, signature: Option<&str>, body: &str) -> Result<Option<WebhookEvent>> {
        // An empty key would let anyone compute a valid signature
        if self.webhook_secret.is_empty() {
            log::error!("Stripe webhook secret is not configured; rejecting delivery");
            return Err(PaymentError::InvalidSignature);
        }

        let signature = signature.ok_or_else(|| {
            log::error!("Missing stripe-signature header");
            PaymentError::InvalidSignature
        })?;

        let event = Webhook::construct_event(body, signature, &self.webhook_secret).map_err(|e| {
            log::warn!("Failed to construct webhook event: {:?}", e);
            PaymentError::InvalidSignature
        })?;

        let payment_intent_id = match &event.data.object {
            EventObject::PaymentIntent(intent) => Some(intent.id.to_string()),
            EventObject::Charge(charge) => charge.payment_intent.as_ref().map(|pi| pi.id().to_string()),
            _ => None,
        };

        let webhook_event = WebhookEvent {
            event_id: event.id.to_string(),
            event_type: format!("{:?}", event.type_),
            kind: event_kind(&event.type_),
            payment_intent_id,
        };
        log::debug!("Validated Stripe webhook event {} ({})", webhook_event.event_id, webhook_event.event_type);

        Ok(Some(webhook_event))
    }
}
