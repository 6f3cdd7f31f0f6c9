//! Dummy payment provider for local development
//!
//! Intents succeed as soon as they are created and ids derive from the rental,
//! so the rental flow can be exercised end to end without a Stripe account.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{CreatePaymentIntent, PaymentError, PaymentIntent, PaymentProvider, Result, WebhookEvent};

#[derive(Default)]
pub struct DummyProvider {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl DummyProvider {
    fn set_status(&self, id: &str, status: &str) -> Result<()> {
        let mut intents = self
            .intents
            .lock()
            .map_err(|_| PaymentError::ProviderApi("Dummy provider state poisoned".to_string()))?;

        let intent = intents
            .get_mut(id)
            .ok_or_else(|| PaymentError::InvalidData(format!("Unknown payment intent {}", id)))?;
        intent.status = status.to_string();
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> Result<PaymentIntent> {
        if params.amount <= 0 {
            return Err(PaymentError::InvalidData("Amount must be positive".to_string()));
        }

        let id = format!("pi_dummy_{}", params.rental_id.simple());
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_dummy", id)),
            id: id.clone(),
            amount: params.amount,
            currency: params.currency.clone(),
            status: "succeeded".to_string(),
        };

        log::info!(
            "Dummy payment of {} {} settled for rental {}",
            params.amount,
            params.currency,
            params.rental_id
        );

        self.intents
            .lock()
            .map_err(|_| PaymentError::ProviderApi("Dummy provider state poisoned".to_string()))?
            .insert(id, intent.clone());

        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent> {
        self.intents
            .lock()
            .map_err(|_| PaymentError::ProviderApi("Dummy provider state poisoned".to_string()))?
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::InvalidData(format!("Unknown payment intent {}", id)))
    }

    async fn cancel_payment_intent(&self, id: &str) -> Result<()> {
        self.set_status(id, "canceled")
    }

    async fn refund_payment_intent(&self, id: &str) -> Result<()> {
        self.set_status(id, "refunded")
    }

    fn validate_webhook(&self, _signature: Option<&str>, _body: &str) -> Result<Option<WebhookEvent>> {
        Ok(None)
    }
}
