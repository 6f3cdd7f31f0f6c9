// src/services/realtime.rs
// DOCUMENTATION: Pushes chat events to subscribed clients
// PURPOSE: Supabase Realtime broadcast over REST, or a no-op when not configured

use crate::config::Config;
use crate::errors::MarketplaceError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// Event name for a freshly stored chat message
pub const NEW_MESSAGE_EVENT: &str = "new-message";

#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Broadcast `payload` as `event` on `channel`
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> Result<(), MarketplaceError>;
}

/// Pick the publisher for the current configuration
pub fn create_publisher(config: &Config) -> Arc<dyn RealtimePublisher> {
    if config.supabase_url.is_empty() || config.supabase_service_key.is_empty() {
        log::info!("Realtime broadcast disabled");
        Arc::new(NoopRealtime)
    } else {
        Arc::new(SupabaseRealtime::new(
            config.supabase_url.clone(),
            config.supabase_service_key.clone(),
        ))
    }
}

/// Supabase Realtime broadcast client
pub struct SupabaseRealtime {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseRealtime {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl RealtimePublisher for SupabaseRealtime {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> Result<(), MarketplaceError> {
        let url = format!("{}/realtime/v1/api/broadcast", self.base_url);
        let body = json!({
            "messages": [{
                "topic": channel,
                "event": event,
                "payload": payload,
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Realtime broadcast request failed: {}", e);
                MarketplaceError::ExternalApiError(format!("Realtime request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log::error!("Realtime broadcast error {}: {}", status, text);
            return Err(MarketplaceError::ExternalApiError(format!(
                "Realtime broadcast returned {}",
                status
            )));
        }

        log::debug!("Broadcast '{}' on {}", event, channel);
        Ok(())
    }
}

/// Publisher used when realtime is not configured
pub struct NoopRealtime;

#[async_trait]
impl RealtimePublisher for NoopRealtime {
    async fn publish(&self, channel: &str, event: &str, _payload: Value) -> Result<(), MarketplaceError> {
        log::debug!("Realtime disabled, dropping '{}' on {}", event, channel);
        Ok(())
    }
}
