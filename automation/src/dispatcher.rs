// Webhook Dispatcher - signed HTTP delivery of events to subscriber endpoints

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use propel_shared::WebhookSubscription;
use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::events::Event;
use crate::signing;

/// Event wire name header
pub const EVENT_HEADER: &str = "x-propel-event";
/// Envelope timestamp header, identical to the `timestamp` body field
pub const TIMESTAMP_HEADER: &str = "x-propel-timestamp";
/// Delivery id header, stable across retries of one delivery
pub const DELIVERY_HEADER: &str = "x-propel-delivery";
/// Hex HMAC-SHA256 of the raw body, keyed by the subscription secret
pub const SIGNATURE_HEADER: &str = "x-propel-signature";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Endpoint returned HTTP {status} after {attempts} attempt(s)")]
    Status { status: u16, attempts: u32 },
}

/// The JSON body POSTed to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    pub id: Uuid,
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub delivery_id: Uuid,
    pub status: u16,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    config: DispatcherConfig,
}

impl WebhookDispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Deliver one event to one subscription.
    ///
    /// One signed POST, with up to `max_retries` extra attempts for
    /// transient failures (connect/timeout errors and 5xx). 4xx responses
    /// are permanent and never retried. The envelope id stays stable across
    /// retries so receivers can deduplicate, and the signature covers the
    /// exact bytes sent. Outcomes are returned, never escalated: the caller
    /// decides what to log and drops the rest.
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        event: &Event,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let envelope = WebhookEnvelope {
            id: Uuid::new_v4(),
            event: event.kind().as_str().to_string(),
            timestamp: Utc::now(),
            payload: event.payload(),
        };

        let body = serde_json::to_vec(&envelope)?;
        let signature = signing::compute_signature(&subscription.secret, &body);
        // Same RFC 3339 form serde writes into the body, so the header and
        // the envelope's timestamp field are byte-identical
        let timestamp = envelope
            .timestamp
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);

        let mut attempts = 0;
        loop {
            attempts += 1;

            let response = self
                .client
                .post(&subscription.url)
                .header(CONTENT_TYPE, "application/json")
                .header(EVENT_HEADER, envelope.event.as_str())
                .header(TIMESTAMP_HEADER, timestamp.as_str())
                .header(DELIVERY_HEADER, envelope.id.to_string())
                .header(SIGNATURE_HEADER, signature.as_str())
                .body(body.clone())
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(DeliveryReceipt {
                        delivery_id: envelope.id,
                        status: resp.status().as_u16(),
                        attempts,
                    });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if !resp.status().is_server_error() || attempts > self.config.max_retries {
                        return Err(DeliveryError::Status { status, attempts });
                    }
                    warn!(
                        "Webhook delivery {} to {} got HTTP {}, retrying",
                        envelope.id, subscription.url, status
                    );
                }
                Err(e) => {
                    if attempts > self.config.max_retries {
                        return Err(DeliveryError::Request(e));
                    }
                    warn!(
                        "Webhook delivery {} to {} failed ({}), retrying",
                        envelope.id, subscription.url, e
                    );
                }
            }

            self.backoff(attempts).await;
        }
    }

    async fn backoff(&self, attempt: u32) {
        let base = self.config.retry_backoff * attempt;
        let jitter_ceiling = (self.config.retry_backoff.as_millis() as u64) / 2;
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);

        tokio::time::sleep(base + Duration::from_millis(jitter)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_format() {
        let envelope = WebhookEnvelope {
            id: Uuid::new_v4(),
            event: "lead_created".to_string(),
            timestamp: Utc::now(),
            payload: serde_json::json!({ "lead_id": "x", "source": "referral" }),
        };

        let bytes = serde_json::to_vec(&envelope).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["id"], envelope.id.to_string());
        assert_eq!(value["event"], "lead_created");
        assert_eq!(value["payload"]["source"], "referral");

        let raw_timestamp = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(raw_timestamp).is_ok());
    }
}
