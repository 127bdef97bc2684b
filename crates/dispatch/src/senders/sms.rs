//! SMS delivery through the SMS gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use braidery_common::types::{Job, SmsPayload};

use super::{ChannelSender, DeliveryError};

/// Sends text messages via the gateway's HTTP API.
pub struct SmsSender {
    client: Client,
    gateway_url: Option<String>,
    api_key: Option<String>,
}

impl SmsSender {
    pub fn new(client: Client, gateway_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            gateway_url,
            api_key,
        }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    async fn deliver(&self, job: &Job) -> Result<(), DeliveryError> {
        let payload: SmsPayload = serde_json::from_value(job.payload.clone())?;

        let (Some(gateway_url), Some(api_key)) = (&self.gateway_url, &self.api_key) else {
            return Err(DeliveryError::NotConfigured("sms"));
        };

        let response = self
            .client
            .post(gateway_url)
            .bearer_auth(api_key)
            .json(&json!({
                "to": payload.to,
                "message": payload.message,
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(response.status()))
        }
    }
}
