//! Push notification delivery through the push gateway.
//!
//! The gateway resolves user ids to device tokens; this sender only speaks
//! user ids.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use braidery_common::types::{Job, PushPayload};

use super::{ChannelSender, DeliveryError};

/// Sends push notifications via the gateway's HTTP API.
pub struct PushSender {
    client: Client,
    gateway_url: Option<String>,
    api_key: Option<String>,
}

impl PushSender {
    pub fn new(client: Client, gateway_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            gateway_url,
            api_key,
        }
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    async fn deliver(&self, job: &Job) -> Result<(), DeliveryError> {
        let payload: PushPayload = serde_json::from_value(job.payload.clone())?;

        let (Some(gateway_url), Some(api_key)) = (&self.gateway_url, &self.api_key) else {
            return Err(DeliveryError::NotConfigured("push"));
        };

        let response = self
            .client
            .post(gateway_url)
            .bearer_auth(api_key)
            .json(&json!({
                "user_ids": payload.user_ids,
                "title": payload.title,
                "body": payload.body,
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
