//! Email delivery through the transactional mail provider.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use braidery_common::types::{EmailPayload, Job};

use super::{ChannelSender, DeliveryError};

/// Sends templated email via the provider's HTTP API.
pub struct EmailSender {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: Option<String>,
}

impl EmailSender {
    pub fn new(client: Client, api_url: String, api_key: Option<String>, from: Option<String>) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    async fn deliver(&self, job: &Job) -> Result<(), DeliveryError> {
        let payload: EmailPayload = serde_json::from_value(job.payload.clone())?;

        let (Some(api_key), Some(from)) = (&self.api_key, &self.from) else {
            return Err(DeliveryError::NotConfigured("email"));
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&json!({
                "from": from,
                "to": payload.to,
                "subject": payload.subject,
                "template": payload.template,
                "variables": payload.variables,
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
