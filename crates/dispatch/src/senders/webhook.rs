//! Webhook delivery — arbitrary HTTP requests to partner endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};

use braidery_common::types::{Job, WebhookPayload};

use super::{ChannelSender, DeliveryError};

/// Request timeout when the payload does not specify one.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Issues the HTTP request described by a webhook job's payload.
pub struct WebhookSender {
    client: Client,
}

impl WebhookSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Webhook deliveries count redirects as success: the partner's server
/// answered and chose to send us elsewhere, which is their business.
fn is_ok_range(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

#[async_trait]
impl ChannelSender for WebhookSender {
    async fn deliver(&self, job: &Job) -> Result<(), DeliveryError> {
        let payload: WebhookPayload = serde_json::from_value(job.payload.clone())?;

        let method = Method::from_bytes(payload.method.to_uppercase().as_bytes())
            .map_err(|_| DeliveryError::InvalidRequest(format!("bad method '{}'", payload.method)))?;

        let timeout = Duration::from_secs(payload.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let mut request = self.client.request(method, &payload.url).timeout(timeout);

        if let Some(headers) = &payload.headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &payload.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if is_ok_range(status) {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_range_accepts_2xx_and_3xx() {
        assert!(is_ok_range(StatusCode::OK));
        assert!(is_ok_range(StatusCode::CREATED));
        assert!(is_ok_range(StatusCode::NO_CONTENT));
        assert!(is_ok_range(StatusCode::MOVED_PERMANENTLY));
        assert!(is_ok_range(StatusCode::TEMPORARY_REDIRECT));
    }

    #[test]
    fn test_ok_range_rejects_4xx_and_5xx() {
        assert!(!is_ok_range(StatusCode::BAD_REQUEST));
        assert!(!is_ok_range(StatusCode::NOT_FOUND));
        assert!(!is_ok_range(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_ok_range(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_ok_range(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert!(Method::from_bytes("post".to_uppercase().as_bytes()).is_ok());
        assert!(Method::from_bytes("DELETE".as_bytes()).is_ok());
    }
}
