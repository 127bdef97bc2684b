//! Channel senders — one delivery adapter per job type.
//!
//! Each sender owns the HTTP conversation with its provider and reports the
//! outcome as a [`DeliveryError`] on failure. Errors never cross this
//! boundary into the poll loop; the executor turns them into retry or
//! dead-letter transitions.

pub mod email;
pub mod push;
pub mod sms;
pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use braidery_common::config::AppConfig;
use braidery_common::types::{Job, JobType};

use email::EmailSender;
use push::PushSender;
use sms::SmsSender;
use webhook::WebhookSender;

/// Timeout applied to every provider call except webhooks, which carry their
/// own per-job timeout.
const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Why a delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected delivery: HTTP {0}")]
    Rejected(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("no sender registered for job type '{0}'")]
    Unsupported(JobType),
}

/// A delivery adapter for one channel.
///
/// Implementations must not panic; any failure mode is a [`DeliveryError`].
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn deliver(&self, job: &Job) -> Result<(), DeliveryError>;
}

/// Dispatch table mapping a job's type to its sender.
pub struct SenderRegistry {
    senders: HashMap<JobType, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self {
            senders: HashMap::new(),
        }
    }

    /// Register (or replace) the sender for a job type.
    pub fn register(mut self, job_type: JobType, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(job_type, sender);
        self
    }

    /// Build the production registry: all four channels wired to their HTTP
    /// providers from configuration. Channels missing credentials are still
    /// registered — they fail at delivery time and surface through the
    /// normal retry/dead-letter path.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(Self::new()
            .register(
                JobType::Email,
                Arc::new(EmailSender::new(
                    client.clone(),
                    config.email_api_url.clone(),
                    config.email_api_key.clone(),
                    config.email_from.clone(),
                )),
            )
            .register(
                JobType::Sms,
                Arc::new(SmsSender::new(
                    client.clone(),
                    config.sms_gateway_url.clone(),
                    config.sms_api_key.clone(),
                )),
            )
            .register(
                JobType::Push,
                Arc::new(PushSender::new(
                    client.clone(),
                    config.push_gateway_url.clone(),
                    config.push_api_key.clone(),
                )),
            )
            .register(JobType::Webhook, Arc::new(WebhookSender::new(client))))
    }

    /// Deliver a job through its channel's sender.
    pub async fn deliver(&self, job: &Job) -> Result<(), DeliveryError> {
        let sender = self
            .senders
            .get(&job.job_type)
            .ok_or(DeliveryError::Unsupported(job.job_type))?;

        sender.deliver(job).await
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
