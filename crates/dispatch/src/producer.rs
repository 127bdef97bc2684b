//! Producer interface — fire-and-forget enqueueing.
//!
//! Any part of the marketplace that wants to notify someone calls one of the
//! four `queue_*` operations. On success the job is durably recorded as
//! `pending` and its id is returned; on validation or persistence failure the
//! cause is logged and `None` comes back. Nothing here ever propagates an
//! error to the caller — delivery problems belong to the dispatch loop, not
//! to the code path that triggered the notification.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use braidery_common::types::{
    EmailPayload, JobPriority, JobType, PushPayload, SmsPayload, WebhookPayload,
};

use crate::store::{JobStore, NewJob};

/// Enqueue API handed to the rest of the application.
#[derive(Clone)]
pub struct JobProducer {
    store: JobStore,
}

impl JobProducer {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: JobStore::new(pool),
        }
    }

    /// Queue a templated email. Defaults: priority `normal`, 3 attempts.
    pub async fn queue_email(
        &self,
        payload: EmailPayload,
        priority: Option<JobPriority>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Option<Uuid> {
        if let Err(e) = payload.validate() {
            tracing::error!(error = %e, "Rejected email job");
            return None;
        }
        self.enqueue(JobType::Email, &payload, priority, scheduled_at)
            .await
    }

    /// Queue an SMS. Defaults: priority `normal`, 2 attempts.
    pub async fn queue_sms(
        &self,
        payload: SmsPayload,
        priority: Option<JobPriority>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Option<Uuid> {
        if let Err(e) = payload.validate() {
            tracing::error!(error = %e, "Rejected sms job");
            return None;
        }
        self.enqueue(JobType::Sms, &payload, priority, scheduled_at)
            .await
    }

    /// Queue a push notification. Fires as soon as it is claimed — push has
    /// no deferred scheduling. Defaults: priority `normal`, 2 attempts.
    pub async fn queue_push(
        &self,
        payload: PushPayload,
        priority: Option<JobPriority>,
    ) -> Option<Uuid> {
        if let Err(e) = payload.validate() {
            tracing::error!(error = %e, "Rejected push job");
            return None;
        }
        self.enqueue(JobType::Push, &payload, priority, None).await
    }

    /// Queue an outbound webhook call. Webhooks are the least reliable
    /// channel, so they default to 5 attempts.
    pub async fn queue_webhook(
        &self,
        payload: WebhookPayload,
        priority: Option<JobPriority>,
    ) -> Option<Uuid> {
        if let Err(e) = payload.validate() {
            tracing::error!(error = %e, "Rejected webhook job");
            return None;
        }
        self.enqueue(JobType::Webhook, &payload, priority, None)
            .await
    }

    async fn enqueue<P: serde::Serialize>(
        &self,
        job_type: JobType,
        payload: &P,
        priority: Option<JobPriority>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Option<Uuid> {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(%job_type, error = %e, "Failed to serialize job payload");
                return None;
            }
        };

        let new = NewJob {
            job_type,
            priority: priority.unwrap_or_default(),
            payload,
            max_attempts: job_type.default_max_attempts(),
            scheduled_at,
        };

        match self.store.insert(new).await {
            Ok(job) => {
                tracing::info!(
                    job_id = %job.id,
                    %job_type,
                    priority = %job.priority,
                    "Job enqueued"
                );
                Some(job.id)
            }
            Err(e) => {
                tracing::error!(%job_type, error = %e, "Failed to enqueue job");
                None
            }
        }
    }
}
