//! Queue introspection and enqueue routes.
//!
//! The GET routes are the operator's window into the queue: the aggregate
//! snapshot and the dead-letter export for manual follow-up. The POST routes
//! let marketplace services outside this process enqueue jobs over HTTP with
//! the same fire-and-forget semantics as the in-process producer.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use braidery_common::error::AppError;
use braidery_common::types::{
    EmailPayload, Job, JobPriority, PushPayload, QueueStats, SmsPayload, WebhookPayload,
};

use crate::state::AppState;

/// Default and maximum page size for the dead-letter listing.
const DEFAULT_FAILED_LIMIT: i64 = 50;
const MAX_FAILED_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/queue/stats", get(queue_stats))
        .route("/api/queue/jobs/failed", get(list_failed_jobs))
        .route("/api/queue/jobs/{id}", get(get_job))
        .route("/api/queue/email", post(enqueue_email))
        .route("/api/queue/sms", post(enqueue_sms))
        .route("/api/queue/push", post(enqueue_push))
        .route("/api/queue/webhook", post(enqueue_webhook))
}

/// GET /api/queue/stats — Aggregate queue snapshot.
async fn queue_stats(State(state): State<AppState>) -> Result<Json<QueueStats>, AppError> {
    let stats = state.store.stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
struct ListFailedQuery {
    limit: Option<i64>,
}

/// GET /api/queue/jobs/failed — Dead-letter export, most recent first.
async fn list_failed_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListFailedQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FAILED_LIMIT)
        .clamp(1, MAX_FAILED_LIMIT);
    let jobs = state.store.list_failed(limit).await?;
    Ok(Json(jobs))
}

/// GET /api/queue/jobs/:id — Single-job lookup.
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;
    Ok(Json(job))
}

/// Response for a successful enqueue.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: Uuid,
}

/// Request body for POST /api/queue/email.
#[derive(Debug, Deserialize)]
pub struct EnqueueEmailRequest {
    #[serde(flatten)]
    pub payload: EmailPayload,
    pub priority: Option<JobPriority>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// POST /api/queue/email — Queue a templated email.
async fn enqueue_email(
    State(state): State<AppState>,
    Json(req): Json<EnqueueEmailRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    req.payload.validate()?;
    let job_id = state
        .producer
        .queue_email(req.payload, req.priority, req.scheduled_at)
        .await
        .ok_or_else(|| AppError::Internal("Failed to enqueue email job".to_string()))?;
    Ok(Json(EnqueueResponse { job_id }))
}

/// Request body for POST /api/queue/sms.
#[derive(Debug, Deserialize)]
pub struct EnqueueSmsRequest {
    #[serde(flatten)]
    pub payload: SmsPayload,
    pub priority: Option<JobPriority>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// POST /api/queue/sms — Queue an SMS.
async fn enqueue_sms(
    State(state): State<AppState>,
    Json(req): Json<EnqueueSmsRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    req.payload.validate()?;
    let job_id = state
        .producer
        .queue_sms(req.payload, req.priority, req.scheduled_at)
        .await
        .ok_or_else(|| AppError::Internal("Failed to enqueue sms job".to_string()))?;
    Ok(Json(EnqueueResponse { job_id }))
}

/// Request body for POST /api/queue/push.
#[derive(Debug, Deserialize)]
pub struct EnqueuePushRequest {
    #[serde(flatten)]
    pub payload: PushPayload,
    pub priority: Option<JobPriority>,
}

/// POST /api/queue/push — Queue a push notification (no deferred scheduling).
async fn enqueue_push(
    State(state): State<AppState>,
    Json(req): Json<EnqueuePushRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    req.payload.validate()?;
    let job_id = state
        .producer
        .queue_push(req.payload, req.priority)
        .await
        .ok_or_else(|| AppError::Internal("Failed to enqueue push job".to_string()))?;
    Ok(Json(EnqueueResponse { job_id }))
}

/// Request body for POST /api/queue/webhook.
#[derive(Debug, Deserialize)]
pub struct EnqueueWebhookRequest {
    #[serde(flatten)]
    pub payload: WebhookPayload,
    pub priority: Option<JobPriority>,
}

/// POST /api/queue/webhook — Queue an outbound webhook call.
async fn enqueue_webhook(
    State(state): State<AppState>,
    Json(req): Json<EnqueueWebhookRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    req.payload.validate()?;
    let job_id = state
        .producer
        .queue_webhook(req.payload, req.priority)
        .await
        .ok_or_else(|| AppError::Internal("Failed to enqueue webhook job".to_string()))?;
    Ok(Json(EnqueueResponse { job_id }))
}
