//! Dispatch loop.
//!
//! A timer-driven poller that claims due jobs on a fixed cadence and executes
//! them concurrently under a bounded ceiling:
//! 1. Compute headroom from the semaphore; at capacity the whole tick is
//!    skipped (back-pressure — no new work is claimed)
//! 2. Atomically claim up to `headroom` due jobs (`pending`/`retrying` with
//!    an elapsed `scheduled_at`), flipping them to `processing`
//! 3. Spawn each claimed job on its own task holding an owned semaphore
//!    permit; the tick does not wait for completions
//! 4. Run the retention purge opportunistically
//!
//! The ceiling is enforced by the permits themselves: a permit travels into
//! the job task and is released when the task settles, success or failure,
//! so the in-flight count cannot leak.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;

use braidery_common::types::{Job, QueueStats};

use crate::backoff;
use crate::senders::SenderRegistry;
use crate::store::JobStore;

/// The dispatch queue's polling scheduler.
///
/// Cheap to clone; all state is shared. Construct one per process and hand
/// clones to whatever needs lifecycle control or introspection.
#[derive(Clone)]
pub struct Dispatcher {
    store: JobStore,
    senders: Arc<SenderRegistry>,
    limits: Arc<Semaphore>,
    poll_interval: Duration,
    retention_days: u32,
    shutdown: Arc<watch::Sender<bool>>,
    running: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl Dispatcher {
    pub fn new(
        pool: PgPool,
        senders: SenderRegistry,
        poll_interval_secs: u64,
        max_in_flight: usize,
        retention_days: u32,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store: JobStore::new(pool),
            senders: Arc::new(senders),
            limits: Arc::new(Semaphore::new(max_in_flight)),
            poll_interval: Duration::from_secs(poll_interval_secs),
            retention_days,
            shutdown: Arc::new(shutdown),
            running: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Start the poll timer. No-op if the loop is already running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if let Some(handle) = running.as_ref()
            && !handle.is_finished()
        {
            tracing::debug!("Dispatch loop already running");
            return;
        }

        let _ = self.shutdown.send(false);
        let mut shutdown_rx = self.shutdown.subscribe();
        let dispatcher = self.clone();

        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            max_in_flight = self.limits.available_permits(),
            retention_days = self.retention_days,
            "Dispatch loop started"
        );

        *running = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(dispatcher.poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => dispatcher.tick().await,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("Dispatch loop stopped");
        }));
    }

    /// Stop the poll timer. Jobs already dispatched run to completion; only
    /// future claims are halted. No-op if the loop is not running.
    pub async fn stop(&self) {
        let handle = self.running.lock().await.take();
        if let Some(handle) = handle {
            let _ = self.shutdown.send(true);
            let _ = handle.await;
        }
    }

    /// Run one poll tick: claim due work up to the concurrency headroom,
    /// dispatch it, then purge expired terminal jobs.
    ///
    /// Public so tests (and operational tooling) can drive the queue without
    /// the timer.
    pub async fn tick(&self) {
        let headroom = self.limits.available_permits();
        if headroom == 0 {
            tracing::debug!("Dispatch at capacity, skipping tick");
            return;
        }

        let claimed = match self.store.claim_due(headroom as i64).await {
            Ok(jobs) => jobs,
            Err(e) => {
                // A bad tick is not fatal; the timer keeps firing.
                tracing::error!(error = %e, "Claim query failed");
                return;
            }
        };

        if !claimed.is_empty() {
            tracing::debug!(claimed = claimed.len(), headroom, "Claimed due jobs");
        }
        for job in claimed {
            self.spawn_job(job);
        }

        match self.store.purge_expired(self.retention_days).await {
            Ok(purged) if purged > 0 => {
                tracing::info!(purged, "Purged expired terminal jobs");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Retention cleanup failed");
            }
        }
    }

    /// Aggregate queue snapshot. Read-only; returns `None` (after logging)
    /// instead of propagating a query failure.
    pub async fn stats(&self) -> Option<QueueStats> {
        match self.store.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read queue stats");
                None
            }
        }
    }

    fn spawn_job(&self, job: Job) {
        let permit = match self.limits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            // Another clone ticked concurrently and took the permits this
            // claim was sized for; the job goes back to the queue.
            Err(_) => {
                let store = self.store.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.release(job.id).await {
                        tracing::error!(job_id = %job.id, error = %e, "Failed to release job");
                    }
                });
                return;
            }
        };

        let store = self.store.clone();
        let senders = self.senders.clone();
        tokio::spawn(async move {
            let _permit = permit;
            execute(&store, &senders, &job).await;
        });
    }
}

/// Run one dispatch attempt for a claimed job and record the outcome.
///
/// Persistence failures while recording the outcome are logged and swallowed;
/// the job stays `processing`, invisible to the claim query, until an operator
/// intervenes.
async fn execute(store: &JobStore, senders: &SenderRegistry, job: &Job) {
    let attempts = job.attempts + 1;

    match senders.deliver(job).await {
        Ok(()) => {
            tracing::info!(
                job_id = %job.id,
                job_type = %job.job_type,
                attempts,
                "Job delivered"
            );
            if let Err(e) = store.mark_completed(job.id, attempts).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record completion");
            }
        }
        Err(delivery_error) => {
            let reason = delivery_error.to_string();
            if attempts >= job.max_attempts {
                tracing::error!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    attempts,
                    max_attempts = job.max_attempts,
                    error = %reason,
                    "Job dead-lettered"
                );
                if let Err(e) = store.mark_failed(job.id, attempts, &reason).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to record dead-letter");
                }
            } else {
                let retry_at = Utc::now() + backoff::retry_delay(attempts);
                tracing::warn!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    attempts,
                    retry_at = %retry_at,
                    error = %reason,
                    "Job failed, retry scheduled"
                );
                if let Err(e) = store.mark_retrying(job.id, attempts, &reason, retry_at).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to record retry");
                }
            }
        }
    }
}
