//! Job table persistence.
//!
//! Every SQL statement touching the `jobs` table lives here. State
//! transitions are row-scoped conditional updates keyed by job id: the claim
//! flips `pending`/`retrying` rows to `processing` atomically (`FOR UPDATE
//! SKIP LOCKED`, so concurrent pollers can never claim the same row), and
//! every later transition carries an `AND status = 'processing'` guard so a
//! terminal row can never be mutated again.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use braidery_common::error::AppError;
use braidery_common::types::{Job, JobPriority, JobType, QueueStats};

/// Row values for a job being created.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_type: JobType,
    pub priority: JobPriority,
    pub payload: serde_json::Value,
    pub max_attempts: i32,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Data-access layer for the `jobs` table.
#[derive(Clone)]
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new job as `pending` with zero attempts.
    pub async fn insert(&self, new: NewJob) -> Result<Job, AppError> {
        let job: Job = sqlx::query_as(
            r#"
            INSERT INTO jobs (id, job_type, priority, status, payload, attempts, max_attempts, scheduled_at)
            VALUES ($1, $2, $3, 'pending', $4, 0, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.job_type)
        .bind(new.priority)
        .bind(&new.payload)
        .bind(new.max_attempts)
        .bind(new.scheduled_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    /// Atomically claim up to `limit` due jobs, transitioning them to
    /// `processing`.
    ///
    /// A job is due when its status is `pending` or `retrying` and its
    /// `scheduled_at` is unset or in the past. Claims are ordered by
    /// priority descending, then oldest-first within a tier. `processed_at`
    /// is stamped on the first claim only.
    pub async fn claim_due(&self, limit: i64) -> Result<Vec<Job>, AppError> {
        let jobs: Vec<Job> = sqlx::query_as(
            r#"
            WITH due AS (
                SELECT id FROM jobs
                WHERE status IN ('pending', 'retrying')
                  AND (scheduled_at IS NULL OR scheduled_at <= now())
                ORDER BY priority DESC, created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            ),
            claimed AS (
                UPDATE jobs
                SET status = 'processing',
                    processed_at = COALESCE(processed_at, now()),
                    updated_at = now()
                FROM due
                WHERE jobs.id = due.id
                RETURNING jobs.*
            )
            SELECT * FROM claimed
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    /// Record a successful delivery. Terminal.
    pub async fn mark_completed(&self, job_id: Uuid, attempts: i32) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', attempts = $2, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(attempts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a failed attempt with retry budget remaining: the job goes
    /// back into the claim set once `retry_at` passes.
    pub async fn mark_retrying(
        &self,
        job_id: Uuid,
        attempts: i32,
        error_message: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'retrying',
                attempts = $2,
                error_message = $3,
                scheduled_at = $4,
                updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(attempts)
        .bind(error_message)
        .bind(retry_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Dead-letter a job that exhausted its attempt budget. Terminal.
    pub async fn mark_failed(
        &self,
        job_id: Uuid,
        attempts: i32,
        error_message: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                attempts = $2,
                error_message = $3,
                failed_at = now(),
                updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(attempts)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Return a claimed job to the queue without counting an attempt.
    /// Used when the dispatcher cannot execute a job it just claimed.
    pub async fn release(&self, job_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete terminal jobs whose last mutation is older than the retention
    /// window. Returns the number of rows purged.
    pub async fn purge_expired(&self, retention_days: u32) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE status IN ('completed', 'failed')
              AND updated_at < now() - ($1::int * interval '1 day')
            "#,
        )
        .bind(retention_days as i32)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetch a single job by id.
    pub async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let job: Option<Job> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    /// List dead-lettered jobs, most recent failures first.
    pub async fn list_failed(&self, limit: i64) -> Result<Vec<Job>, AppError> {
        let jobs: Vec<Job> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE status = 'failed'
            ORDER BY failed_at DESC NULLS LAST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    /// Aggregate snapshot: total job count plus counts grouped by status and
    /// by type.
    pub async fn stats(&self) -> Result<QueueStats, AppError> {
        let mut stats = QueueStats::default();

        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        for (status, count) in by_status {
            stats.total += count;
            stats.by_status.insert(status, count);
        }

        let by_type: Vec<(String, i64)> =
            sqlx::query_as("SELECT job_type, COUNT(*) FROM jobs GROUP BY job_type")
                .fetch_all(&self.pool)
                .await?;
        for (job_type, count) in by_type {
            stats.by_type.insert(job_type, count);
        }

        Ok(stats)
    }
}
