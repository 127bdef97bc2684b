use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Delivery channel a job is dispatched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Email,
    Sms,
    Push,
    Webhook,
    System,
}

impl JobType {
    /// Per-type retry ceiling applied when a job is created.
    ///
    /// Webhooks are the least reliable channel and get the most attempts;
    /// SMS and push providers surface permanent failures quickly, so they
    /// get the fewest.
    pub fn default_max_attempts(self) -> i32 {
        match self {
            JobType::Email => 3,
            JobType::Sms => 2,
            JobType::Push => 2,
            JobType::Webhook => 5,
            JobType::System => 1,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Email => write!(f, "email"),
            JobType::Sms => write!(f, "sms"),
            JobType::Push => write!(f, "push"),
            JobType::Webhook => write!(f, "webhook"),
            JobType::System => write!(f, "system"),
        }
    }
}

/// Advisory ordering hint; higher priorities are claimed first.
///
/// Stored as SMALLINT so the claim query can sort on it directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Urgent = 3,
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::Normal
    }
}

impl std::fmt::Display for JobPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPriority::Low => write!(f, "low"),
            JobPriority::Normal => write!(f, "normal"),
            JobPriority::High => write!(f, "high"),
            JobPriority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Job lifecycle state.
///
/// `completed` and `failed` are terminal. A `retrying` job becomes eligible
/// for claiming again once its backoff window elapses; the claim query treats
/// it exactly like `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Retrying => write!(f, "retrying"),
        }
    }
}

/// A persisted unit of deferred work.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub max_attempts: i32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for an email job: template-based delivery through the
/// transactional mail provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    /// Recipient addresses
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Provider-side template identifier
    pub template: String,
    /// Variables substituted into the template
    #[serde(default)]
    pub variables: serde_json::Value,
}

impl EmailPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.to.is_empty() {
            return Err(AppError::Validation(
                "email job requires at least one recipient".to_string(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::Validation(
                "email job requires a subject".to_string(),
            ));
        }
        if self.template.trim().is_empty() {
            return Err(AppError::Validation(
                "email job requires a template identifier".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for an SMS job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsPayload {
    /// Destination phone numbers (E.164)
    pub to: Vec<String>,
    /// Message body
    pub message: String,
}

impl SmsPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.to.is_empty() {
            return Err(AppError::Validation(
                "sms job requires at least one phone target".to_string(),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::Validation(
                "sms job requires a non-empty message".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for a push notification job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    /// Target user IDs; the push gateway resolves device tokens
    pub user_ids: Vec<Uuid>,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
}

impl PushPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.user_ids.is_empty() {
            return Err(AppError::Validation(
                "push job requires at least one user target".to_string(),
            ));
        }
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(AppError::Validation(
                "push job requires a non-empty title and body".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for a webhook job: an arbitrary HTTP request to a partner endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Target URL
    pub url: String,
    /// HTTP method (GET, POST, ...)
    pub method: String,
    /// Extra request headers
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// JSON request body
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Per-request timeout in seconds (default 30)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WebhookPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.url.trim().is_empty() {
            return Err(AppError::Validation(
                "webhook job requires a target URL".to_string(),
            ));
        }
        if self.method.trim().is_empty() {
            return Err(AppError::Validation(
                "webhook job requires an HTTP method".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregate queue snapshot for operational visibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    /// Total job count
    pub total: i64,
    /// Count grouped by status
    pub by_status: BTreeMap<String, i64>,
    /// Count grouped by job type
    pub by_type: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_attempts_per_type() {
        assert_eq!(JobType::Email.default_max_attempts(), 3);
        assert_eq!(JobType::Sms.default_max_attempts(), 2);
        assert_eq!(JobType::Push.default_max_attempts(), 2);
        assert_eq!(JobType::Webhook.default_max_attempts(), 5);
        assert_eq!(JobType::System.default_max_attempts(), 1);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(JobPriority::Urgent > JobPriority::High);
        assert!(JobPriority::High > JobPriority::Normal);
        assert!(JobPriority::Normal > JobPriority::Low);
        assert_eq!(JobPriority::default(), JobPriority::Normal);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Retrying.is_terminal());
    }

    #[test]
    fn test_email_payload_requires_recipient() {
        let payload = EmailPayload {
            to: vec![],
            subject: "Your appointment is confirmed".to_string(),
            template: "booking_confirmed".to_string(),
            variables: serde_json::json!({}),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_email_payload_requires_subject_and_template() {
        let mut payload = EmailPayload {
            to: vec!["client@example.com".to_string()],
            subject: "  ".to_string(),
            template: "booking_confirmed".to_string(),
            variables: serde_json::json!({}),
        };
        assert!(payload.validate().is_err());

        payload.subject = "Your appointment is confirmed".to_string();
        payload.template = String::new();
        assert!(payload.validate().is_err());

        payload.template = "booking_confirmed".to_string();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_sms_payload_validation() {
        let payload = SmsPayload {
            to: vec!["+15555550123".to_string()],
            message: "Reminder: braiding appointment tomorrow at 10am".to_string(),
        };
        assert!(payload.validate().is_ok());

        let empty_body = SmsPayload {
            to: vec!["+15555550123".to_string()],
            message: String::new(),
        };
        assert!(empty_body.validate().is_err());
    }

    #[test]
    fn test_push_payload_validation() {
        let payload = PushPayload {
            user_ids: vec![Uuid::new_v4()],
            title: "New booking request".to_string(),
            body: "Amara requested knotless braids on Friday".to_string(),
        };
        assert!(payload.validate().is_ok());

        let no_targets = PushPayload {
            user_ids: vec![],
            title: "New booking request".to_string(),
            body: "body".to_string(),
        };
        assert!(no_targets.validate().is_err());
    }

    #[test]
    fn test_webhook_payload_validation() {
        let payload = WebhookPayload {
            url: "https://partner.example.com/hooks/orders".to_string(),
            method: "POST".to_string(),
            headers: None,
            body: Some(serde_json::json!({"order_id": "123"})),
            timeout_secs: None,
        };
        assert!(payload.validate().is_ok());

        let no_url = WebhookPayload {
            url: String::new(),
            method: "POST".to_string(),
            headers: None,
            body: None,
            timeout_secs: None,
        };
        assert!(no_url.validate().is_err());
    }

    #[test]
    fn test_status_roundtrips_through_display() {
        for (status, text) in [
            (JobStatus::Pending, "pending"),
            (JobStatus::Processing, "processing"),
            (JobStatus::Completed, "completed"),
            (JobStatus::Failed, "failed"),
            (JobStatus::Retrying, "retrying"),
        ] {
            assert_eq!(status.to_string(), text);
        }
    }
}
