use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Poll cadence for the dispatch loop in seconds (default: 5)
    pub queue_poll_interval_secs: u64,

    /// Maximum number of jobs executing concurrently (default: 5)
    pub queue_max_in_flight: usize,

    /// Days to retain completed/failed jobs before purging (default: 7)
    pub queue_retention_days: u32,

    /// Transactional mail provider endpoint
    pub email_api_url: String,

    /// Transactional mail provider API key
    pub email_api_key: Option<String>,

    /// Sender address for outbound email
    pub email_from: Option<String>,

    /// SMS gateway endpoint
    pub sms_gateway_url: Option<String>,

    /// SMS gateway API key
    pub sms_api_key: Option<String>,

    /// Push notification gateway endpoint
    pub push_gateway_url: Option<String>,

    /// Push notification gateway API key
    pub push_api_key: Option<String>,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            queue_poll_interval_secs: std::env::var("QUEUE_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUEUE_POLL_INTERVAL_SECS must be a valid u64"))?,
            queue_max_in_flight: std::env::var("QUEUE_MAX_IN_FLIGHT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUEUE_MAX_IN_FLIGHT must be a valid usize"))?,
            queue_retention_days: std::env::var("QUEUE_RETENTION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUEUE_RETENTION_DAYS must be a valid u32"))?,
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_api_key: std::env::var("EMAIL_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM").ok(),
            sms_gateway_url: std::env::var("SMS_GATEWAY_URL").ok(),
            sms_api_key: std::env::var("SMS_API_KEY").ok(),
            push_gateway_url: std::env::var("PUSH_GATEWAY_URL").ok(),
            push_api_key: std::env::var("PUSH_API_KEY").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }
}
