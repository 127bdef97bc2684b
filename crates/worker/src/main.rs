use braidery_common::config::AppConfig;
use braidery_common::db;
use braidery_dispatch::poller::Dispatcher;
use braidery_dispatch::senders::SenderRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "braidery_worker=info,braidery_dispatch=info".into()),
        )
        .json()
        .init();

    tracing::info!("Braidery dispatch worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Wire channel senders and start the dispatch loop
    let senders = SenderRegistry::from_config(&config)?;
    let dispatcher = Dispatcher::new(
        pool,
        senders,
        config.queue_poll_interval_secs,
        config.queue_max_in_flight,
        config.queue_retention_days,
    );

    dispatcher.start().await;

    // Run until Ctrl+C, then stop claiming; in-flight jobs finish on their own
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping gracefully...");
    dispatcher.stop().await;

    tracing::info!("Braidery dispatch worker stopped.");
    Ok(())
}
