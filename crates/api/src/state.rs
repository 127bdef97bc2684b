//! Shared application state for the Axum API server.

use sqlx::PgPool;

use braidery_common::config::AppConfig;
use braidery_dispatch::producer::JobProducer;
use braidery_dispatch::store::JobStore;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: JobStore,
    pub producer: JobProducer,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let store = JobStore::new(pool.clone());
        let producer = JobProducer::new(pool.clone());
        Self {
            pool,
            store,
            producer,
            config,
        }
    }
}
