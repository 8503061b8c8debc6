use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::config::Config;
use crate::db::{DbBackend, DbPool};
use crate::http::rate_limit::RateLimitBuckets;
use crate::storage::ObjectStoreHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbPool,
    pub db_backend: DbBackend,
    pub store: ObjectStoreHandle,
    pub rate_limits: Arc<DashMap<String, RateLimitBuckets>>,
    pub started_at: Instant,
    pub csrf_secret: Arc<Vec<u8>>,
    pub session_secret: Arc<Vec<u8>>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, db_backend: DbBackend, store: ObjectStoreHandle) -> Self {
        let csrf_secret = config.csrf_secret.as_bytes().to_vec();
        let session_secret = config.session_secret.as_bytes().to_vec();
        Self {
            config: Arc::new(config),
            db,
            db_backend,
            store,
            rate_limits: Arc::new(DashMap::new()),
            started_at: Instant::now(),
            csrf_secret: Arc::new(csrf_secret),
            session_secret: Arc::new(session_secret),
        }
    }
}
