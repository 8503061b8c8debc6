use std::net::IpAddr;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;

/// Sliding-window bucket for a single (ip, route-class) pair. Counters are
/// atomic so readers never block each other; the dashmap in `AppState`
/// gives per-key isolation instead of one shared mutex.
pub struct RateLimitBuckets {
    window_started_at_ms: AtomicI64,
    count: AtomicU32,
}

impl RateLimitBuckets {
    fn new(now_ms: i64) -> Self {
        Self {
            window_started_at_ms: AtomicI64::new(now_ms),
            count: AtomicU32::new(0),
        }
    }

    /// Returns `Err(retry_after_secs)` once the window's budget is spent.
    fn try_acquire(&self, now_ms: i64, window_ms: i64, max: u32) -> Result<(), u64> {
        let started = self.window_started_at_ms.load(Ordering::Relaxed);
        if now_ms - started >= window_ms {
            self.window_started_at_ms.store(now_ms, Ordering::Relaxed);
            self.count.store(1, Ordering::Relaxed);
            return Ok(());
        }
        let prior = self.count.fetch_add(1, Ordering::Relaxed);
        if prior < max {
            Ok(())
        } else {
            let retry_after_ms = window_ms - (now_ms - started);
            Err((retry_after_ms.max(0) as u64).div_ceil(1000))
        }
    }
}

fn route_class(path: &str) -> &'static str {
    if path.starts_with("/api/auth/") {
        "auth"
    } else {
        "default"
    }
}

/// Per-IP sliding window: 100 req/min by default, 5 req/min on auth routes.
pub async fn layer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip: IpAddr = addr.ip();
    let class = route_class(request.uri().path());
    let key = format!("{ip}:{class}");

    let (window_secs, max) = if class == "auth" {
        (60, 5)
    } else {
        (
            state.config.rate_limit_window_secs,
            state.config.rate_limit_max,
        )
    };

    let now_ms = crate::db::models::now_ms();
    let bucket = state
        .rate_limits
        .entry(key)
        .or_insert_with(|| RateLimitBuckets::new(now_ms));

    match bucket.try_acquire(now_ms, window_secs as i64 * 1000, max) {
        Ok(()) => Ok(next.run(request).await),
        Err(retry_after_secs) => Err(AppError::RateLimited { retry_after_secs }),
    }
}
