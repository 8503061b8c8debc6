//! `GET /api/health`. A DB ping plus an object-store probe; any subsystem
//! failing makes the whole response `degraded` and the status code 503,
//! never a partial 200.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::DataStatus;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct SubsystemStatus {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthReport {
    pub status: &'static str,
    pub db: SubsystemStatus,
    pub store: SubsystemStatus,
    #[serde(rename = "uptimeSecs")]
    pub uptime_secs: u64,
}

#[utoipa::path(get, path = "/api/health", tag = "health", responses((status = 200, body = HealthReport), (status = 503, body = HealthReport)))]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => SubsystemStatus { ok: true, error: None },
        Err(e) => SubsystemStatus {
            ok: false,
            error: Some(e.to_string()),
        },
    };
    let store = match state.store.probe().await {
        Ok(()) => SubsystemStatus { ok: true, error: None },
        Err(e) => SubsystemStatus {
            ok: false,
            error: Some(e.to_string()),
        },
    };

    let healthy = db.ok && store.ok;
    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        db,
        store,
        uptime_secs: state.started_at.elapsed().as_secs(),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    DataStatus(status, report)
}
