use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::bootstrap::app_context::AppContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the process started.
    pub uptime: f64,
    pub environment: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    security(()),
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResp> {
    let db_ok = match ctx.health_probe().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = ?e, "health_probe_failed");
            false
        }
    };
    let status = if db_ok { "ok" } else { "degraded" };
    Json(HealthResp {
        status,
        timestamp: Utc::now(),
        uptime: ctx.uptime_secs(),
        environment: ctx.cfg.environment.as_str(),
    })
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/health", get(health)).with_state(ctx)
}
