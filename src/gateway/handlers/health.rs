//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;

/// Health check response
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "gamevault")]
    pub service: &'static str,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp: u64,
}

/// Health check endpoint
///
/// Pings the store at most once per interval; within the interval the last
/// result is assumed to still hold.
///
/// - Healthy: 200 OK
/// - Store unreachable: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    // Rate limit: only ping the store once per interval
    static LAST_CHECK_MS: AtomicU64 = AtomicU64::new(0);
    const CHECK_INTERVAL_MS: u64 = 5000;

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let last_check = LAST_CHECK_MS.load(Ordering::Relaxed);
    let healthy = if now_ms.saturating_sub(last_check) > CHECK_INTERVAL_MS {
        LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
        match sqlx::query("SELECT 1")
            .execute(state.service.store().pool())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("[HEALTH] store ping failed: {}", e);
                false
            }
        }
    } else {
        true // Within interval, assume healthy
    };

    let (status_code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            service: state.service_name,
            timestamp: now_ms,
        }),
    )
}
