pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::middleware::{RateLimiter, rate_limit_middleware};
use crate::wallet::WalletService;

use openapi::ApiDoc;
use state::AppState;

/// Start the HTTP gateway
pub async fn run_server(config: &AppConfig, service: WalletService) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(service));

    let limiter = RateLimiter::new(&config.rate_limit);

    // Periodic cleanup of stale rate-limit windows
    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    // ==========================================================================
    // Wallet routes
    // ==========================================================================
    let wallet_routes = Router::new()
        .route("/topup", post(handlers::top_up))
        .route("/bonus", post(handlers::bonus))
        .route("/spend", post(handlers::spend))
        .route("/{user_id}/balance/{asset_code}", get(handlers::get_balance))
        .route("/{user_id}/history/{asset_code}", get(handlers::get_history))
        .route("/{user_id}/verify/{asset_code}", get(handlers::verify_ledger));

    // ==========================================================================
    // Admin routes
    // ==========================================================================
    let admin_routes = Router::new()
        .route(
            "/asset-types",
            get(handlers::list_asset_types).post(handlers::create_asset_type),
        )
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/transactions", get(handlers::list_transactions))
        .route("/system-balances", get(handlers::system_balances));

    let api_routes = Router::new()
        .nest("/wallets", wallet_routes)
        .nest("/admin", admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("OpenAPI document: http://{}/api-docs/openapi.json", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
