//! Caja API
//!
//! Document numbering and subscription gating over REST.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/tenants/{tenant_id}/sequences/{document_type}/next` - Issue next document number
//! - `GET /api/v1/tenants/{tenant_id}/sequences/{document_type}` - Last issued number
//! - `GET /api/v1/subscription/status?user_id=` - Evaluate access for a user
//! - `POST /api/v1/subscription/checkout` - Start a checkout (pending subscription)
//! - `POST /api/v1/subscriptions/{id}/confirm` - Manual payment confirmation (when enabled)
//! - `POST /api/v1/coupons/redeem` - Redeem a coupon
//! - `POST /webhooks/payment` - Signed payment processor webhook
//!
//! ## Back-office Endpoints (bearer `ADMIN_TOKEN`)
//!
//! - `POST /api/v1/admin/coupons` - Issue a coupon
//! - `GET /api/v1/admin/coupons` - List coupons
//! - `GET /api/v1/admin/users/{user_id}/audit` - Audit trail of a user
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use caja_db::Repositories;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("caja_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Caja API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = caja_db::create_pool_with_options(&config.database_url, &config.database).await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool created"
    );

    if config.run_migrations {
        caja_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Create application state
    let repos = Repositories::new(pool.clone());
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(repos, pool, config);

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    run_http_server(app, http_addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Document numbering
        .route(
            "/tenants/{tenant_id}/sequences/{document_type}/next",
            post(handlers::next_document_number),
        )
        .route(
            "/tenants/{tenant_id}/sequences/{document_type}",
            get(handlers::current_document_number),
        )
        // Subscription gate
        .route("/subscription/status", get(handlers::subscription_status))
        .route("/subscription/checkout", post(handlers::start_checkout))
        .route("/subscriptions/{id}/confirm", post(handlers::confirm_payment))
        .route("/coupons/redeem", post(handlers::redeem_coupon))
        // Back-office
        .route(
            "/admin/coupons",
            post(handlers::create_coupon).get(handlers::list_coupons),
        )
        .route("/admin/users/{user_id}/audit", get(handlers::user_audit_log));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes =
        Router::new().route("/webhooks/payment", post(handlers::payment_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Numbering and gating sit on every sale and page load; SLO is p99 < 100ms
    let latency_buckets = &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("caja_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "caja_documents_issued_total",
        "Document numbers issued by document type"
    );
    metrics::describe_counter!(
        "caja_subscription_transitions_total",
        "Automatic subscription transitions by target status"
    );
    metrics::describe_counter!(
        "caja_subscription_evaluation_errors_total",
        "Evaluations that failed and denied access"
    );
    metrics::describe_counter!(
        "caja_payments_confirmed_total",
        "Subscriptions activated by payment confirmation"
    );
    metrics::describe_counter!(
        "caja_coupons_redeemed_total",
        "Coupons redeemed by plan"
    );
    metrics::describe_counter!(
        "caja_webhooks_processed_total",
        "Payment webhooks processed by outcome"
    );
    metrics::describe_histogram!(
        "caja_operation_duration_seconds",
        "Operation latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
