//! Inventory & Billing Platform - Backend
//!
//! HTTP API for suppliers, items, stock locations, stock transfers and
//! supplier/customer bills, with a representative to admin order workflow.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter; `IB_LOG_FORMAT=json` switches to
/// JSON lines.
pub fn init_tracing() {
    let json = std::env::var("IB_LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ib_server=debug,inventory_billing_backend=debug,tower_http=info,sqlx=warn".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> anyhow::Result<Router> {
    let origin = if state.config.cors.allowed_origin == "*" {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::exact(HeaderValue::from_str(&state.config.cors.allowed_origin)?)
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let user_agent = request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                user_agent = %user_agent,
            )
        })
        .on_request(|_request: &Request<Body>, _span: &Span| {
            tracing::debug!("request started");
        })
        .on_response(|response: &Response, latency: Duration, _span: &Span| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                "request completed"
            );
        })
        .on_failure(
            |failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                tracing::error!(
                    %failure,
                    latency_ms = latency.as_millis() as u64,
                    "request failed"
                );
            },
        );

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(trace)
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory & Billing API v1"
}
