use super::health::health;
use super::readings::{get_sensor_readings, publish_reading};
use super::sensors::list_sensors;
use super::state::HttpServerState;
use super::{app_error, health as health_api, readings, sensors};
use crate::config::TiltedConfig;
use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, error, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Tilted", description = "Hydrometer readings API"),
        (name = "Health", description = "Service health"),
    ),
    paths(
        readings::publish_reading,
        readings::get_sensor_readings,
        sensors::list_sensors,
        health_api::health,
    ),
    components(schemas(app_error::ErrorResponse)),
)]
pub struct ApiDoc;

/// API routes without transport middleware, so tests can drive them in-process.
pub fn build_router(state: HttpServerState, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/api/readings",
            post(publish_reading).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/readings/{sensor_id}", get(get_sensor_readings))
        .route("/api/sensors", get(list_sensors))
        .route("/health", get(health))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        // Gateways and the web frontend may live on other origins
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_http_server(
    state: HttpServerState,
    address: SocketAddr,
    config: &TiltedConfig,
) -> Result<()> {
    let max_body_size = config.parse_http_body_limit()?;
    let timeout_seconds = config.http_server_timeout_seconds;

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    let mut app = build_router(state, max_body_size);
    if let Some(static_dir) = &config.static_dir {
        info!(static_dir = %static_dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(static_dir));
    }
    let app = app.layer(middleware);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
