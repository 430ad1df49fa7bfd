// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::api_repository::ApiRepository;
use crate::infrastructure::config::{load_api_config, load_charts_config};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_chart, get_distribution, get_stats, health_check, list_charts,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let api_config = load_api_config().context("Failed to load config/api")?;
    let charts_config = load_charts_config().context("Failed to load config/charts")?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(ApiRepository::new(
        api_config.api.base_url,
        Duration::from_secs(api_config.api.timeout_secs),
    )?);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(repository, charts_config)?;

    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/charts", get(list_charts))
        .route("/charts/:id", get(get_chart))
        .route("/distributions/:id", get(get_distribution))
        .route("/stats/:id", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = api_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", api_config.server.bind_addr))?;
    tracing::info!("Starting metrics-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
