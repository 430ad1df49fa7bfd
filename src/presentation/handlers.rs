// HTTP request handlers
use crate::application::dashboard_service::ChartQuery;
use crate::domain::range::RangeSelection;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{
    chart_to_json, distribution_to_json, stats_to_json, summary_to_json,
};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ChartParams {
    pub range: Option<String>,
    pub multiplier: Option<f64>,
}

#[derive(Deserialize)]
pub struct DistributionParams {
    #[serde(default)]
    pub compact: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List configured charts
pub async fn list_charts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let charts: Vec<_> = state
        .dashboard_service
        .list_charts()
        .into_iter()
        .map(summary_to_json)
        .collect();

    into_response(json_response(&charts, accepts_brotli(&headers)).await)
}

/// Time series for one chart, e.g. `/charts/capital_staked?range=30D&multiplier=3120.5`
pub async fn get_chart(
    Path(id): Path<String>,
    Query(params): Query<ChartParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let range = match params.range.as_deref().map(str::parse::<RangeSelection>) {
        Some(Ok(range)) => Some(range),
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        None => None,
    };
    let query = ChartQuery {
        range,
        unit_multiplier: params.multiplier,
    };

    match state
        .dashboard_service
        .get_chart(&id, query, chrono::Utc::now())
        .await
    {
        Ok(Some(chart)) => {
            into_response(json_response(&chart_to_json(chart), accepts_brotli(&headers)).await)
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error building chart {}: {:#}", id, e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Bucketed distribution for one chart, `?compact=true` for narrow displays
pub async fn get_distribution(
    Path(id): Path<String>,
    Query(params): Query<DistributionParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state
        .dashboard_service
        .get_distribution(&id, params.compact)
        .await
    {
        Ok(Some(distribution)) => into_response(
            json_response(&distribution_to_json(distribution), accepts_brotli(&headers)).await,
        ),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error building distribution {}: {:#}", id, e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Headline figures for one stat group, e.g. `/stats/code_metrics`
pub async fn get_stats(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboard_service.get_stats(&id).await {
        Ok(Some(stats)) => {
            into_response(json_response(&stats_to_json(stats), accepts_brotli(&headers)).await)
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error building stats {}: {:#}", id, e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
