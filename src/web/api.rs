use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use super::AppState;
use crate::analytics::intervals::summarize as summarize_intervals;
use crate::analytics::streaks::summarize as summarize_streaks;
use crate::analytics::{
    calculate_metrics, hit_intervals, hits_per_window, record_streaks, streak_histogram, GroupBy,
};
use crate::dashboard::{build_page, PageKind, PageRequest};
use crate::dataset::{to_csv_bytes, RecordFilter, EXPORT_FILE_NAME};
use crate::error::{DashboardError, Result};
use crate::types::{DayOfWeek, HitColumn};

/// Query string shared by every data route. Values stay raw so bad input maps to our own 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub pair: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub day: Option<String>,
    pub column: Option<String>,
    pub group_by: Option<String>,
    pub minutes: Option<String>,
}

impl DashboardQuery {
    pub fn filter(&self) -> Result<RecordFilter> {
        RecordFilter::from_params(
            self.pair.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            self.day.as_deref(),
        )
    }

    pub fn column(&self) -> Result<HitColumn> {
        match non_empty(&self.column) {
            None => Ok(HitColumn::default()),
            Some(raw) => HitColumn::from_str(raw)
                .ok_or_else(|| DashboardError::InvalidParameter(format!("unknown column '{}'", raw))),
        }
    }

    pub fn group_by(&self) -> Result<Vec<GroupBy>> {
        GroupBy::parse_list(non_empty(&self.group_by).unwrap_or("hour"))
    }

    pub fn window(&self, default: i64) -> Result<Duration> {
        let minutes = match non_empty(&self.minutes) {
            None => default,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| DashboardError::InvalidParameter(format!("minutes '{}' is not a number", raw)))?,
        };
        if minutes <= 0 {
            return Err(DashboardError::InvalidParameter("minutes must be > 0".to_string()));
        }
        Duration::try_minutes(minutes).ok_or_else(|| {
            DashboardError::InvalidParameter(format!("minutes {} is out of range", minutes))
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn bad_request(e: DashboardError) -> Response {
    debug!("Rejected request: {}", e);
    (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response()
}

fn respond(result: Result<serde_json::Value>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => bad_request(e),
    }
}

// === Dataset Endpoints ===

pub async fn get_options(State(state): State<AppState>) -> impl IntoResponse {
    let range = state.dataset.time_range();
    Json(json!({
        "pairs": state.dataset.pairs(),
        "days": state.dataset.days(),
        "all_days": DayOfWeek::all(),
        "start": range.map(|(start, _)| start),
        "end": range.map(|(_, end)| end),
        "columns": HitColumn::all(),
        "pages": PageKind::all(),
        "records": state.dataset.len(),
    }))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let Some(kind) = PageKind::from_slug(&slug) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("unknown page '{}'", slug)})),
        )
            .into_response();
    };

    let request = match page_request(&query) {
        Ok(request) => request,
        Err(e) => return bad_request(e),
    };

    match build_page(kind, &state.dataset, &request, &state.analysis) {
        Ok(page) => Json(page).into_response(),
        Err(e) => bad_request(e),
    }
}

fn page_request(query: &DashboardQuery) -> Result<PageRequest> {
    Ok(PageRequest {
        filter: query.filter()?,
        column: query.column()?,
    })
}

// === Analytics Endpoints ===

pub async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    respond(metrics_payload(&state, &query))
}

fn metrics_payload(state: &AppState, query: &DashboardQuery) -> Result<serde_json::Value> {
    let filter = query.filter()?;
    let group_by = query.group_by()?;
    let view = state.dataset.filter(&filter);
    let metrics = calculate_metrics(&view, &group_by);
    Ok(json!({
        "group_by": group_by,
        "records": view.len(),
        "metrics": metrics,
    }))
}

pub async fn get_streaks(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    respond(streaks_payload(&state, &query))
}

fn streaks_payload(state: &AppState, query: &DashboardQuery) -> Result<serde_json::Value> {
    let filter = query.filter()?;
    let column = query.column()?;
    let view = state.dataset.filter(&filter);
    let runs = record_streaks(&view, column);
    Ok(json!({
        "column": column,
        "summary": summarize_streaks(&runs),
        "histogram": streak_histogram(&runs),
        "streaks": runs,
    }))
}

pub async fn get_intervals(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    respond(intervals_payload(&state, &query))
}

fn intervals_payload(state: &AppState, query: &DashboardQuery) -> Result<serde_json::Value> {
    let filter = query.filter()?;
    let column = query.column()?;
    let view = state.dataset.filter(&filter);
    let policy = state.analysis.interval_policy();
    let intervals = hit_intervals(&view, column, &policy);
    Ok(json!({
        "column": column,
        "policy": policy,
        "summary": summarize_intervals(&intervals),
        "intervals": intervals,
    }))
}

pub async fn get_windows(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    respond(windows_payload(&state, &query))
}

fn windows_payload(state: &AppState, query: &DashboardQuery) -> Result<serde_json::Value> {
    let filter = query.filter()?;
    let column = query.column()?;
    let window = query.window(state.analysis.window_minutes)?;
    let view = state.dataset.filter(&filter);
    let windows = hits_per_window(&view, column, window)?;
    Ok(json!({
        "column": column,
        "minutes": window.num_minutes(),
        "windows": windows,
    }))
}

// === Export ===

pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let filter = match query.filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(e),
    };

    let view = state.dataset.filter(&filter);
    match to_csv_bytes(&view) {
        Ok(body) => {
            info!("Exporting {} filtered rows", view.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!("CSV export failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

// === Health Check ===

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records: state.dataset.len(),
    })
}
