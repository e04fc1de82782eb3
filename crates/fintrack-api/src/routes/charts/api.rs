//! Chart API endpoints - JSON API

use axum::extract::{Path, State};
use axum::Json;
use fintrack_core::{build_report, ChartKind, Report};
use serde::Serialize;

use super::chart_kind;
use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct ChartEntry {
    pub slug: String,
    pub title: String,
}

pub async fn api_charts_list() -> Json<Vec<ChartEntry>> {
    Json(
        ChartKind::all()
            .into_iter()
            .map(|kind| ChartEntry {
                slug: kind.slug(),
                title: kind.title(),
            })
            .collect(),
    )
}

/// The shaped report behind a chart
pub async fn api_chart(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let kind = chart_kind(&slug)?;
    let snapshot = state.snapshot().await?;
    Ok(Json(build_report(kind, &snapshot.table)))
}
