//! Chart pages - render, write the artifact, then serve it

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::response::Html;
use fintrack_charts::{render_report, write_chart};
use fintrack_core::{build_report, ChartKind};

use super::chart_kind;
use crate::{ApiError, AppState};

async fn serve_chart(state: &AppState, kind: ChartKind) -> Result<Html<String>, ApiError> {
    let snapshot = state.snapshot().await?;
    let report = build_report(kind, &snapshot.table);
    let html = render_report(&report, &state.config.charts)?;

    let dir: PathBuf = state.config.output.dir.clone();
    let path = tokio::task::spawn_blocking(move || write_chart(&dir, &kind.slug(), &html))
        .await
        .map_err(|e| ApiError::InternalError {
            message: format!("Chart write task failed: {}", e),
        })??;

    read_artifact(&path).await
}

/// Serve a written chart; a file that cannot be read is a missing chart
async fn read_artifact(path: &FsPath) -> Result<Html<String>, ApiError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Html(content)),
        Err(e) => {
            log::warn!("Chart file {} not readable: {}", path.display(), e);
            Err(ApiError::NotFound {
                resource: format!("chart file {}", path.display()),
            })
        }
    }
}

pub async fn page_chart(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ApiError> {
    let kind = chart_kind(&slug)?;
    serve_chart(&state, kind).await
}

/// Business expense vs revenue, the default chart
pub async fn page_default_chart(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    serve_chart(&state, ChartKind::BusinessExpenseVsRevenue).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_artifact_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_artifact(&tmp.path().join("gone.html")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_readable_artifact_is_served() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chart.html");
        std::fs::write(&path, "<html></html>").unwrap();
        let Html(content) = read_artifact(&path).await.unwrap();
        assert_eq!(content, "<html></html>");
    }
}
