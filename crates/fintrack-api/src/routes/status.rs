//! Cache status, refresh and health endpoints

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use fintrack_core::CacheStatus;
use fintrack_utils::escape_html;

use crate::{is_htmx_request, ApiError, AppState};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn api_status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(state.cache.status())
}

/// Short status line used by the dashboard
pub fn status_fragment(status: &CacheStatus) -> String {
    match status.fetched_at {
        Some(fetched_at) if status.loaded => format!(
            "<span class='text-green-700'>{} rows loaded ({} skipped) at {}</span>",
            status.rows,
            status.skipped,
            fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        _ if status.fetching => "<span class='text-gray-500'>Fetching data...</span>".to_string(),
        _ => "<span class='text-gray-500'>No data loaded yet</span>".to_string(),
    }
}

/// Force a refetch; HTMX callers get the status fragment back
pub async fn api_refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = state
        .cache
        .refresh(|| state.tracker.fetch_snapshot())
        .await
        .map(|_| state.cache.status());

    match (result, is_htmx_request(&headers)) {
        (Ok(status), true) => Html(status_fragment(&status)).into_response(),
        (Ok(status), false) => Json(serde_json::json!({
            "success": true,
            "rows": status.rows,
            "skipped": status.skipped,
        }))
        .into_response(),
        (Err(e), true) => {
            let err = ApiError::from(e);
            (
                err.status(),
                Html(format!(
                    "<span class='text-red-600'>Update failed: {}</span>",
                    escape_html(&err.to_string())
                )),
            )
                .into_response()
        }
        (Err(e), false) => ApiError::from(e).into_response(),
    }
}
