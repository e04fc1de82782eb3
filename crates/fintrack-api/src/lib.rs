//! HTTP chart server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::charts: chart pages and report JSON
//! - routes::dashboard: dashboard page and fragments
//! - routes::status: cache status, refresh, health

pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use fintrack_config::Config;
use fintrack_core::{FinanceTracker, Snapshot, TableCache};
use fintrack_notion::SourceRef;
use tokio::net::TcpListener;

pub use error::ApiError;
use rate_limit::FixedWindow;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<FinanceTracker>,
    /// Last fetched table, shared by every request
    pub cache: Arc<TableCache>,
    pub config: Arc<Config>,
    pub limiter: Option<Arc<FixedWindow>>,
}

impl AppState {
    pub fn new(config: Config, source: SourceRef) -> Self {
        let limiter = FixedWindow::from_config(&config.server.rate_limit).map(Arc::new);
        Self {
            tracker: Arc::new(FinanceTracker::new(config.clone(), source)),
            cache: Arc::new(TableCache::new()),
            config: Arc::new(config),
            limiter,
        }
    }

    /// Cached table, fetched on first use
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, ApiError> {
        let snapshot = self
            .cache
            .get_or_fetch(|| self.tracker.fetch_snapshot())
            .await?;
        Ok(snapshot)
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::charts::{api_chart, api_charts_list, page_chart, page_default_chart};
    use routes::dashboard::{htmx_chart_frame, index_page};
    use routes::status::{api_refresh, api_status, health_check};

    // Everything that may fetch and render sits behind the rate limit
    let limited = Router::new()
        .route("/chart", get(page_default_chart))
        .route("/charts/:slug", get(page_chart))
        .route("/api/charts/:slug", get(api_chart))
        .route("/api/refresh", post(api_refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ));

    // Everything except the health check needs credentials when auth is set
    let protected = Router::new()
        // API endpoints
        .route("/api/status", get(api_status))
        .route("/api/charts", get(api_charts_list))
        // Pages
        .route("/", get(index_page))
        .route("/dashboard/frame/:slug", get(htmx_chart_frame))
        .merge(limited)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(protected)
        .with_state(state)
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Finance Tracker</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        fintrack_utils::escape_html(title),
        content
    )
}

pub(crate) fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    log::info!("Shutdown requested");
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(config: Config, source: SourceRef) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, source);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting fintrack server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Dashboard)");
    log::info!("  - /chart (Business expense vs revenue)");
    log::info!("  - /charts/:slug (Any chart, see /api/charts)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use fintrack_config::AuthConfig;
    use fintrack_notion::{MemorySource, NotionError, RawRecord, RecordSource};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Holds every fetch until `release` is notified
    struct GatedSource {
        inner: MemorySource,
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl RecordSource for GatedSource {
        async fn fetch_all(&self, source_id: &str) -> Result<Vec<RawRecord>, NotionError> {
            self.started.notify_one();
            self.release.notified().await;
            self.inner.fetch_all(source_id).await
        }
    }

    fn select(name: &str) -> Value {
        json!({ "type": "select", "select": { "name": name } })
    }

    fn transaction(id: &str, name: &str, date: &str, amount: f64, kind: &str) -> RawRecord {
        RawRecord::from_value(json!({
            "id": id,
            "properties": {
                "Name": { "type": "title", "title": [{ "text": { "content": name }, "plain_text": name }] },
                "Date": { "type": "date", "date": { "start": date } },
                "Amount": { "type": "number", "number": amount },
                "Cash Flow Type": select(kind),
                "Business Related?": select("Business-Related"),
                "Sub Category": { "type": "relation", "relation": [] }
            }
        }))
        .unwrap()
    }

    fn test_config(dir: &std::path::Path, requests: u32) -> Config {
        let mut config = Config::default();
        config.notion.transactions_database = Some("tx".to_string());
        config.output.dir = dir.to_path_buf();
        config.server.rate_limit.requests = requests;
        config
    }

    fn may_source() -> MemorySource {
        MemorySource::new().with_table(
            "tx",
            vec![
                transaction("t1", "Client A", "2024-05-01", 1000.0, "Revenue"),
                transaction("t2", "Server", "2024-05-15", 300.0, "Expense"),
                transaction("t3", "Pot", "2024-05-20", 200.0, "Transfer to Savings"),
            ],
        )
    }

    fn test_state(dir: &std::path::Path, requests: u32) -> AppState {
        AppState::new(test_config(dir, requests), Arc::new(may_source()))
    }

    fn basic(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_empty_status() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 10));

        let response = app.clone().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");

        let response = app.oneshot(get_request("/api/status")).await.unwrap();
        let status: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(status["loaded"], false);
    }

    #[tokio::test]
    async fn test_chart_route_writes_and_serves_file() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path(), 10);
        let app = create_router(state.clone());

        let response = app.oneshot(get_request("/chart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Business-Related Expense vs Revenue (Monthly Totals)"));

        let written = tmp.path().join("business-expense-vs-revenue.html");
        assert_eq!(std::fs::read_to_string(written).unwrap(), html);
        assert!(state.cache.is_loaded());
    }

    #[tokio::test]
    async fn test_unknown_chart_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 10));

        let response = app.clone().oneshot(get_request("/charts/no-such-chart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get_request("/dashboard/frame/no-such-chart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_json() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 10));

        let response = app
            .oneshot(get_request("/api/charts/business-waterfall"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(report["type"], "waterfall");
        assert_eq!(report["steps"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_reports_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 10));

        let request = Request::builder()
            .uri("/api/refresh")
            .method(Method::POST)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["rows"], 3);
        assert_eq!(body["skipped"], 0);

        let request = Request::builder()
            .uri("/api/refresh")
            .method(Method::POST)
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(body_string(response).await.contains("3 rows loaded"));
    }

    #[tokio::test]
    async fn test_missing_source_is_bad_gateway() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.notion.transactions_database = Some("absent".to_string());
        config.output.dir = tmp.path().to_path_buf();
        let app = create_router(AppState::new(config, Arc::new(MemorySource::new())));

        let response = app.oneshot(get_request("/chart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!tmp.path().join("business-expense-vs-revenue.html").exists());
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_chart_routes_only() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 1));

        let first = app.clone().oneshot(get_request("/api/charts/business-savings")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(get_request("/chart")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));

        let health = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_and_dashboard_answer_during_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source = GatedSource {
            inner: may_source(),
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let app = create_router(AppState::new(test_config(tmp.path(), 10), Arc::new(source)));

        let chart = tokio::spawn(app.clone().oneshot(get_request("/chart")));
        started.notified().await;

        let response = tokio::time::timeout(
            Duration::from_secs(1),
            app.clone().oneshot(get_request("/api/status")),
        )
        .await
        .expect("/api/status blocked by a pending fetch")
        .unwrap();
        let status: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(status["loaded"], false);
        assert_eq!(status["fetching"], true);

        let response = tokio::time::timeout(Duration::from_secs(1), app.clone().oneshot(get_request("/")))
            .await
            .expect("dashboard blocked by a pending fetch")
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Fetching data..."));

        release.notify_one();
        let response = chart.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_guards_everything_but_health() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path(), 10);
        config.server.auth = Some(AuthConfig {
            username: None,
            password: "s3cret".to_string(),
        });
        let app = create_router(AppState::new(config, Arc::new(may_source())));

        for uri in ["/", "/api/status", "/api/charts", "/chart", "/dashboard/frame/business-savings"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            assert!(response.headers().contains_key("www-authenticate"));
        }
        assert!(!tmp.path().join("business-expense-vs-revenue.html").exists());

        let wrong = Request::builder()
            .uri("/api/status")
            .header("Authorization", basic("me", "guess"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let right = Request::builder()
            .uri("/api/status")
            .header("Authorization", basic("anyone", "s3cret"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(right).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_do_not_use_rate_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path(), 1);
        config.server.auth = Some(AuthConfig {
            username: Some("me".to_string()),
            password: "pw".to_string(),
        });
        let app = create_router(AppState::new(config, Arc::new(may_source())));

        let rejected = app.clone().oneshot(get_request("/api/charts/business-savings")).await.unwrap();
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/api/charts/business-savings")
            .header("Authorization", basic("me", "pw"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_lists_every_chart() {
        let tmp = tempfile::tempdir().unwrap();
        let app = create_router(test_state(tmp.path(), 10));

        let response = app.oneshot(get_request("/")).await.unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Update Data"));
        assert!(html.contains("htmx.org@1.9.10"));
        for kind in fintrack_core::ChartKind::all() {
            assert!(html.contains(&format!("/dashboard/frame/{}'", kind.slug())));
        }
    }
}
