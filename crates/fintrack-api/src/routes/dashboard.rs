//! Dashboard page and HTMX fragments

use axum::extract::{Path, State};
use axum::response::Html;
use fintrack_core::ChartKind;
use fintrack_utils::escape_html;

use super::charts::chart_kind;
use super::status::status_fragment;
use crate::{base_html, ApiError, AppState};

fn chart_button(kind: &ChartKind) -> String {
    format!(
        r#"<button class='w-full text-left px-3 py-2 rounded hover:bg-indigo-50 text-sm' hx-get='/dashboard/frame/{}' hx-target='#chart-frame'>{}</button>"#,
        kind.slug(),
        escape_html(&kind.title())
    )
}

pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let status = state.cache.status();
    let buttons: Vec<String> = ChartKind::all().iter().map(chart_button).collect();

    let content = format!(
        r#"<div class='flex h-screen'>
    <aside class='w-80 flex-shrink-0 bg-white border-r overflow-auto p-4'>
        <h1 class='text-xl font-bold mb-4'>Finance Tracker</h1>
        <button class='w-full mb-2 px-3 py-2 rounded bg-indigo-600 text-white' hx-post='/api/refresh' hx-target='#refresh-status' hx-indicator='#refresh-spinner'>Update Data</button>
        <div class='text-xs mb-4'><span id='refresh-spinner' class='htmx-indicator'>Updating...</span> <span id='refresh-status'>{}</span></div>
        <div class='space-y-1'>{}</div>
    </aside>
    <main id='chart-frame' class='flex-1 p-4'>
        <p class='text-gray-500'>Pick a chart.</p>
    </main>
</div>"#,
        status_fragment(&status),
        buttons.join("\n")
    );

    Html(base_html("Dashboard", &content))
}

/// Iframe pointing at a chart page
pub async fn htmx_chart_frame(Path(slug): Path<String>) -> Result<Html<String>, ApiError> {
    let kind = chart_kind(&slug)?;
    Ok(Html(format!(
        r#"<iframe src='/charts/{}' title='{}' class='w-full h-full border-0 bg-white rounded-xl shadow-sm'></iframe>"#,
        kind.slug(),
        escape_html(&kind.title())
    )))
}
