//! Route handlers
//!
//! - charts: chart pages, report JSON and the chart catalogue
//! - dashboard: HTMX dashboard and its fragments
//! - status: cache status, refresh and health

pub mod charts;
pub mod dashboard;
pub mod status;
