//! Chart routes - generated HTML artifacts and shaped reports

pub mod api;
pub mod page;

pub use api::{api_chart, api_charts_list};
pub use page::{page_chart, page_default_chart};

use fintrack_core::ChartKind;

use crate::ApiError;

/// Resolve a slug to a chart, answering 404 for unknown names
pub(crate) fn chart_kind(slug: &str) -> Result<ChartKind, ApiError> {
    slug.parse().map_err(|_| ApiError::NotFound {
        resource: format!("chart '{}'", slug),
    })
}
