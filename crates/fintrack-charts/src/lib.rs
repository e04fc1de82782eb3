//! Chart rendering: reports -> Plotly figures -> standalone HTML

pub mod build;
pub mod error;
pub mod figure;
pub mod palette;
pub mod render;

use fintrack_config::ChartConfig;
use fintrack_core::{timed_sync, Report};

pub use build::figure_for;
pub use error::{ChartError, ChartResult};
pub use figure::Figure;
pub use render::{render_html, write_chart};

/// Render a report straight to an HTML document
pub fn render_report(report: &Report, config: &ChartConfig) -> ChartResult<String> {
    timed_sync("render_chart", || {
        let figure = figure_for(report, config);
        render_html(&figure, report.title())
    })
}
