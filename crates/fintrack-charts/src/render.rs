//! Standalone HTML chart documents

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fintrack_utils::{escape_html, sanitize_filename};

use crate::error::{ChartError, ChartResult};
use crate::figure::Figure;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Embed a figure in a self-contained HTML page that loads plotly.js
pub fn render_html(figure: &Figure, title: &str) -> ChartResult<String> {
    // "</" would close the script element early
    let json = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <script src="{}"></script>
    <style>
        html, body {{ margin: 0; height: 100%; }}
        #chart {{ width: 100%; height: 100%; }}
    </style>
</head>
<body>
    <div id="chart"></div>
    <script>
        const figure = {};
        Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
    </script>
</body>
</html>"#,
        escape_html(title),
        PLOTLY_CDN,
        json
    ))
}

/// Write a chart document into `dir`, creating the directory if needed.
///
/// `filename` must be a bare file name; anything that could escape `dir`
/// is rejected before touching the filesystem. The document is written to a
/// temporary file next to the target and renamed into place, so readers see
/// either the previous chart or the new one, never a partial write.
pub fn write_chart(dir: &Path, filename: &str, html: &str) -> ChartResult<PathBuf> {
    let filename = sanitize_filename(filename)?;
    let io_error = |path: &Path, e: std::io::Error| ChartError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let path = dir.join(&filename);
    let temp = dir.join(format!(
        ".{}.{}.{}.tmp",
        filename,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp, html).map_err(|e| io_error(&temp, e))?;
    if let Err(e) = fs::rename(&temp, &path) {
        let _ = fs::remove_file(&temp);
        return Err(io_error(&path, e));
    }
    log::info!("Chart written to {}", path.display());
    Ok(path)
}
