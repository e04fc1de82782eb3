//! Plotly figure model
//!
//! Only the attributes the charts use are modelled. `None` fields are left
//! out of the JSON so plotly.js applies its own defaults.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar(BarTrace),
    Waterfall(WaterfallTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Bar(t) => &t.name,
            Trace::Waterfall(t) => &t.name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<String>,
    /// `None` leaves a gap for months without data
    pub y: Vec<Option<f64>>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterfallColor {
    pub marker: Marker,
}

impl WaterfallColor {
    pub fn new(color: &str) -> Self {
        Self {
            marker: Marker {
                color: color.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterfallTrace {
    pub name: String,
    pub orientation: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub measure: Vec<String>,
    pub text: Vec<String>,
    pub textposition: String,
    pub hoverinfo: String,
    pub increasing: WaterfallColor,
    pub decreasing: WaterfallColor,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticksuffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    /// Category axes keep month strings from being parsed as dates
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub size: u32,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: String,
    pub yref: String,
    pub x: serde_json::Value,
    pub y: f64,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borderwidth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yshift: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
}

impl Annotation {
    /// Boxed text positioned relative to the plotting area
    pub fn paper(text: String, x: f64, y: f64) -> Self {
        Self {
            text,
            xref: "paper".to_string(),
            yref: "paper".to_string(),
            x: serde_json::json!(x),
            y,
            showarrow: false,
            font: Some(Font {
                size: 14,
                color: "black".to_string(),
            }),
            bgcolor: Some("white".to_string()),
            bordercolor: Some("black".to_string()),
            borderwidth: Some(1),
            yshift: None,
            xanchor: Some("right".to_string()),
        }
    }

    /// Text floating above a data point
    pub fn above(text: String, x: &str, y: f64) -> Self {
        Self {
            text,
            xref: "x".to_string(),
            yref: "y".to_string(),
            x: serde_json::Value::String(x.to_string()),
            y,
            showarrow: false,
            font: None,
            bgcolor: None,
            bordercolor: None,
            borderwidth: None,
            yshift: Some(10),
            xanchor: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub t: u32,
    pub b: u32,
    pub l: u32,
    pub r: u32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            t: 120,
            b: 80,
            l: 60,
            r: 40,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    pub margin: Margin,
    pub showlegend: bool,
}
