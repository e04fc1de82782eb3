//! Report -> figure conversion

use std::collections::HashMap;

use fintrack_config::ChartConfig;
use fintrack_core::reports::{BarReport, CategoryReport, SummaryLine, WaterfallReport};
use fintrack_core::{CategoryMode, Report};
use fintrack_utils::format_currency;

use crate::figure::{
    Annotation, Axis, BarTrace, Figure, Layout, Marker, Trace, WaterfallColor, WaterfallTrace,
};
use crate::palette::{cash_flow_color, CategoryColors};

const INCREASING: &str = "#2CA02C";
const DECREASING: &str = "#EF553B";

/// Formats amounts the way every chart label does
struct Money<'a> {
    config: &'a ChartConfig,
}

impl Money<'_> {
    fn format(&self, amount: f64) -> String {
        format_currency(amount, &self.config.currency_symbol, self.config.decimal_places)
    }

    fn axis_title(&self) -> String {
        format!("Amount ({})", self.config.currency_symbol)
    }
}

/// Build the Plotly figure for a report
pub fn figure_for(report: &Report, config: &ChartConfig) -> Figure {
    let money = Money { config };
    match report {
        Report::Bar(r) => bar_figure(r, &money),
        Report::Waterfall(r) => waterfall_figure(r, &money),
        Report::Category(r) => category_figure(r, &money),
    }
}

fn month_axis() -> Axis {
    Axis {
        title: Some("Month-Year".to_string()),
        axis_type: Some("category".to_string()),
        ..Axis::default()
    }
}

/// Stack summary boxes in the top-right corner, first line highest
fn summary_annotations(summary: &[SummaryLine], money: &Money) -> Vec<Annotation> {
    let n = summary.len();
    summary
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let y = if n == 1 { 1.0 } else { 1.0 + 0.1 * (n - i) as f64 };
            Annotation::paper(format!("{}: {}", line.label, money.format(line.amount)), 1.0, y)
        })
        .collect()
}

fn bar_figure(report: &BarReport, money: &Money) -> Figure {
    let data = report
        .series
        .iter()
        .map(|series| {
            let totals: Vec<_> = report
                .months
                .iter()
                .map(|month| {
                    report
                        .totals
                        .iter()
                        .find(|t| &t.month_year == month && &t.series == series)
                })
                .collect();

            let hovertext: Vec<String> = totals
                .iter()
                .map(|total| match total {
                    Some(t) if t.breakdown.len() > 1 => t
                        .breakdown
                        .iter()
                        .map(|(kind, amount)| format!("{}: {}", kind, money.format(*amount)))
                        .collect::<Vec<_>>()
                        .join("<br>"),
                    Some(t) => format!("{}: {}", series, money.format(t.amount)),
                    None => String::new(),
                })
                .collect();

            let text: Option<Vec<String>> = report.label_bars.then(|| {
                totals
                    .iter()
                    .map(|t| t.map(|t| money.format(t.amount)).unwrap_or_default())
                    .collect()
            });

            Trace::Bar(BarTrace {
                name: series.clone(),
                x: report.months.clone(),
                y: totals.iter().map(|t| t.map(|t| t.amount)).collect(),
                marker: Marker {
                    color: cash_flow_color(series).to_string(),
                },
                textposition: text.as_ref().map(|_| "outside".to_string()),
                text,
                hovertext: Some(hovertext),
                legendgroup: None,
            })
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: report.title.clone(),
            xaxis: month_axis(),
            yaxis: Axis {
                title: Some(money.axis_title()),
                ..Axis::default()
            },
            barmode: Some("group".to_string()),
            annotations: summary_annotations(&report.summary, money),
            showlegend: true,
            ..Layout::default()
        },
    }
}

fn waterfall_figure(report: &WaterfallReport, money: &Money) -> Figure {
    let trace = WaterfallTrace {
        name: "Cash Flow".to_string(),
        orientation: "v".to_string(),
        x: report
            .steps
            .iter()
            .map(|s| s.date.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect(),
        y: report.steps.iter().map(|s| s.amount).collect(),
        measure: vec!["relative".to_string(); report.steps.len()],
        text: report.steps.iter().map(|s| s.label.clone()).collect(),
        textposition: "outside".to_string(),
        hoverinfo: "text".to_string(),
        increasing: WaterfallColor::new(INCREASING),
        decreasing: WaterfallColor::new(DECREASING),
    };

    Figure {
        data: vec![Trace::Waterfall(trace)],
        layout: Layout {
            title: report.title.clone(),
            // Date axis: same-day steps keep their own position
            xaxis: Axis {
                title: Some("Date".to_string()),
                tickangle: Some(-45),
                ..Axis::default()
            },
            yaxis: Axis {
                title: Some(money.axis_title()),
                ..Axis::default()
            },
            showlegend: false,
            ..Layout::default()
        },
    }
}

fn category_figure(report: &CategoryReport, money: &Money) -> Figure {
    let percent = report.mode == CategoryMode::Percent;
    let mut colors = CategoryColors::new(&money.config.category_colors);

    let data = report
        .sub_categories()
        .into_iter()
        .map(|(sub, main)| {
            let by_month: HashMap<&str, _> = report
                .shares
                .iter()
                .filter(|s| s.sub_category == sub && s.main_category == main)
                .map(|s| (s.month_year.as_str(), s))
                .collect();

            let mut y = Vec::with_capacity(report.months.len());
            let mut hovertext = Vec::with_capacity(report.months.len());
            for month in &report.months {
                match by_month.get(month.as_str()) {
                    Some(share) => {
                        y.push(Some(if percent { share.percentage } else { share.amount }));
                        hovertext.push(format!(
                            "{} / {}<br>{}: {} ({:.1}%)<br>{} total: {} ({:.1}%)",
                            main,
                            sub,
                            month,
                            money.format(share.amount),
                            share.percentage,
                            main,
                            money.format(share.main_category_sum),
                            share.main_category_percentage,
                        ));
                    }
                    None => {
                        y.push(None);
                        hovertext.push(String::new());
                    }
                }
            }

            Trace::Bar(BarTrace {
                name: sub.to_string(),
                x: report.months.clone(),
                y,
                marker: Marker {
                    color: colors.color_for(main),
                },
                hovertext: Some(hovertext),
                legendgroup: Some(main.to_string()),
                ..BarTrace::default()
            })
        })
        .collect();

    let (yaxis, annotations) = if percent {
        (
            Axis {
                title: Some("Percentage Spent (%)".to_string()),
                ticksuffix: Some("%".to_string()),
                showgrid: Some(false),
                ..Axis::default()
            },
            Vec::new(),
        )
    } else {
        let totals = report
            .monthly_totals()
            .into_iter()
            .map(|(month, total)| Annotation::above(money.format(total), month, total))
            .collect();
        (
            Axis {
                title: Some("Amount Spent".to_string()),
                showgrid: Some(false),
                ..Axis::default()
            },
            totals,
        )
    };

    Figure {
        data,
        layout: Layout {
            title: report.title.clone(),
            xaxis: Axis {
                showgrid: Some(false),
                ..month_axis()
            },
            yaxis,
            barmode: Some("stack".to_string()),
            annotations,
            showlegend: true,
            ..Layout::default()
        },
    }
}
