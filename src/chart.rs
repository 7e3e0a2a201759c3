//! Chart mapping
//!
//! Deterministic translation of a result table plus the active parameters
//! into a rendering specification. No rendering happens here; the charting
//! layer consumes `ChartSpec` as-is.

use crate::db::table::ResultTable;
use crate::params::{ChartType, QueryParameters};
use serde::{Deserialize, Serialize};

/// Hover values are displayed with two decimal places everywhere
pub const HOVER_FORMAT: &str = ".2f";

/// Declarative chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartType,
    pub x_field: String,
    /// One entry for bar/line/area; the OHLC four-tuple for candlestick
    pub y_fields: Vec<String>,
    /// Series grouping column; candlestick carries a single series per call
    pub color_field: Option<String>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub hover_format: String,
}

/// Map the main-chart table to its rendering spec.
///
/// Candlestick specs hold one OHLC series; the caller issues one chart per
/// company when the table covers several.
pub fn map_to_chart(table: &ResultTable, params: &QueryParameters) -> ChartSpec {
    let metric_label = params.metric.label().to_string();
    let title = format!(
        "{} Chart: {} {}",
        params.chart_type.label(),
        params.aggregation.label(),
        metric_label
    );

    match params.chart_type {
        ChartType::Bar => ChartSpec {
            kind: ChartType::Bar,
            x_field: "company".to_string(),
            y_fields: vec![params.metric.column().to_string()],
            color_field: Some("company".to_string()),
            title,
            x_label: "Company".to_string(),
            y_label: metric_label,
            hover_format: HOVER_FORMAT.to_string(),
        },
        ChartType::Line | ChartType::Area => ChartSpec {
            kind: params.chart_type,
            x_field: "date".to_string(),
            y_fields: vec![params.metric.column().to_string()],
            color_field: Some("company".to_string()),
            title,
            x_label: "Date".to_string(),
            y_label: metric_label,
            hover_format: HOVER_FORMAT.to_string(),
        },
        ChartType::Candlestick => ChartSpec {
            kind: ChartType::Candlestick,
            x_field: "date".to_string(),
            y_fields: table
                .columns
                .iter()
                .filter(|c| matches!(c.as_str(), "open" | "high" | "low" | "close"))
                .cloned()
                .collect(),
            color_field: None,
            title: "Candlestick Chart".to_string(),
            x_label: "Date".to_string(),
            y_label: "Price".to_string(),
            hover_format: HOVER_FORMAT.to_string(),
        },
    }
}

/// Spec for one of the average-metric overview charts (one per avg_* column).
/// Candlestick has no averages overview; it renders as a line series.
pub fn average_metric_chart(chart_type: ChartType, column: &str, title: &str) -> ChartSpec {
    let kind = match chart_type {
        ChartType::Bar => ChartType::Bar,
        ChartType::Area => ChartType::Area,
        ChartType::Line | ChartType::Candlestick => ChartType::Line,
    };
    let x_field = if kind == ChartType::Bar { "company" } else { "date" };

    ChartSpec {
        kind,
        x_field: x_field.to_string(),
        y_fields: vec![column.to_string()],
        color_field: Some("company".to_string()),
        title: format!("{} Chart: {}", kind.label(), title),
        x_label: if kind == ChartType::Bar {
            "Company".to_string()
        } else {
            "Date".to_string()
        },
        y_label: title.to_string(),
        hover_format: HOVER_FORMAT.to_string(),
    }
}

/// Display titles for the five average-metric columns, render order
pub fn average_metric_titles() -> [(&'static str, &'static str); 5] {
    [
        ("avg_open", "Average Opening Price"),
        ("avg_high", "Average Highest Price"),
        ("avg_close", "Average Closing Price"),
        ("avg_low", "Average Lowest Price"),
        ("avg_volume", "Average Trading Volume"),
    ]
}
