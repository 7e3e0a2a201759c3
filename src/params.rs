//! Query parameter model
//!
//! Everything the UI can tune for one recomputation pass: company filter,
//! date range, metric, aggregation, chart style, smoothing. A fresh
//! `QueryParameters` is constructed from UI state on every interaction and
//! never mutated afterwards.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Allowed rows-per-page values for the stats table
pub const PAGE_SIZES: [usize; 4] = [5, 10, 20, 50];

/// Default smoothing window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Smoothing window bounds (inclusive)
pub const WINDOW_DAYS_MIN: u32 = 1;
pub const WINDOW_DAYS_MAX: u32 = 30;

/// Stock metric selectable for the main chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Open,
    Close,
    High,
    Low,
    Volume,
}

impl Metric {
    /// Warehouse column identifier. Closed set, safe to interpolate into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Open => "open",
            Metric::Close => "close",
            Metric::High => "high",
            Metric::Low => "low",
            Metric::Volume => "volume",
        }
    }

    /// Human-readable label for titles and axis names
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Open => "Opening Price",
            Metric::Close => "Closing Price",
            Metric::High => "Highest Price",
            Metric::Low => "Lowest Price",
            Metric::Volume => "Trading Volume",
        }
    }

    pub fn all() -> [Metric; 5] {
        [
            Metric::Open,
            Metric::Close,
            Metric::High,
            Metric::Low,
            Metric::Volume,
        ]
    }
}

/// Reduction applied to the metric in the bar (per-company) shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Average,
    Median,
    Sum,
}

impl Aggregation {
    /// Display label, matching the UI wording ("Total" for sum)
    pub fn label(&self) -> &'static str {
        match self {
            Aggregation::Average => "Average",
            Aggregation::Median => "Median",
            Aggregation::Sum => "Total",
        }
    }
}

/// Chart style for the main chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Candlestick,
}

impl ChartType {
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
            ChartType::Area => "Area",
            ChartType::Candlestick => "Candlestick",
        }
    }

    /// Smoothing only applies to per-date series
    pub fn supports_smoothing(&self) -> bool {
        matches!(self, ChartType::Line | ChartType::Area)
    }
}

/// One immutable parameter set, collected from UI state per recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Selected companies; empty means "all companies in the catalog"
    pub companies: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metric: Metric,
    pub aggregation: Aggregation,
    pub chart_type: ChartType,
    pub smoothing_enabled: bool,
    pub smoothing_window_days: u32,
}

impl QueryParameters {
    /// Check the invariants the builder relies on
    pub fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(AppError::Validation(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if !(WINDOW_DAYS_MIN..=WINDOW_DAYS_MAX).contains(&self.smoothing_window_days) {
            return Err(AppError::Validation(format!(
                "smoothing window must be between {} and {} days, got {}",
                WINDOW_DAYS_MIN, WINDOW_DAYS_MAX, self.smoothing_window_days
            )));
        }
        Ok(())
    }

    /// Whether the main query applies the trailing moving average
    pub fn smoothing_active(&self) -> bool {
        self.smoothing_enabled
            && self.smoothing_window_days > 1
            && self.chart_type.supports_smoothing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> QueryParameters {
        QueryParameters {
            companies: vec!["AAPL".to_string()],
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            metric: Metric::Close,
            aggregation: Aggregation::Average,
            chart_type: ChartType::Line,
            smoothing_enabled: false,
            smoothing_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(base_params().validate().is_ok());
    }

    #[test]
    fn test_empty_companies_is_valid() {
        // Empty selection means "all companies"; substitution happens later
        let mut p = base_params();
        p.companies.clear();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let mut p = base_params();
        p.end_date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_window_bounds() {
        let mut p = base_params();
        p.smoothing_window_days = 0;
        assert!(p.validate().is_err());
        p.smoothing_window_days = 31;
        assert!(p.validate().is_err());
        p.smoothing_window_days = 30;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_smoothing_only_for_series_charts() {
        let mut p = base_params();
        p.smoothing_enabled = true;
        p.smoothing_window_days = 7;
        assert!(p.smoothing_active());

        p.chart_type = ChartType::Bar;
        assert!(!p.smoothing_active());

        p.chart_type = ChartType::Line;
        p.smoothing_window_days = 1;
        assert!(!p.smoothing_active());
    }
}
