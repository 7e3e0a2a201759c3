//! Query construction
//!
//! Pure translation of a `QueryParameters` set into parameterized SQL against
//! the `stock_details` table. No I/O happens here; the warehouse module binds
//! and executes the result.
//!
//! Filter values (companies, dates) are always bound parameters. Only
//! identifiers drawn from closed enums (metric column, aggregation function)
//! and the validated smoothing window are interpolated into the text.

use crate::error::{AppError, Result};
use crate::params::{Aggregation, ChartType, QueryParameters};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Warehouse table holding the historical records
pub const STOCK_TABLE: &str = "stock_details";

/// Which of the three query shapes to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryShape {
    /// The main chart query: shape depends on chart type
    Main,
    /// Five-metric averages for the overview charts
    Averages,
    /// Per-company summary statistics for the paginated table
    Stats,
}

/// A value bound into a query placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarParam {
    Text(String),
    Date(NaiveDate),
}

/// Output column metadata; `is_date` marks columns the fetcher must
/// normalize to UTC
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub is_date: bool,
}

impl ColumnSpec {
    fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_date: false,
        }
    }

    fn date(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_date: true,
        }
    }
}

/// A query ready for execution: text, bound values, output schema
#[derive(Debug, Clone)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<ScalarParam>,
    pub columns: Vec<ColumnSpec>,
}

impl BoundQuery {
    /// Column names, in output order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Averages metric columns, in the order the overview charts render them
pub const AVG_COLUMNS: [&str; 5] = ["avg_open", "avg_high", "avg_close", "avg_low", "avg_volume"];

/// Stats metric columns, in CSV export order
pub const STATS_COLUMNS: [&str; 5] = ["avg_open", "avg_close", "avg_high", "avg_low", "avg_volume"];

/// Build one of the three query shapes for the given parameter set.
///
/// The caller must have substituted the full catalog for an empty company
/// selection already; an empty list is rejected so the warehouse is never
/// queried with an empty `IN` set.
pub fn build_query(params: &QueryParameters, shape: QueryShape) -> Result<BoundQuery> {
    params.validate()?;
    if params.companies.is_empty() {
        return Err(AppError::Validation(
            "company filter is empty; substitute the full catalog first".to_string(),
        ));
    }

    let query = match shape {
        QueryShape::Main => match params.chart_type {
            ChartType::Bar => build_bar(params),
            ChartType::Line | ChartType::Area => build_series(params),
            ChartType::Candlestick => build_candlestick(params),
        },
        QueryShape::Averages => build_averages(params),
        QueryShape::Stats => build_stats(params),
    };

    Ok(query)
}

/// Output schema of a shape for the given parameters. The schema depends
/// only on chart type and metric, so it is available even when no query can
/// be issued (empty catalog) and empty results can still carry their columns.
pub fn shape_columns(params: &QueryParameters, shape: QueryShape) -> Vec<ColumnSpec> {
    match shape {
        QueryShape::Main => match params.chart_type {
            ChartType::Bar => vec![
                ColumnSpec::plain("company"),
                ColumnSpec::plain(params.metric.column()),
            ],
            ChartType::Line | ChartType::Area => vec![
                ColumnSpec::plain("company"),
                ColumnSpec::date("date"),
                ColumnSpec::plain(params.metric.column()),
            ],
            ChartType::Candlestick => vec![
                ColumnSpec::plain("company"),
                ColumnSpec::date("date"),
                ColumnSpec::plain("open"),
                ColumnSpec::plain("high"),
                ColumnSpec::plain("low"),
                ColumnSpec::plain("close"),
            ],
        },
        QueryShape::Averages => {
            let mut columns = vec![ColumnSpec::plain("company")];
            if params.chart_type != ChartType::Bar {
                columns.push(ColumnSpec::date("date"));
            }
            columns.extend(AVG_COLUMNS.iter().map(|c| ColumnSpec::plain(c)));
            columns
        }
        QueryShape::Stats => {
            let mut columns = vec![ColumnSpec::plain("company")];
            columns.extend(STATS_COLUMNS.iter().map(|c| ColumnSpec::plain(c)));
            columns
        }
    }
}

/// One row per company, metric reduced by the chosen aggregation.
///
/// Median is `quantile_cont(x, 0.5)`: a quantile-interpolation rule rather
/// than a dedicated median primitive, carried over from the observed
/// behavior. It equals the exact median for odd sample counts without
/// duplicate boundary values and is a consistent interpolation otherwise.
fn build_bar(params: &QueryParameters) -> BoundQuery {
    let col = params.metric.column();
    let agg_expr = match params.aggregation {
        Aggregation::Average => format!("avg(CAST({col} AS DOUBLE))"),
        Aggregation::Sum => format!("sum(CAST({col} AS DOUBLE))"),
        Aggregation::Median => format!("quantile_cont(CAST({col} AS DOUBLE), 0.5)"),
    };

    let sql = format!(
        "SELECT company, {agg_expr} AS {col}\n\
         FROM {STOCK_TABLE}\n\
         {filter}\n\
         GROUP BY company\n\
         ORDER BY company",
        filter = filter_clause(params.companies.len()),
    );

    BoundQuery {
        sql,
        params: filter_params(params),
        columns: shape_columns(params, QueryShape::Main),
    }
}

/// One row per (company, date), metric raw or smoothed.
///
/// Smoothing is a trailing (right-aligned) moving average over the preceding
/// `window - 1` rows plus the current row, per company. The first rows of
/// each company's series average fewer than `window` points; that edge bias
/// is the documented policy, not a defect.
fn build_series(params: &QueryParameters) -> BoundQuery {
    let col = params.metric.column();
    let metric_expr = if params.smoothing_active() {
        let preceding = params.smoothing_window_days - 1;
        format!(
            "avg(CAST({col} AS DOUBLE)) OVER (\
             PARTITION BY company ORDER BY CAST(date AS DATE) \
             ROWS BETWEEN {preceding} PRECEDING AND CURRENT ROW)"
        )
    } else {
        format!("CAST({col} AS DOUBLE)")
    };

    let sql = format!(
        "SELECT company, CAST(date AS DATE) AS date, {metric_expr} AS {col}\n\
         FROM {STOCK_TABLE}\n\
         {filter}\n\
         ORDER BY company, CAST(date AS DATE)",
        filter = filter_clause(params.companies.len()),
    );

    BoundQuery {
        sql,
        params: filter_params(params),
        columns: shape_columns(params, QueryShape::Main),
    }
}

/// One row per (company, date) with the full OHLC tuple, no aggregation
fn build_candlestick(params: &QueryParameters) -> BoundQuery {
    let sql = format!(
        "SELECT company, CAST(date AS DATE) AS date, \
         CAST(open AS DOUBLE) AS open, CAST(high AS DOUBLE) AS high, \
         CAST(low AS DOUBLE) AS low, CAST(close AS DOUBLE) AS close\n\
         FROM {STOCK_TABLE}\n\
         {filter}\n\
         ORDER BY company, CAST(date AS DATE)",
        filter = filter_clause(params.companies.len()),
    );

    BoundQuery {
        sql,
        params: filter_params(params),
        columns: shape_columns(params, QueryShape::Main),
    }
}

/// Five-metric averages: per company for bar charts, per (company, date)
/// for everything else
fn build_averages(params: &QueryParameters) -> BoundQuery {
    let avg_exprs = "avg(CAST(open AS DOUBLE)) AS avg_open, \
         avg(CAST(high AS DOUBLE)) AS avg_high, \
         avg(CAST(close AS DOUBLE)) AS avg_close, \
         avg(CAST(low AS DOUBLE)) AS avg_low, \
         avg(CAST(volume AS DOUBLE)) AS avg_volume";
    let filter = filter_clause(params.companies.len());

    if params.chart_type == ChartType::Bar {
        let sql = format!(
            "SELECT company, {avg_exprs}\n\
             FROM {STOCK_TABLE}\n\
             {filter}\n\
             GROUP BY company\n\
             ORDER BY company"
        );
        BoundQuery {
            sql,
            params: filter_params(params),
            columns: shape_columns(params, QueryShape::Averages),
        }
    } else {
        let sql = format!(
            "SELECT company, CAST(date AS DATE) AS date, {avg_exprs}\n\
             FROM {STOCK_TABLE}\n\
             {filter}\n\
             GROUP BY company, CAST(date AS DATE)\n\
             ORDER BY company, CAST(date AS DATE)"
        );
        BoundQuery {
            sql,
            params: filter_params(params),
            columns: shape_columns(params, QueryShape::Averages),
        }
    }
}

/// Per-company averages of all five metrics, independent of chart type
fn build_stats(params: &QueryParameters) -> BoundQuery {
    let sql = format!(
        "SELECT company, \
         avg(CAST(open AS DOUBLE)) AS avg_open, \
         avg(CAST(close AS DOUBLE)) AS avg_close, \
         avg(CAST(high AS DOUBLE)) AS avg_high, \
         avg(CAST(low AS DOUBLE)) AS avg_low, \
         avg(CAST(volume AS DOUBLE)) AS avg_volume\n\
         FROM {STOCK_TABLE}\n\
         {filter}\n\
         GROUP BY company\n\
         ORDER BY company",
        filter = filter_clause(params.companies.len()),
    );

    BoundQuery {
        sql,
        params: filter_params(params),
        columns: shape_columns(params, QueryShape::Stats),
    }
}

/// Top companies by total traded volume over a date range
pub fn build_top_by_volume(start: NaiveDate, end: NaiveDate, limit: u32) -> Result<BoundQuery> {
    if end < start {
        return Err(AppError::Validation(format!(
            "end date {end} is before start date {start}"
        )));
    }
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }

    let sql = format!(
        "SELECT company, sum(volume) AS total_volume\n\
         FROM {STOCK_TABLE}\n\
         WHERE CAST(date AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)\n\
         GROUP BY company\n\
         ORDER BY total_volume DESC\n\
         LIMIT {limit}"
    );

    Ok(BoundQuery {
        sql,
        params: vec![ScalarParam::Date(start), ScalarParam::Date(end)],
        columns: vec![
            ColumnSpec::plain("company"),
            ColumnSpec::plain("total_volume"),
        ],
    })
}

/// `WHERE company IN (?, …) AND date BETWEEN ? AND ?` with one placeholder
/// per company
fn filter_clause(company_count: usize) -> String {
    let placeholders = vec!["?"; company_count].join(", ");
    format!(
        "WHERE company IN ({placeholders}) \
         AND CAST(date AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)"
    )
}

/// Bound values matching `filter_clause`: companies first, then the range
fn filter_params(params: &QueryParameters) -> Vec<ScalarParam> {
    let mut out: Vec<ScalarParam> = params
        .companies
        .iter()
        .map(|c| ScalarParam::Text(c.clone()))
        .collect();
    out.push(ScalarParam::Date(params.start_date));
    out.push(ScalarParam::Date(params.end_date));
    out
}
