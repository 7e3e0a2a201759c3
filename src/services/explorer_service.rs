//! Explorer Service
//!
//! The pull-based recomputation pass: one call per user interaction turns
//! the current parameter set into the three result tables, their chart
//! specs, and the paginated stats view. All warehouse failures are absorbed
//! here; callers only ever see tables (possibly empty) plus warnings.

use crate::chart::{self, ChartSpec};
use crate::db::table::ResultTable;
use crate::error::Result;
use crate::pagination::Page;
use crate::params::QueryParameters;
use crate::query::{self, QueryShape};
use crate::services::catalog_service::CatalogService;
use crate::state::{AppState, QueryCache};
use chrono::NaiveDate;
use tracing::info;

/// Everything one recomputation produces
#[derive(Debug, Clone)]
pub struct ExplorerView {
    /// Parameters actually queried: companies resolved, dates clamped
    pub resolved: QueryParameters,
    pub main: ResultTable,
    pub averages: ResultTable,
    pub stats: ResultTable,
    pub main_chart: ChartSpec,
    pub average_charts: Vec<ChartSpec>,
    pub stats_page: Page,
    /// User-facing fetch problems; an empty table without a warning means
    /// "no data for current filters", not failure
    pub warnings: Vec<String>,
}

/// Explorer recomputation logic
pub struct ExplorerService;

impl ExplorerService {
    /// Run one full recomputation for the given parameter set.
    ///
    /// Returns `Err` only for invalid parameters (a caller bug the UI
    /// should prevent); warehouse trouble degrades to empty tables plus
    /// warnings.
    pub fn recompute(state: &AppState, params: &QueryParameters) -> Result<ExplorerView> {
        params.validate()?;

        info!(
            "Recompute: {} companies selected, {}..{}, metric={:?}, agg={:?}, chart={:?}",
            params.companies.len(),
            params.start_date,
            params.end_date,
            params.metric,
            params.aggregation,
            params.chart_type
        );
        state.event_log.info(&format!(
            "Parameters changed: companies={}, range={}..{}, metric={}, aggregation={}, chart={}, smoothing={}, window={}",
            if params.companies.is_empty() {
                "all".to_string()
            } else {
                params.companies.len().to_string()
            },
            params.start_date,
            params.end_date,
            params.metric.column(),
            params.aggregation.label(),
            params.chart_type.label(),
            params.smoothing_enabled,
            params.smoothing_window_days
        ));

        let catalog = CatalogService::catalog(state);

        let mut resolved = params.clone();
        resolved.companies = CatalogService::resolve_companies(params, &catalog);
        let (start, end) = CatalogService::clamp_dates(params, &catalog);
        resolved.start_date = start;
        resolved.end_date = end;

        let mut warnings = Vec::new();
        if catalog.is_empty() {
            warnings.push("No companies available in the warehouse".to_string());
        }

        // The three fetches are read-only and order-independent
        let main = Self::fetch_shape(state, &resolved, QueryShape::Main, &mut warnings);
        let averages = Self::fetch_shape(state, &resolved, QueryShape::Averages, &mut warnings);
        let stats = Self::fetch_shape(state, &resolved, QueryShape::Stats, &mut warnings);

        let main_chart = chart::map_to_chart(&main, &resolved);
        let average_charts = chart::average_metric_titles()
            .iter()
            .map(|(column, title)| chart::average_metric_chart(resolved.chart_type, column, title))
            .collect();

        let stats_page = {
            let mut pagination = state.pagination.write();
            pagination.sync(&stats);
            pagination.current(&stats)
        };

        Ok(ExplorerView {
            resolved,
            main,
            averages,
            stats,
            main_chart,
            average_charts,
            stats_page,
            warnings,
        })
    }

    /// Window the stats table of a previous pass at the current pagination
    /// state (prior/next page buttons, rows-per-page changes)
    pub fn stats_page(state: &AppState, stats: &ResultTable) -> Page {
        let mut pagination = state.pagination.write();
        pagination.sync(stats);
        pagination.current(stats)
    }

    /// Top companies by total traded volume over the range. Same
    /// fetch-failure policy as the main pass: failures come back as an
    /// empty table, never an error.
    pub fn top_by_volume(
        state: &AppState,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> Result<ResultTable> {
        let query = query::build_top_by_volume(start, end, limit)?;
        state
            .event_log
            .info(&format!("Fetching top {limit} companies by volume"));

        Ok(match state.warehouse.run(&query) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!("Top-by-volume fetch failed: {}", e);
                state
                    .event_log
                    .error(&format!("Data fetch failed (top-by-volume): {e}"));
                ResultTable::empty(query.column_names())
            }
        })
    }

    /// One shape through the cache, with the fetch-failure policy applied:
    /// any execution failure is caught, logged, reported as a warning, and
    /// replaced by an empty table carrying the shape's schema.
    fn fetch_shape(
        state: &AppState,
        resolved: &QueryParameters,
        shape: QueryShape,
        warnings: &mut Vec<String>,
    ) -> ResultTable {
        let label = match shape {
            QueryShape::Main => "main",
            QueryShape::Averages => "average metrics",
            QueryShape::Stats => "summary stats",
        };

        let empty = || {
            let names = query::shape_columns(resolved, shape)
                .iter()
                .map(|c| c.name.clone())
                .collect();
            ResultTable::empty(names)
        };

        if resolved.companies.is_empty() {
            // nothing selectable; never issue an empty IN query, but keep
            // the shape's schema so downstream rendering sees its columns
            return empty();
        }

        let query = match query::build_query(resolved, shape) {
            Ok(q) => q,
            Err(e) => {
                state
                    .event_log
                    .error(&format!("Could not build {label} query: {e}"));
                warnings.push(format!("Couldn't fetch {label} data: {e}"));
                return empty();
            }
        };

        let cache_key = QueryCache::key(resolved, shape).ok();
        if let Some(key) = &cache_key {
            if let Some(table) = state.query_cache.get(key) {
                tracing::debug!("Cache hit for {} query", label);
                return table;
            }
        }

        match state.warehouse.run(&query) {
            Ok(table) => {
                state
                    .event_log
                    .info(&format!("Fetched {} rows for {label} query", table.len()));
                if let Some(key) = cache_key {
                    state.query_cache.insert(key, table.clone());
                }
                table
            }
            Err(e) => {
                tracing::error!("{} fetch failed: {}", label, e);
                state
                    .event_log
                    .error(&format!("Data fetch failed ({label}): {e}"));
                warnings.push(format!("Couldn't fetch {label} data: {e}"));
                ResultTable::empty(query.column_names())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::table::StockRow;
    use crate::db::Warehouse;
    use crate::params::{Aggregation, ChartType, Metric};
    use std::sync::Arc;
    use std::time::Duration;

    fn seeded_state() -> AppState {
        let warehouse = Warehouse::open_in_memory().unwrap();
        warehouse
            .insert_rows(&[StockRow {
                company: "AAPL".to_string(),
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                open: 100.0,
                high: 110.0,
                low: 95.0,
                close: 105.0,
                volume: 1_000,
            }])
            .unwrap();
        AppState::with_warehouse(Arc::new(warehouse), Duration::from_secs(3600))
    }

    fn params() -> QueryParameters {
        QueryParameters {
            companies: Vec::new(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            metric: Metric::Close,
            aggregation: Aggregation::Average,
            chart_type: ChartType::Bar,
            smoothing_enabled: false,
            smoothing_window_days: 7,
        }
    }

    #[test]
    fn test_fetch_failure_degrades_to_empty_tables() {
        let state = seeded_state();
        // catalog loads fine, then the warehouse breaks mid-session
        let _ = CatalogService::catalog(&state);
        state.warehouse.drop_stock_table();

        let view = ExplorerService::recompute(&state, &params()).unwrap();

        assert!(view.main.is_empty());
        assert!(view.stats.is_empty());
        assert!(!view.warnings.is_empty());
        assert!(view.warnings.iter().any(|w| w.contains("Couldn't fetch")));
        assert!(state.event_log.snapshot().contains("Data fetch failed"));
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let state = seeded_state();
        let _ = CatalogService::catalog(&state);
        state.warehouse.drop_stock_table();

        let view = ExplorerService::recompute(&state, &params()).unwrap();
        assert!(!view.warnings.is_empty());
        assert!(state.query_cache.is_empty());
    }

    #[test]
    fn test_empty_catalog_tables_keep_their_schemas() {
        let warehouse = Warehouse::open_in_memory().unwrap();
        let state = AppState::with_warehouse(Arc::new(warehouse), Duration::from_secs(3600));

        let view = ExplorerService::recompute(&state, &params()).unwrap();

        assert!(view
            .warnings
            .iter()
            .any(|w| w.contains("No companies available")));
        assert_eq!(view.main.columns, vec!["company", "close"]);
        assert_eq!(
            view.averages.columns,
            vec![
                "company",
                "avg_open",
                "avg_high",
                "avg_close",
                "avg_low",
                "avg_volume"
            ]
        );
        assert_eq!(
            view.stats.columns,
            vec![
                "company",
                "avg_open",
                "avg_close",
                "avg_high",
                "avg_low",
                "avg_volume"
            ]
        );
        assert!(view.main.is_empty());
    }

    #[test]
    fn test_invalid_params_propagate() {
        let state = seeded_state();
        let mut p = params();
        p.end_date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert!(ExplorerService::recompute(&state, &p).is_err());
    }

    #[test]
    fn test_second_recompute_hits_cache() {
        let state = seeded_state();
        let view = ExplorerService::recompute(&state, &params()).unwrap();
        assert!(view.warnings.is_empty());
        assert_eq!(state.query_cache.len(), 3);

        // breaking the warehouse now is invisible: results come from cache
        state.warehouse.drop_stock_table();
        let cached = ExplorerService::recompute(&state, &params()).unwrap();
        assert_eq!(cached.main, view.main);
        assert!(cached.warnings.is_empty());
    }
}
