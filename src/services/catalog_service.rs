//! Catalog Service
//!
//! Process-lifetime view of what the warehouse contains: the distinct
//! company identifiers and the observed date range. The catalog is
//! append-mostly upstream, so one fetch per process is acceptable.

use crate::params::QueryParameters;
use crate::state::AppState;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Companies and date bounds known to the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Alphabetically ordered, deduplicated
    pub companies: Vec<String>,
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl Catalog {
    /// Degenerate catalog used when the warehouse is empty or unreachable;
    /// the UI must tolerate zero selectable companies
    pub fn empty() -> Self {
        let today = Utc::now().date_naive();
        Self {
            companies: Vec::new(),
            earliest: today,
            latest: today,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

/// Catalog lookup with process-lifetime caching
pub struct CatalogService;

impl CatalogService {
    /// Get the catalog, fetching it on first use.
    ///
    /// A failed fetch degrades to an empty catalog and is reported through
    /// the event log; it never propagates. Only successful fetches are
    /// cached, so the next call retries.
    pub fn catalog(state: &AppState) -> Catalog {
        if let Some(catalog) = state.catalog.read().as_ref() {
            return catalog.clone();
        }

        state.event_log.info("Fetching company list");
        match Self::fetch(state) {
            Ok(catalog) => {
                tracing::debug!("Catalog loaded: {} companies", catalog.companies.len());
                *state.catalog.write() = Some(catalog.clone());
                catalog
            }
            Err(e) => {
                state
                    .event_log
                    .error(&format!("Company list fetch failed: {e}"));
                Catalog::empty()
            }
        }
    }

    fn fetch(state: &AppState) -> crate::error::Result<Catalog> {
        let companies = state.warehouse.list_companies()?;
        let bounds = state.warehouse.date_bounds()?;

        Ok(match bounds {
            Some((earliest, latest)) => Catalog {
                companies,
                earliest,
                latest,
            },
            None => Catalog::empty(),
        })
    }

    /// Companies to query: the user's selection, or the full catalog when
    /// the selection is empty. The warehouse is never queried with an
    /// empty `IN` set.
    pub fn resolve_companies(params: &QueryParameters, catalog: &Catalog) -> Vec<String> {
        if params.companies.is_empty() {
            catalog.companies.clone()
        } else {
            params.companies.clone()
        }
    }

    /// Clamp the requested range to the catalog's observed [earliest, latest]
    pub fn clamp_dates(params: &QueryParameters, catalog: &Catalog) -> (NaiveDate, NaiveDate) {
        let start = params.start_date.clamp(catalog.earliest, catalog.latest);
        let end = params.end_date.clamp(catalog.earliest, catalog.latest);
        (start, end)
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

    fn catalog() -> Catalog {
        Catalog {
            companies: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            earliest: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            latest: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        }
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
    fn test_empty_selection_substitutes_catalog() {
        let resolved = CatalogService::resolve_companies(&params(), &catalog());
        assert_eq!(resolved, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_explicit_selection_kept() {
        let mut p = params();
        p.companies = vec!["B".to_string()];
        let resolved = CatalogService::resolve_companies(&p, &catalog());
        assert_eq!(resolved, vec!["B"]);
    }

    #[test]
    fn test_dates_clamped_to_catalog_range() {
        let mut p = params();
        p.start_date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        p.end_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let (start, end) = CatalogService::clamp_dates(&p, &catalog());
        assert_eq!(start, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_in_range_dates_untouched() {
        let p = params();
        let (start, end) = CatalogService::clamp_dates(&p, &catalog());
        assert_eq!((start, end), (p.start_date, p.end_date));
    }

    #[test]
    fn test_empty_catalog_bounds() {
        let c = Catalog::empty();
        assert!(c.is_empty());
        assert_eq!(c.earliest, c.latest);
    }

    #[test]
    fn test_failed_fetch_is_not_cached_and_retries() {
        let warehouse = Warehouse::open_in_memory().unwrap();
        let state = AppState::with_warehouse(Arc::new(warehouse), Duration::from_secs(3600));
        state.warehouse.drop_stock_table();

        let degraded = CatalogService::catalog(&state);
        assert!(degraded.is_empty());
        assert!(state.catalog.read().is_none());
        assert!(state
            .event_log
            .snapshot()
            .contains("Company list fetch failed"));

        // warehouse comes back; the next call succeeds and is cached
        state.warehouse.restore_stock_table();
        state
            .warehouse
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

        let recovered = CatalogService::catalog(&state);
        assert_eq!(recovered.companies, vec!["AAPL"]);
        assert!(state.catalog.read().is_some());
    }
}
