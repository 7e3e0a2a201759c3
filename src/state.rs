//! Application state management
//!
//! The explicitly constructed collaborator set that replaces the original
//! ambient client/logger globals: warehouse handle, event log, the
//! process-lifetime catalog cache, the TTL query cache, and the pagination
//! state that survives recomputations.

use crate::config::ExplorerConfig;
use crate::db::table::ResultTable;
use crate::db::Warehouse;
use crate::error::Result;
use crate::logging::EventLog;
use crate::pagination::PaginationState;
use crate::params::QueryParameters;
use crate::query::QueryShape;
use crate::services::catalog_service::Catalog;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cached query result with its insertion time
struct CacheEntry {
    table: ResultTable,
    inserted: Instant,
}

/// TTL cache over query results, keyed by the serialized parameter set plus
/// shape. The per-session parameter space is small, so there is no size
/// bound or LRU; stale entries are dropped on access.
pub struct QueryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cache key: serialized parameters plus the query shape
    pub fn key(params: &QueryParameters, shape: QueryShape) -> Result<String> {
        Ok(format!(
            "{}|{}",
            serde_json::to_string(&shape)?,
            serde_json::to_string(params)?
        ))
    }

    pub fn get(&self, key: &str) -> Option<ResultTable> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted.elapsed() < self.ttl {
                return Some(entry.table.clone());
            }
        }
        // expired entries are removed lazily
        self.entries.remove_if(key, |_, e| e.inserted.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: String, table: ResultTable) {
        self.entries.insert(
            key,
            CacheEntry {
                table,
                inserted: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Application state shared across recomputations
pub struct AppState {
    /// Warehouse connection
    pub warehouse: Arc<Warehouse>,

    /// User-visible event history
    pub event_log: Arc<EventLog>,

    /// Company catalog, fetched once per process
    pub catalog: RwLock<Option<Catalog>>,

    /// Query-result cache
    pub query_cache: QueryCache,

    /// Stats-table pagination state
    pub pagination: RwLock<PaginationState>,
}

impl AppState {
    /// Create application state from configuration
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        config.validate()?;

        let warehouse = match &config.warehouse_path {
            Some(path) => {
                tracing::info!("Opening warehouse at {:?}", path);
                Arc::new(Warehouse::open(path)?)
            }
            None => {
                tracing::info!("Opening in-memory warehouse");
                Arc::new(Warehouse::open_in_memory()?)
            }
        };

        Ok(Self {
            warehouse,
            event_log: Arc::new(EventLog::new()),
            catalog: RwLock::new(None),
            query_cache: QueryCache::new(Duration::from_secs(config.cache_ttl_secs)),
            pagination: RwLock::new(PaginationState::default()),
        })
    }

    /// State over an already-open warehouse (tests, embedding hosts)
    pub fn with_warehouse(warehouse: Arc<Warehouse>, cache_ttl: Duration) -> Self {
        Self {
            warehouse,
            event_log: Arc::new(EventLog::new()),
            catalog: RwLock::new(None),
            query_cache: QueryCache::new(cache_ttl),
            pagination: RwLock::new(PaginationState::default()),
        }
    }
}
