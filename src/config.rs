//! Explorer configuration

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-level configuration. `warehouse_path = None` opens an in-memory
/// warehouse (dev and tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub warehouse_path: Option<PathBuf>,

    /// Query-result cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_log_filter() -> String {
    "stock_explorer=debug".to_string()
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            warehouse_path: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl ExplorerConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ExplorerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(AppError::Config(
                "cache_ttl_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
