//! Stock Market Explorer core
//!
//! Query-construction and data-shaping layer for interactive exploration of
//! historical stock data in an analytical warehouse: build parameterized
//! queries from user-chosen filters, fetch and normalize tabular results,
//! map them to chart specifications, and paginate summary statistics.
//!
//! The rendering/widget surface is a host concern; it constructs a
//! [`params::QueryParameters`] from UI state and calls
//! [`services::ExplorerService::recompute`] on every change.

pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod params;
pub mod query;
pub mod services;
pub mod state;

pub use config::ExplorerConfig;
pub use error::{AppError, Result};
pub use state::AppState;
