//! Services Layer
//!
//! Business logic over the warehouse, called by whatever surface hosts the
//! explorer (desktop shell, notebook, CLI).
//!
//! # Services
//!
//! - `CatalogService` - Company catalog and date bounds, cached per process
//! - `ExplorerService` - Full recomputation pass for a parameter set
//! - `ExportService` - CSV rendering of the stats table

pub mod catalog_service;
pub mod explorer_service;
pub mod export_service;

// Re-export commonly used types and services
pub use catalog_service::{Catalog, CatalogService};
pub use explorer_service::{ExplorerService, ExplorerView};
pub use export_service::ExportService;
