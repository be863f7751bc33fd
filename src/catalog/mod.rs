//! Catalog module - Builds and queries the in-memory medicine catalog
//!
//! Provides:
//! - Source file loading (sniff, decode, parse)
//! - The snapshot-swapping `Catalog` object
//! - Partial search with base-name grouping
//! - Exact lookup and lookup diagnostics

pub mod debug;
pub mod loader;
pub mod search;
pub mod store;

pub use loader::{LoadMode, LoadReport, LoaderConfig, DEFAULT_DUR_FILES};
pub use search::MatchMode;
pub use store::{Catalog, CatalogSnapshot};
