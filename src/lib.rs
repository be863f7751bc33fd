//! dursearch - Load the DUR item lists and search them by partial name

pub mod catalog;
pub mod cli;
pub mod core;

pub use crate::catalog::{
    Catalog, CatalogSnapshot, LoadMode, LoadReport, LoaderConfig, MatchMode, DEFAULT_DUR_FILES,
};
pub use crate::core::error::{DurError, Result};
pub use crate::core::model::{GroupedResult, MedicineRecord};
