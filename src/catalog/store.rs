//! The catalog object
//!
//! Readers work on an immutable `CatalogSnapshot`. `reload` builds a new
//! snapshot off to the side and swaps it in, so a query never sees a
//! half-loaded catalog and a failed reload leaves the old one in place.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::catalog::debug::debug_find;
use crate::catalog::loader::{load_files, LoadMode, LoadReport, LoaderConfig};
use crate::catalog::search::{find_exact, search_partial, MatchMode};
use crate::core::error::Result;
use crate::core::model::{DebugReport, GroupedResult, MedicineRecord};

/// Immutable, ordered set of records from one load
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    records: Vec<MedicineRecord>,
    report: LoadReport,
}

impl CatalogSnapshot {
    pub fn new(records: Vec<MedicineRecord>, report: LoadReport) -> Self {
        Self { records, report }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), LoadReport::empty(LoadMode::ReplacePerFile))
    }

    pub fn records(&self) -> &[MedicineRecord] {
        &self.records
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_exact(&self, name: &str) -> Vec<MedicineRecord> {
        find_exact(&self.records, name)
    }

    pub fn search_partial(&self, query: &str, mode: MatchMode) -> Vec<GroupedResult> {
        search_partial(&self.records, query, mode)
    }

    pub fn debug_find(&self, query: &str, preview: usize) -> DebugReport {
        debug_find(&self.records, query, preview)
    }
}

/// Process-wide catalog handle
#[derive(Debug)]
pub struct Catalog {
    config: LoaderConfig,
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl Catalog {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
        }
    }

    /// Current snapshot; stays valid across later reloads
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Load `files` in order and publish the result
    pub fn reload(&self, files: &[PathBuf], mode: LoadMode) -> Result<LoadReport> {
        let (records, report) = load_files(files, mode, &self.config)?;
        let snapshot = Arc::new(CatalogSnapshot::new(records, report.clone()));

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;

        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn find_exact(&self, name: &str) -> Vec<MedicineRecord> {
        self.snapshot().find_exact(name)
    }

    pub fn search_partial(&self, query: &str, mode: MatchMode) -> Vec<GroupedResult> {
        self.snapshot().search_partial(query, mode)
    }

    pub fn debug_find(&self, query: &str, preview: usize) -> DebugReport {
        self.snapshot().debug_find(query, preview)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}
