//! Catalog data model
//!
//! Every query path (CLI output or an embedding request layer) maps to these
//! types before rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed row of a DUR list.
///
/// All fields are plain strings; a column missing from the source row is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRecord {
    /// Display name, possibly with a dosage suffix ("…10밀리그램정")
    pub item_name: String,
    pub ingredient_code: String,
    pub product_code: String,
    /// Manufacturer / business name
    pub company: String,
    /// Announcement date, kept as source text
    pub date: String,
    /// Announcement number, kept as source text
    pub notice_number: String,
    pub detail: String,
    pub note: String,
    /// Coverage / reimbursement status
    pub insurance: String,
    /// Basename of the originating file
    pub source_file: String,
}

/// One group of partial-search hits sharing a base item name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedResult {
    /// Item name with the dosage suffix removed
    #[serde(rename = "item_name")]
    pub base_item_name: String,

    /// De-duplicated insurance values joined with " / ", first-seen order
    #[serde(rename = "detail")]
    pub merged_detail: String,

    /// De-duplicated source files, first-seen order
    #[serde(rename = "source_file")]
    pub source_files: Vec<String>,
}

/// Separator used when merging insurance values
pub const DETAIL_SEPARATOR: &str = " / ";

/// A preview line of the debug trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugPreview {
    pub index: usize,
    pub record: MedicineRecord,
}

/// Introspection report for a name lookup.
///
/// Not a stable format; `Display` renders the human-readable trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub raw: String,
    pub trimmed: String,
    pub lowercased: String,
    pub normalized: String,
    pub catalog_size: usize,
    pub preview: Vec<DebugPreview>,
    /// First index whose trimmed name equals the trimmed query
    pub exact_match: Option<usize>,
    /// First index whose trimmed, lowercased name equals the lowercased query
    pub ignore_case_match: Option<usize>,
    /// First index whose normalized name equals the normalized query
    pub normalized_match: Option<usize>,
}

impl DebugReport {
    pub fn any_match(&self) -> bool {
        self.exact_match.is_some() || self.ignore_case_match.is_some() || self.normalized_match.is_some()
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "▶ debug find - raw query: [{}]", self.raw)?;
        writeln!(f, "   trimmed: [{}]", self.trimmed)?;
        writeln!(f, "   lower: [{}]", self.lowercased)?;
        writeln!(f, "   normalized: [{}]", self.normalized)?;
        writeln!(f, "   catalog size: {}", self.catalog_size)?;

        for entry in &self.preview {
            writeln!(f, "{} item_name_repr: {:?}", entry.index, entry.record.item_name)?;
            writeln!(f, " attrs: {:?}", entry.record)?;
            writeln!(f, "{}", "-".repeat(40))?;
        }

        let show = |idx: Option<usize>| match idx {
            Some(i) => format!("yes (index {})", i),
            None => "no".to_string(),
        };

        writeln!(f, "exact: {}", show(self.exact_match))?;
        writeln!(f, "ignoreCase: {}", show(self.ignore_case_match))?;
        write!(f, "normalized: {}", show(self.normalized_match))
    }
}
