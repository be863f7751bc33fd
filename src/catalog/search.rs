//! Partial-name search and grouping
//!
//! Hits are grouped by base item name (dosage suffix stripped); each group
//! collects its insurance values and source files without duplicates, in
//! first-seen order.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::model::{GroupedResult, MedicineRecord, DETAIL_SEPARATOR};
use crate::core::normalize::{base_item_name, lowercase_trim, normalize};

/// How a query is compared against item names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Trimmed, lowercased query contained in the lowercased item name
    #[default]
    Raw,
    /// Normalized query contained in the normalized item name
    Normalized,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(MatchMode::Raw),
            "normalized" | "normalised" => Ok(MatchMode::Normalized),
            _ => Err(format!("Unknown match mode: {}", s)),
        }
    }
}

/// Records whose item name contains the query. An empty query matches everything.
pub fn partial_matches<'a>(
    records: &'a [MedicineRecord],
    query: &str,
    mode: MatchMode,
) -> Vec<&'a MedicineRecord> {
    match mode {
        MatchMode::Raw => {
            let needle = lowercase_trim(query);
            records
                .iter()
                .filter(|r| r.item_name.to_lowercase().contains(&needle))
                .collect()
        }
        MatchMode::Normalized => {
            let needle = normalize(query);
            records
                .iter()
                .filter(|r| normalize(&r.item_name).contains(&needle))
                .collect()
        }
    }
}

#[derive(Default)]
struct GroupAccumulator {
    insurance: IndexSet<String>,
    source_files: IndexSet<String>,
}

/// Group records by base item name, in first-seen order of each base name
pub fn group_by_base_name<'a>(
    matches: impl IntoIterator<Item = &'a MedicineRecord>,
) -> Vec<GroupedResult> {
    let mut groups: IndexMap<String, GroupAccumulator> = IndexMap::new();

    for record in matches {
        let group = groups.entry(base_item_name(&record.item_name)).or_default();
        group.insurance.insert(record.insurance.clone());
        group.source_files.insert(record.source_file.clone());
    }

    groups
        .into_iter()
        .map(|(base, group)| GroupedResult {
            base_item_name: base,
            merged_detail: group
                .insurance
                .into_iter()
                .collect::<Vec<_>>()
                .join(DETAIL_SEPARATOR),
            source_files: group.source_files.into_iter().collect(),
        })
        .collect()
}

/// Partial search grouped by base item name
pub fn search_partial(
    records: &[MedicineRecord],
    query: &str,
    mode: MatchMode,
) -> Vec<GroupedResult> {
    tracing::debug!(query, normalized = %normalize(query), ?mode, "partial search");

    let matches = partial_matches(records, query, mode);
    let groups = group_by_base_name(matches.iter().copied());

    tracing::debug!(matches = matches.len(), groups = groups.len(), "partial search done");
    groups
}

/// Records whose normalized item name equals the normalized `name`
pub fn find_exact(records: &[MedicineRecord], name: &str) -> Vec<MedicineRecord> {
    let key = normalize(name);
    records
        .iter()
        .filter(|r| normalize(&r.item_name) == key)
        .cloned()
        .collect()
}
