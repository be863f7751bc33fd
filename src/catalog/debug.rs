//! Lookup diagnostics

use crate::core::model::{DebugPreview, DebugReport, MedicineRecord};
use crate::core::normalize::normalize;

/// Records listed at the top of the trace
pub const DEFAULT_PREVIEW: usize = 20;

/// Explain how `query` compares against the catalog.
///
/// The scan stops at the first trimmed-equality hit; an exact hit also
/// satisfies the case-insensitive and normalized comparisons.
pub fn debug_find(records: &[MedicineRecord], query: &str, preview: usize) -> DebugReport {
    let trimmed = query.trim().to_string();
    let lowercased = trimmed.to_lowercase();
    let normalized = normalize(&trimmed);

    let mut exact_match = None;
    let mut ignore_case_match = None;
    let mut normalized_match = None;

    for (idx, record) in records.iter().enumerate() {
        let item = record.item_name.trim();

        if item == trimmed {
            exact_match = Some(idx);
            ignore_case_match.get_or_insert(idx);
            normalized_match.get_or_insert(idx);
            break;
        }
        if ignore_case_match.is_none() && item.to_lowercase() == lowercased {
            ignore_case_match = Some(idx);
        }
        if normalized_match.is_none() && normalize(item) == normalized {
            normalized_match = Some(idx);
        }
    }

    DebugReport {
        raw: query.to_string(),
        trimmed,
        lowercased,
        normalized,
        catalog_size: records.len(),
        preview: records
            .iter()
            .take(preview)
            .enumerate()
            .map(|(index, record)| DebugPreview {
                index,
                record: record.clone(),
            })
            .collect(),
        exact_match,
        ignore_case_match,
        normalized_match,
    }
}
