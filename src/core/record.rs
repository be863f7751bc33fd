//! Row to record mapping
//!
//! Rows are positional; a `ColumnLayout` says which column feeds which field.

use serde::{Deserialize, Serialize};

use crate::core::error::{DurError, Result};
use crate::core::model::MedicineRecord;
use crate::core::normalize::BOM;

/// Minimum number of columns every row is padded to
pub const MIN_COLUMNS: usize = 10;

/// Column index of each record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub item_name: usize,
    pub ingredient_code: usize,
    pub product_code: usize,
    pub company: usize,
    pub date: usize,
    pub notice_number: usize,
    pub detail: usize,
    pub note: usize,
    pub insurance: usize,
}

impl Default for ColumnLayout {
    /// Layout shared by all published DUR item lists
    fn default() -> Self {
        Self {
            ingredient_code: 0,
            product_code: 1,
            company: 2,
            item_name: 3,
            date: 4,
            notice_number: 5,
            detail: 6,
            note: 7,
            insurance: 8,
        }
    }
}

impl ColumnLayout {
    /// Highest column index the layout reads
    pub fn max_index(&self) -> usize {
        [
            self.item_name,
            self.ingredient_code,
            self.product_code,
            self.company,
            self.date,
            self.notice_number,
            self.detail,
            self.note,
            self.insurance,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// What to do with rows shorter than the minimum column count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Pad with empty strings
    #[default]
    Pad,
    /// Reject with `DurError::ShortRow`
    Strict,
}

/// Pad `row` with empty strings up to `min_len`. Longer rows are left alone.
pub fn pad_row(mut row: Vec<String>, min_len: usize) -> Vec<String> {
    if row.len() < min_len {
        row.resize(min_len, String::new());
    }
    row
}

/// Parses raw rows of one source file
#[derive(Debug, Clone)]
pub struct RecordParser {
    layout: ColumnLayout,
    min_columns: usize,
    policy: RowPolicy,
    source_file: String,
}

impl RecordParser {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            layout: ColumnLayout::default(),
            min_columns: MIN_COLUMNS,
            policy: RowPolicy::Pad,
            source_file: source_file.into(),
        }
    }

    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = min_columns;
        self
    }

    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Map one data row to a record. `line` is only used for error reporting.
    pub fn parse_row(&self, row: Vec<String>, line: u64) -> Result<MedicineRecord> {
        if self.policy == RowPolicy::Strict && row.len() < self.min_columns {
            return Err(DurError::ShortRow {
                file: self.source_file.clone(),
                line,
                expected: self.min_columns,
                found: row.len(),
            });
        }

        // The layout may reach past the minimum; never index out of bounds
        let width = self.min_columns.max(self.layout.max_index() + 1);
        let mut cols = pad_row(row, width);

        if let Some(stripped) = cols[0].strip_prefix(BOM) {
            cols[0] = stripped.to_string();
        }

        let l = &self.layout;
        Ok(MedicineRecord {
            item_name: cols[l.item_name].clone(),
            ingredient_code: cols[l.ingredient_code].clone(),
            product_code: cols[l.product_code].clone(),
            company: cols[l.company].clone(),
            date: cols[l.date].clone(),
            notice_number: cols[l.notice_number].clone(),
            detail: cols[l.detail].clone(),
            note: cols[l.note].clone(),
            insurance: cols[l.insurance].clone(),
            source_file: self.source_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pad_row_short() {
        let padded = pad_row(row(&["a", "b", "c"]), 10);
        assert_eq!(padded.len(), 10);
        assert!(padded[3..].iter().all(String::is_empty));
    }

    #[test]
    fn test_pad_row_never_truncates() {
        let padded = pad_row(row(&["1"; 12]), 10);
        assert_eq!(padded.len(), 12);
    }

    #[test]
    fn test_parse_full_row() {
        let parser = RecordParser::new("노인주의.csv");
        let record = parser
            .parse_row(
                row(&[
                    "A01", "642100410", "한국얀센", "쿠에티아핀정25밀리그램", "20250601",
                    "2025-123", "조현병", "노인주의", "급여", "extra",
                ]),
                2,
            )
            .unwrap();

        assert_eq!(record.ingredient_code, "A01");
        assert_eq!(record.product_code, "642100410");
        assert_eq!(record.company, "한국얀센");
        assert_eq!(record.item_name, "쿠에티아핀정25밀리그램");
        assert_eq!(record.date, "20250601");
        assert_eq!(record.notice_number, "2025-123");
        assert_eq!(record.detail, "조현병");
        assert_eq!(record.note, "노인주의");
        assert_eq!(record.insurance, "급여");
        assert_eq!(record.source_file, "노인주의.csv");
    }

    #[test]
    fn test_parse_short_row_pads_with_empty() {
        let parser = RecordParser::new("a.csv");
        let record = parser.parse_row(row(&["A01", "P01", "회사"]), 2).unwrap();

        assert_eq!(record.ingredient_code, "A01");
        assert_eq!(record.product_code, "P01");
        assert_eq!(record.company, "회사");
        assert_eq!(record.item_name, "");
        assert_eq!(record.date, "");
        assert_eq!(record.notice_number, "");
        assert_eq!(record.detail, "");
        assert_eq!(record.note, "");
        assert_eq!(record.insurance, "");
    }

    #[test]
    fn test_parse_long_row_ignores_extra_columns() {
        let parser = RecordParser::new("a.csv");
        let fields: Vec<String> = (0..12).map(|i| format!("c{}", i)).collect();
        let record = parser.parse_row(fields, 2).unwrap();

        assert_eq!(record.insurance, "c8");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("c9"));
        assert!(!json.contains("c10"));
        assert!(!json.contains("c11"));
    }

    #[test]
    fn test_parse_strips_leading_bom() {
        let parser = RecordParser::new("a.csv");
        let record = parser.parse_row(row(&["\u{feff}A01"]), 1).unwrap();
        assert_eq!(record.ingredient_code, "A01");
    }

    #[test]
    fn test_parse_empty_row() {
        let parser = RecordParser::new("a.csv");
        let record = parser.parse_row(Vec::new(), 5).unwrap();
        assert_eq!(record.item_name, "");
        assert_eq!(record.source_file, "a.csv");
    }

    #[test]
    fn test_strict_policy_rejects_short_row() {
        let parser = RecordParser::new("a.csv").with_policy(RowPolicy::Strict);
        let err = parser.parse_row(row(&["a", "b"]), 7).unwrap_err();
        match err {
            DurError::ShortRow {
                file,
                line,
                expected,
                found,
            } => {
                assert_eq!(file, "a.csv");
                assert_eq!(line, 7);
                assert_eq!(expected, MIN_COLUMNS);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_layout() {
        let layout = ColumnLayout {
            item_name: 11,
            ..ColumnLayout::default()
        };
        let parser = RecordParser::new("a.csv").with_layout(layout);
        let record = parser.parse_row(row(&["x"]), 2).unwrap();
        assert_eq!(record.item_name, "");
        assert_eq!(layout.max_index(), 11);
    }
}
