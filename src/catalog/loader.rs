//! Source file loading
//!
//! One pass per file: sniff encoding, decode, pick the delimiter from the
//! first line, skip the header row, map every data row to a record.

use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

use crate::core::error::{DurError, Result};
use crate::core::model::MedicineRecord;
use crate::core::record::{ColumnLayout, RecordParser, RowPolicy, MIN_COLUMNS};
use crate::core::sniff::{
    choose_delimiter, decode_bytes, default_overrides, first_line, sniff_encoding,
    DecodeStrategy, Delimiter, EncodingOverride, DEFAULT_SAMPLE_SIZE,
};

/// The published DUR item lists, relative to the data directory
pub const DEFAULT_DUR_FILES: [&str; 5] = [
    "csv/의약품안전사용서비스(DUR)_노인주의 품목리스트 2025.6.csv",
    "csv/의약품안전사용서비스(DUR)_노인주의(해열진통소염제) 품목리스트 2025.6.csv",
    "csv/의약품안전사용서비스(DUR)_병용금기 품목리스트 2025.6.csv",
    "csv/의약품안전사용서비스(DUR)_연령금기 품목리스트 2025.6.csv",
    "csv/의약품안전사용서비스(DUR)_임부금기 품목리스트 2025.6.csv",
];

/// Number of parsed rows echoed at debug level per file
const PREVIEW_ROWS: usize = 5;

/// How records of several files combine into one catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Each file replaces what the previous file loaded; only the last file survives
    ReplacePerFile,
    /// The catalog is the union of all files, in file order
    Merge,
}

impl std::str::FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace-per-file" | "replace" => Ok(LoadMode::ReplacePerFile),
            "merge" => Ok(LoadMode::Merge),
            _ => Err(format!("Unknown load mode: {}", s)),
        }
    }
}

/// Configuration for loading source files
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Bytes inspected for encoding detection
    pub sample_size: usize,

    /// Encoding used when the sample carries no signal
    pub default_encoding: &'static Encoding,

    /// File-name based encoding overrides
    pub overrides: Vec<EncodingOverride>,

    /// Rows are padded (or rejected) below this width
    pub min_columns: usize,

    pub layout: ColumnLayout,

    pub row_policy: RowPolicy,

    pub decode: DecodeStrategy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            default_encoding: UTF_8,
            overrides: default_overrides(),
            min_columns: MIN_COLUMNS,
            layout: ColumnLayout::default(),
            row_policy: RowPolicy::Pad,
            decode: DecodeStrategy::Lossy,
        }
    }
}

/// What happened to one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub source_file: String,
    pub encoding: String,
    pub detected_encoding: String,
    pub encoding_overridden: bool,
    pub delimiter: Delimiter,
    pub records: usize,
    pub lossy: bool,
    /// XXH3 of the raw file bytes
    pub hash: String,
}

/// Summary of one catalog build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub mode: LoadMode,
    pub files: Vec<FileReport>,
    /// Records in the resulting catalog
    pub total_records: usize,
    pub loaded_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn empty(mode: LoadMode) -> Self {
        Self {
            mode,
            files: Vec::new(),
            total_records: 0,
            loaded_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for file in &self.files {
            writeln!(
                f,
                "{} - encoding = {}{}, delimiter = {:?}, {} records{}",
                file.path,
                file.encoding,
                if file.encoding_overridden {
                    format!(" (detected {})", file.detected_encoding)
                } else {
                    String::new()
                },
                file.delimiter,
                file.records,
                if file.lossy { ", lossy decode" } else { "" }
            )?;
        }
        write!(
            f,
            "catalog: {} records ({:?})",
            self.total_records, self.mode
        )
    }
}

/// Basename used as the provenance tag of every record
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Resolve the files to load: explicit ones relative to `data_dir` unless
/// absolute, otherwise the compiled-in DUR list.
pub fn resolve_files(data_dir: &Path, explicit: &[PathBuf]) -> Vec<PathBuf> {
    if explicit.is_empty() {
        DEFAULT_DUR_FILES.iter().map(|f| data_dir.join(f)).collect()
    } else {
        explicit
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    data_dir.join(p)
                }
            })
            .collect()
    }
}

/// Split decoded text into raw rows with their starting line number.
///
/// A row continues onto the next line while a quoted field is open. Blank
/// lines come back as empty rows.
pub fn split_rows(text: &str) -> Vec<(u64, String)> {
    let mut rows = Vec::new();
    let mut pending: Option<(u64, String)> = None;

    for (idx, line) in text.lines().enumerate() {
        let (start, mut row) = match pending.take() {
            Some((start, mut row)) => {
                row.push('\n');
                (start, row)
            }
            None => (idx as u64 + 1, String::new()),
        };
        row.push_str(line);

        // Odd quote count means a quoted field spans the line break
        if row.matches('"').count() % 2 == 1 {
            pending = Some((start, row));
        } else {
            rows.push((start, row));
        }
    }

    rows.extend(pending);
    rows
}

/// Split one raw row into fields. A blank row has no fields.
pub fn parse_fields(path: &Path, row: &str, delimiter: Delimiter) -> Result<Vec<String>> {
    if row.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(row.as_bytes());

    match reader.records().next() {
        Some(record) => {
            let record = record.map_err(|e| DurError::csv(path, e))?;
            Ok(record.iter().map(str::to_string).collect())
        }
        None => Ok(Vec::new()),
    }
}

/// Parse decoded text. The first row is always treated as a header.
pub fn parse_text(
    path: &Path,
    text: &str,
    delimiter: Delimiter,
    parser: &RecordParser,
) -> Result<Vec<MedicineRecord>> {
    let mut records = Vec::new();

    for (idx, (line, row)) in split_rows(text).into_iter().skip(1).enumerate() {
        let fields = parse_fields(path, &row, delimiter)?;

        if idx < PREVIEW_ROWS {
            tracing::debug!(file = parser.source_file(), line, ?fields, "parsed row");
        }

        records.push(parser.parse_row(fields, line)?);
    }

    Ok(records)
}

/// Load a single source file
pub fn load_file(path: &Path, config: &LoaderConfig) -> Result<(Vec<MedicineRecord>, FileReport)> {
    let choice = sniff_encoding(
        path,
        config.sample_size,
        config.default_encoding,
        &config.overrides,
    )?;

    if choice.overridden {
        tracing::warn!(
            path = %path.display(),
            detected = choice.detected.name(),
            forced = choice.encoding.name(),
            "encoding override applied"
        );
    }

    let bytes = fs::read(path).map_err(|e| DurError::io(path, e))?;
    let decoded = decode_bytes(&bytes, choice.encoding, config.decode);

    if decoded.lossy {
        tracing::warn!(
            path = %path.display(),
            encoding = choice.encoding.name(),
            strategy = ?config.decode,
            "undecodable bytes in source file"
        );
    }

    let delimiter = choose_delimiter(first_line(&decoded.text));
    let source_file = source_file_name(path);

    let parser = RecordParser::new(source_file.clone())
        .with_layout(config.layout)
        .with_min_columns(config.min_columns)
        .with_policy(config.row_policy);

    let records = parse_text(path, &decoded.text, delimiter, &parser)?;

    tracing::info!(
        path = %path.display(),
        encoding = choice.encoding.name(),
        ?delimiter,
        records = records.len(),
        "loaded source file"
    );

    let report = FileReport {
        path: path.display().to_string(),
        source_file,
        encoding: choice.encoding.name().to_string(),
        detected_encoding: choice.detected.name().to_string(),
        encoding_overridden: choice.overridden,
        delimiter,
        records: records.len(),
        lossy: decoded.lossy,
        hash: format!("{:016x}", xxh3_64(&bytes)),
    };

    Ok((records, report))
}

/// Load files in order. Any failing file fails the whole load.
pub fn load_files(
    paths: &[PathBuf],
    mode: LoadMode,
    config: &LoaderConfig,
) -> Result<(Vec<MedicineRecord>, LoadReport)> {
    if paths.is_empty() {
        return Err(DurError::NoFiles);
    }

    let mut catalog: Vec<MedicineRecord> = Vec::new();
    let mut report = LoadReport::empty(mode);

    for path in paths {
        let (records, file_report) = load_file(path, config)?;

        match mode {
            LoadMode::ReplacePerFile => catalog = records,
            LoadMode::Merge => catalog.extend(records),
        }

        report.files.push(file_report);
    }

    report.total_records = catalog.len();
    report.loaded_at = Utc::now();

    tracing::info!(total = catalog.len(), ?mode, "catalog built");

    Ok((catalog, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use tempfile::TempDir;

    const HEADER: &str = "성분코드,제품코드,업소명,제품명,공고일자,공고번호,상세정보,비고,급여구분";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_comma_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "노인주의.csv",
            &format!(
                "{}\nA01,P01,한국얀센,쿠에티아핀정25밀리그램,20250601,1,조현병,주의,급여\n",
                HEADER
            ),
        );

        let (records, report) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_name, "쿠에티아핀정25밀리그램");
        assert_eq!(records[0].source_file, "노인주의.csv");
        assert_eq!(report.delimiter, Delimiter::Comma);
        assert_eq!(report.records, 1);
        assert_eq!(report.hash.len(), 16);
    }

    #[test]
    fn test_load_tab_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tab.csv",
            "a\tb\tc\td\n성분\t제품\t회사\t게보린정\n",
        );

        let (records, report) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(report.delimiter, Delimiter::Tab);
        assert_eq!(records[0].item_name, "게보린정");
        assert_eq!(records[0].insurance, "");
    }

    #[test]
    fn test_header_only_file_has_no_records() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.csv", &format!("{}\n", HEADER));

        let (records, report) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "short.csv", &format!("{}\nA01,P01\n", HEADER));

        let (records, _) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_code, "P01");
        assert_eq!(records[0].item_name, "");
    }

    #[test]
    fn test_blank_lines_become_empty_records() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "blank.csv",
            "h1,h2,h3,h4\nA,P,C,게보린정,,,,,급여\n\nA,P,C,판콜,,,,,급여\n",
        );

        let (records, report) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(report.records, 3);
        assert_eq!(records[1].item_name, "");
        assert_eq!(records[1].insurance, "");
        assert_eq!(records[1].source_file, "blank.csv");
        assert_eq!(records[2].item_name, "판콜");
    }

    #[test]
    fn test_split_rows_keeps_quoted_line_breaks() {
        let rows = split_rows("h\nA,\"line one\nline two\",B\n\nC\n");
        assert_eq!(
            rows,
            vec![
                (1, "h".to_string()),
                (2, "A,\"line one\nline two\",B".to_string()),
                (4, String::new()),
                (5, "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_fields_quoted() {
        let path = Path::new("a.csv");
        let fields = parse_fields(path, "A,\"x, y\",\"a\nb\"", Delimiter::Comma).unwrap();
        assert_eq!(fields, vec!["A", "x, y", "a\nb"]);
        assert!(parse_fields(path, "", Delimiter::Tab).unwrap().is_empty());
    }

    #[test]
    fn test_strict_rows_fail_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "short.csv", &format!("{}\nA01,P01\n", HEADER));
        let config = LoaderConfig {
            row_policy: RowPolicy::Strict,
            ..Default::default()
        };

        let result = load_file(&path, &config);
        assert!(matches!(result, Err(DurError::ShortRow { line: 2, .. })));
    }

    #[test]
    fn test_override_decodes_cp949_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("DUR_임부금기.csv");
        let content = format!("{}\nA01,P01,동아제약,박카스디액,20250601,1,,,비급여\n", HEADER);
        let (bytes, _, _) = EUC_KR.encode(&content);
        fs::write(&path, &bytes).unwrap();

        let (records, report) = load_file(&path, &LoaderConfig::default()).unwrap();
        assert!(report.encoding_overridden);
        assert_eq!(report.encoding, "EUC-KR");
        assert_eq!(records[0].item_name, "박카스디액");
        assert_eq!(records[0].insurance, "비급여");
    }

    #[test]
    fn test_invalid_bytes_do_not_abort() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        let mut bytes = b"a,b,c,d\nx,y,z,".to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        bytes.extend_from_slice("정\n".as_bytes());
        fs::write(&path, &bytes).unwrap();

        let config = LoaderConfig {
            default_encoding: UTF_8,
            overrides: Vec::new(),
            ..Default::default()
        };
        let (records, _) = load_file(&path, &config).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_file(Path::new("/nonexistent/노인주의.csv"), &LoaderConfig::default());
        assert!(matches!(result, Err(DurError::Io { .. })));
    }

    #[test]
    fn test_replace_per_file_keeps_only_last_file() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.csv", &format!("{}\nA,P,C,첫째약,,,,,\nA,P,C,둘째약,,,,,\n", HEADER));
        let second = write(&dir, "second.csv", &format!("{}\nA,P,C,셋째약,,,,,\n", HEADER));

        let (records, report) =
            load_files(&[first, second], LoadMode::ReplacePerFile, &LoaderConfig::default())
                .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_name, "셋째약");
        assert_eq!(records[0].source_file, "second.csv");
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].records, 2);
        assert_eq!(report.total_records, 1);
    }

    #[test]
    fn test_merge_keeps_all_files_in_order() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.csv", &format!("{}\nA,P,C,첫째약,,,,,\n", HEADER));
        let second = write(&dir, "second.csv", &format!("{}\nA,P,C,둘째약,,,,,\n", HEADER));

        let (records, report) =
            load_files(&[first, second], LoadMode::Merge, &LoaderConfig::default()).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.item_name.as_str()).collect();
        assert_eq!(names, vec!["첫째약", "둘째약"]);
        assert_eq!(report.total_records, 2);
    }

    #[test]
    fn test_load_files_fails_on_any_missing_file() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.csv", &format!("{}\nA,P,C,약,,,,,\n", HEADER));
        let missing = dir.path().join("missing.csv");

        let result = load_files(&[first, missing], LoadMode::Merge, &LoaderConfig::default());
        assert!(matches!(result, Err(DurError::Io { .. })));
    }

    #[test]
    fn test_load_files_requires_files() {
        let result = load_files(&[], LoadMode::Merge, &LoaderConfig::default());
        assert!(matches!(result, Err(DurError::NoFiles)));
    }

    #[test]
    fn test_resolve_files_defaults() {
        let files = resolve_files(Path::new("/data"), &[]);
        assert_eq!(files.len(), 5);
        assert!(files[4].to_string_lossy().contains("임부금기"));
        assert!(files[0].starts_with("/data/csv"));
    }

    #[test]
    fn test_resolve_files_explicit() {
        let files = resolve_files(
            Path::new("/data"),
            &[PathBuf::from("a.csv"), PathBuf::from("/abs/b.csv")],
        );
        assert_eq!(files, vec![PathBuf::from("/data/a.csv"), PathBuf::from("/abs/b.csv")]);
    }

    #[test]
    fn test_load_mode_parse() {
        assert_eq!("merge".parse::<LoadMode>().unwrap(), LoadMode::Merge);
        assert_eq!(
            "replace-per-file".parse::<LoadMode>().unwrap(),
            LoadMode::ReplacePerFile
        );
        assert!("append".parse::<LoadMode>().is_err());
    }

    #[test]
    fn test_source_file_name() {
        assert_eq!(source_file_name(Path::new("csv/노인주의.csv")), "노인주의.csv");
    }
}
