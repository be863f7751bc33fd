//! Encoding and delimiter sniffing
//!
//! Provides consistent handling for:
//! - Encoding detection from a bounded file prefix (BOM, ASCII, statistical guess)
//! - Hard-coded per-file encoding overrides
//! - Lossy or skipping decode of file bytes
//! - Tab/comma delimiter choice from a sample line

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, EUC_KR, UTF_8};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::core::error::{DurError, Result};

/// Default number of bytes inspected for encoding detection
pub const DEFAULT_SAMPLE_SIZE: usize = 4096;

/// Strategy for bytes that are invalid in the chosen encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeStrategy {
    /// Replace invalid sequences with U+FFFD
    #[default]
    Lossy,
    /// Drop invalid sequences entirely
    Skip,
}

impl std::str::FromStr for DecodeStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lossy" | "replace" => Ok(DecodeStrategy::Lossy),
            "skip" | "ignore" => Ok(DecodeStrategy::Skip),
            _ => Err(format!("Unknown decode strategy: {}", s)),
        }
    }
}

/// Field delimiter of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

/// Forces an encoding for files whose name contains `file_pattern`
#[derive(Debug, Clone)]
pub struct EncodingOverride {
    pub file_pattern: String,
    pub encoding: &'static Encoding,
}

impl EncodingOverride {
    pub fn new(file_pattern: impl Into<String>, label: &str) -> Result<Self> {
        Ok(Self {
            file_pattern: file_pattern.into(),
            encoding: resolve_encoding(label)?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.to_string_lossy().contains(&self.file_pattern)
    }
}

impl std::str::FromStr for EncodingOverride {
    type Err = DurError;

    /// Parse `PATTERN=LABEL`, e.g. `임부금기=cp949`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((pattern, label)) if !pattern.is_empty() && !label.trim().is_empty() => {
                EncodingOverride::new(pattern, label)
            }
            _ => Err(DurError::InvalidOverride(s.to_string())),
        }
    }
}

/// Built-in overrides as (file name substring, encoding label).
/// The pregnancy-contraindication list is published in MS949 but misdetects.
pub const DEFAULT_OVERRIDES: [(&str, &str); 1] = [("임부금기", "cp949")];

pub fn default_overrides() -> Vec<EncodingOverride> {
    DEFAULT_OVERRIDES
        .iter()
        .filter_map(|(pattern, label)| EncodingOverride::new(*pattern, label).ok())
        .collect()
}

/// Encoding chosen for one file
#[derive(Debug, Clone, Copy)]
pub struct EncodingChoice {
    pub encoding: &'static Encoding,
    pub detected: &'static Encoding,
    pub overridden: bool,
}

/// A decoded file body
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// Whether any bytes were replaced or dropped
    pub lossy: bool,
}

/// Resolve an encoding label, accepting the Windows code page names used for Korean
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    match label.trim().to_lowercase().as_str() {
        "cp949" | "ms949" | "uhc" | "windows-949" => Ok(EUC_KR),
        "utf8" => Ok(UTF_8),
        other => Encoding::for_label(other.as_bytes())
            .ok_or_else(|| DurError::UnknownEncoding(label.to_string())),
    }
}

/// Guess the encoding of a byte sample.
///
/// `complete` tells the detector whether the sample is the whole file.
pub fn detect_encoding_from_sample(
    sample: &[u8],
    complete: bool,
    fallback: &'static Encoding,
) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    // Nothing to learn from pure ASCII
    if sample.is_ascii() {
        return fallback;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, complete);
    detector.guess(None, true)
}

/// Read at most `sample_size` bytes from the start of `path`
pub fn read_sample(path: &Path, sample_size: usize) -> Result<(Vec<u8>, bool)> {
    let file = fs::File::open(path).map_err(|e| DurError::io(path, e))?;
    let mut buffer = Vec::with_capacity(sample_size);
    file.take(sample_size as u64 + 1)
        .read_to_end(&mut buffer)
        .map_err(|e| DurError::io(path, e))?;

    let complete = buffer.len() <= sample_size;
    buffer.truncate(sample_size);
    Ok((buffer, complete))
}

/// Detect the encoding of `path`, then apply the first matching override
pub fn sniff_encoding(
    path: &Path,
    sample_size: usize,
    fallback: &'static Encoding,
    overrides: &[EncodingOverride],
) -> Result<EncodingChoice> {
    let (sample, complete) = read_sample(path, sample_size)?;
    let detected = detect_encoding_from_sample(&sample, complete, fallback);

    let choice = match overrides.iter().find(|o| o.matches(path)) {
        Some(o) => EncodingChoice {
            encoding: o.encoding,
            detected,
            overridden: true,
        },
        None => EncodingChoice {
            encoding: detected,
            detected,
            overridden: false,
        },
    };

    Ok(choice)
}

/// Decode bytes, never failing on invalid sequences
pub fn decode_bytes(
    bytes: &[u8],
    encoding: &'static Encoding,
    strategy: DecodeStrategy,
) -> DecodedText {
    let (text, _, had_errors) = encoding.decode(bytes);

    if !had_errors {
        return DecodedText {
            text: text.into_owned(),
            lossy: false,
        };
    }

    let text = match strategy {
        DecodeStrategy::Lossy => text.into_owned(),
        DecodeStrategy::Skip => text.chars().filter(|&c| c != '\u{fffd}').collect(),
    };

    DecodedText { text, lossy: true }
}

/// Pick tab or comma by raw occurrence count; ties go to tab
pub fn choose_delimiter(sample_line: &str) -> Delimiter {
    let tabs = sample_line.matches('\t').count();
    let commas = sample_line.matches(',').count();

    if tabs >= commas {
        Delimiter::Tab
    } else {
        Delimiter::Comma
    }
}

/// First line of decoded text, without its terminator
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
