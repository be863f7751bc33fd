//! Text normalization for name matching
//!
//! Produces matching keys that ignore spacing, punctuation, case and
//! full-width/half-width variants:
//! - NFKC compatibility normalization
//! - BOM / NBSP removal
//! - Only Hangul syllables, ASCII letters and ASCII digits survive
//! - Lowercase

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Byte-order mark as it appears after decoding
pub const BOM: char = '\u{feff}';

const NBSP: char = '\u{a0}';

/// Trailing dosage suffix: digits, "밀리그램", then exactly one more character
static DOSAGE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+밀리그램.$").expect("Invalid DOSAGE_SUFFIX_RE regex"));

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

fn is_key_char(c: char) -> bool {
    is_hangul_syllable(c) || c.is_ascii_alphanumeric()
}

/// Canonicalize `text` into a matching key.
///
/// Pure and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let composed: String = text.nfkc().collect();
    composed
        .trim()
        .chars()
        .filter(|&c| c != BOM && c != NBSP)
        .filter(|&c| is_key_char(c))
        .collect::<String>()
        .to_lowercase()
}

/// Trim and lowercase without any other canonicalization
pub fn lowercase_trim(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Strip a trailing "<digits>밀리그램<one char>" suffix and surrounding whitespace.
///
/// "타이레놀500밀리그램정" becomes "타이레놀". Names without the suffix are only trimmed.
pub fn base_item_name(item_name: &str) -> String {
    DOSAGE_SUFFIX_RE
        .replace(item_name, "")
        .trim()
        .to_string()
}
