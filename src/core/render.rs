//! Renderer module
//!
//! Renders query results and reports to jsonl, json or md. Non-ASCII text is
//! written as-is, never `\u` escaped.

use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

use crate::core::model::{GroupedResult, MedicineRecord};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Markdown form of a result entry
pub trait MarkdownEntry {
    fn write_markdown(&self, out: &mut String);
}

impl MarkdownEntry for GroupedResult {
    fn write_markdown(&self, out: &mut String) {
        out.push_str(&format!("### {}\n\n", self.base_item_name));
        if !self.merged_detail.trim().is_empty() {
            out.push_str(&format!("- detail: {}\n", self.merged_detail));
        }
        out.push_str(&format!("- sources: {}\n\n", self.source_files.join(", ")));
    }
}

impl MarkdownEntry for MedicineRecord {
    fn write_markdown(&self, out: &mut String) {
        out.push_str(&format!("### {}\n\n", self.item_name));
        let fields = [
            ("company", &self.company),
            ("ingredient code", &self.ingredient_code),
            ("product code", &self.product_code),
            ("date", &self.date),
            ("notice", &self.notice_number),
            ("detail", &self.detail),
            ("note", &self.note),
            ("insurance", &self.insurance),
            ("source", &self.source_file),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                out.push_str(&format!("- {}: {}\n", label, value));
            }
        }
        out.push('\n');
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    results: &'a [T],
}

/// Renderer for results and reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    /// Render a result list. JSON wraps it as `{"results": [...]}`.
    pub fn render_results<T: Serialize + MarkdownEntry>(
        &self,
        items: &[T],
    ) -> serde_json::Result<String> {
        match self.config.format {
            OutputFormat::Json => self.to_json(&Envelope { results: items }),
            OutputFormat::Jsonl => {
                let lines = items
                    .iter()
                    .map(|item| self.to_json(item))
                    .collect::<serde_json::Result<Vec<_>>>()?;
                Ok(lines.join(if self.config.pretty { "\n\n" } else { "\n" }))
            }
            OutputFormat::Markdown => {
                let mut output = String::new();
                if items.is_empty() {
                    output.push_str("_No results_\n");
                }
                for item in items {
                    item.write_markdown(&mut output);
                }
                Ok(output)
            }
        }
    }

    /// Render a report: JSON for json/jsonl, the human-readable trace for md
    pub fn render_report<T: Serialize + Display>(&self, report: &T) -> serde_json::Result<String> {
        match self.config.format {
            OutputFormat::Json | OutputFormat::Jsonl => self.to_json(report),
            OutputFormat::Markdown => Ok(format!("```text\n{}\n```\n", report)),
        }
    }

    /// Render results to a writer. Nothing is written when there is nothing to show.
    pub fn render_results_to<T: Serialize + MarkdownEntry, W: Write>(
        &self,
        items: &[T],
        mut writer: W,
    ) -> std::io::Result<()> {
        let output = self.render_results(items)?;
        if output.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", output)
    }
}
