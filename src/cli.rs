//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::catalog::debug::DEFAULT_PREVIEW;
use crate::catalog::loader::{resolve_files, LoadMode, LoaderConfig};
use crate::catalog::search::MatchMode;
use crate::catalog::Catalog;
use crate::core::record::RowPolicy;
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::core::sniff::{default_overrides, DecodeStrategy, EncodingOverride};

/// dursearch - search the DUR drug-safety item lists by partial name.
#[derive(Parser, Debug)]
#[command(name = "dursearch")]
#[command(
    author,
    version,
    about,
    long_about = r#"dursearch loads the published DUR (Drug Utilization Review) item lists into
an in-memory catalog and answers name queries against it.

Every command loads the catalog first. Encodings (UTF-8, CP949, ...) and
delimiters (tab or comma) are detected per file.

Output formats:
- json: {"results": [...]} (default)
- jsonl: one JSON object per line
- md: human-friendly Markdown

Examples:
    dursearch search 타이레놀
    dursearch --load-mode merge search 정 --format md
    dursearch find "게보린정"
    dursearch --file a.csv --file b.csv load
    dursearch debug 쿠티아핀정
"#
)]
pub struct Cli {
    /// Directory the source files are resolved against.
    #[arg(
        long,
        global = true,
        env = "DURSEARCH_DATA_DIR",
        default_value = ".",
        value_name = "DIR",
        long_help = "Directory the source files are resolved against.\n\n\
The built-in DUR file list lives under csv/ in this directory. Relative --file\n\
paths are also resolved against it."
    )]
    pub data_dir: PathBuf,

    /// Source file to load (repeatable; replaces the built-in list).
    #[arg(
        long = "file",
        global = true,
        value_name = "PATH",
        action = ArgAction::Append
    )]
    pub files: Vec<PathBuf>,

    /// How records of several files combine (replace-per-file/merge).
    #[arg(
        long,
        global = true,
        env = "DURSEARCH_LOAD_MODE",
        default_value = "replace-per-file",
        value_name = "MODE",
        long_help = "How records of several files combine into the catalog.\n\n\
Supported values:\n\
- replace-per-file (default): each file replaces the previous one; only the\n\
  last file's records are searchable\n\
- merge: the catalog is the union of all files, in file order"
    )]
    pub load_mode: String,

    /// How queries are compared with item names (raw/normalized).
    #[arg(
        long,
        global = true,
        env = "DURSEARCH_MATCH_MODE",
        default_value = "raw",
        value_name = "MODE",
        long_help = "How search queries are compared with item names.\n\n\
Supported values:\n\
- raw (default): trimmed, lowercased query contained in the lowercased name\n\
- normalized: NFKC/Hangul/alnum-only keys, ignores spacing and punctuation"
    )]
    pub match_mode: String,

    /// What to do with undecodable bytes (lossy/skip).
    #[arg(long, global = true, default_value = "lossy", value_name = "STRATEGY")]
    pub decode: String,

    /// Force an encoding for files whose path contains PATTERN (repeatable).
    #[arg(
        long = "encoding-override",
        global = true,
        value_name = "PATTERN=LABEL",
        action = ArgAction::Append,
        long_help = "Force an encoding for files whose path contains PATTERN.\n\n\
LABEL is an encoding label such as cp949, euc-kr or utf-8. Given overrides are\n\
checked before the built-in one (임부금기=cp949); the first match wins.\n\n\
Example:\n\
  dursearch --encoding-override 노인주의=cp949 search 정"
    )]
    pub encoding_overrides: Vec<String>,

    /// Reject rows with fewer than the minimum column count instead of padding.
    #[arg(long, global = true)]
    pub strict_rows: bool,

    /// Output format (json/jsonl/md).
    #[arg(long, global = true, default_value = "json", value_name = "FORMAT")]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the source files and print the load report.
    Load,

    /// Partial-name search, grouped by base item name.
    #[command(long_about = "Find every record whose item name contains QUERY and group the hits\n\
by base item name (dosage suffix such as \"500밀리그램정\" removed).\n\n\
An empty QUERY matches every record.\n\n\
Examples:\n\
  dursearch search 타이레놀\n\
  dursearch search \"\" --format jsonl\n")]
    Search {
        /// Text contained in the item name.
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,
    },

    /// Exact lookup on the normalized item name.
    Find {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Explain how a query compares against the catalog.
    Debug {
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        /// Number of leading records to list.
        #[arg(long, default_value_t = DEFAULT_PREVIEW, value_name = "N")]
        preview: usize,
    },
}

impl Cli {
    /// Log filter derived from -v/-q; RUST_LOG takes precedence
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    fn loader_config(&self) -> Result<LoaderConfig> {
        let decode: DecodeStrategy = self
            .decode
            .parse()
            .map_err(anyhow::Error::msg)?;

        let mut overrides = self
            .encoding_overrides
            .iter()
            .map(|spec| spec.parse::<EncodingOverride>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Invalid --encoding-override")?;
        overrides.extend(default_overrides());

        Ok(LoaderConfig {
            decode,
            overrides,
            row_policy: if self.strict_rows {
                RowPolicy::Strict
            } else {
                RowPolicy::Pad
            },
            ..LoaderConfig::default()
        })
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
    let load_mode: LoadMode = cli.load_mode.parse().map_err(anyhow::Error::msg)?;
    let match_mode: MatchMode = cli.match_mode.parse().map_err(anyhow::Error::msg)?;
    let renderer = Renderer::with_config(RenderConfig::with_pretty(format, cli.pretty));

    let catalog = Catalog::new(cli.loader_config()?);
    let files = resolve_files(&cli.data_dir, &cli.files);
    catalog
        .reload(&files, load_mode)
        .context("Failed to load the medicine catalog")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Load => {
            let snapshot = catalog.snapshot();
            writeln!(out, "{}", renderer.render_report(snapshot.report())?)?;
        }

        Commands::Search { query } => {
            let results = catalog.search_partial(&query, match_mode);
            renderer.render_results_to(&results, &mut out)?;
        }

        Commands::Find { name } => {
            let results = catalog.find_exact(&name);
            renderer.render_results_to(&results, &mut out)?;
        }

        Commands::Debug { query, preview } => {
            let report = catalog.debug_find(&query, preview);
            writeln!(out, "{}", renderer.render_report(&report)?)?;
        }
    }

    Ok(())
}
