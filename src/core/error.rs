//! Error types shared by the loader and the query engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DurError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("invalid encoding override {0:?}, expected PATTERN=LABEL")]
    InvalidOverride(String),

    #[error("no source files to load")]
    NoFiles,

    #[error("{file} line {line}: expected at least {expected} columns, found {found}")]
    ShortRow {
        file: String,
        line: u64,
        expected: usize,
        found: usize,
    },
}

impl DurError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DurError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        DurError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DurError>;
