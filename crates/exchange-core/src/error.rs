//! Error types for exchange-core
//!
//! The call graph and tries never fail; these errors come from the layers
//! that touch files: loaders, snapshots and configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {}: {}", .path.display(), .source)]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("snapshot {} could not be encoded or decoded: {}", .path.display(), .source)]
    Snapshot {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("no snapshot at {}", .0.display())]
    SnapshotMissing(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ExchangeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn snapshot(path: impl Into<PathBuf>, source: bincode::Error) -> Self {
        Self::Snapshot {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
