//! Typed errors for the library layer.
//!
//! Orchestration code works with [`anyhow::Result`]; the errors here are the
//! ones callers need to match on or log with their path attached.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Why a project file could not be turned into a [`Project`](crate::project::Project).
#[derive(Debug, Error)]
pub enum ProjectReadError {
    /// The file could not be read.
    #[error("failed to read project file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but is not a valid project description.
    #[error("failed to parse project file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectReadError {
    /// Path of the project file that failed.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Failures of the on-disk cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry {key:?} does not exist")]
    Missing { key: String },

    #[error("cache I/O error for {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("cache entry {key:?} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
