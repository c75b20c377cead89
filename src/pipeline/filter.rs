//! Stream filters.
//!
//! A [`Filter`] decides per element whether it passes; [`Filter::apply`]
//! turns that decision into a stream-to-stream stage running in its own task.
//! [`FilterChain`] composes any number of filters in the order they were
//! added.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use glob::Pattern;
use tracing::{trace, warn};

use super::{ResultStream, ScanResult, channel};
use crate::config::Config;

/// One predicate stage of the pipeline.
pub trait Filter: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether `result` should be forwarded downstream.
    fn keep(&mut self, result: &ScanResult) -> bool;

    /// Run this filter over `input` in a background task.
    ///
    /// Forwarded elements keep their arrival order.
    fn apply(mut self: Box<Self>, mut input: ResultStream) -> ResultStream {
        let (tx, rx) = channel();

        tokio::spawn(async move {
            while let Some(result) = input.recv().await {
                if !self.keep(&result) {
                    trace!("[{}] dropped {}", self.name(), result.path.display());
                    continue;
                }
                if tx.send(result).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

/// Ordered list of filters applied one after the other.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain used by a scan: excludes, then existence, then duplicates,
    /// then the project-file extension.
    #[must_use]
    pub fn standard(config: &Config) -> Self {
        Self::new()
            .with(ExcludeGlobs::new(&config.excludes))
            .with(NotExists)
            .with(Duplicates::default())
            .with(Extension::new(config.mode.extension()))
    }

    /// Append `filter` to the end of the chain.
    #[must_use]
    pub fn with(mut self, filter: impl Filter) -> Self {
        self.push(filter);
        self
    }

    /// Append `filter` to the end of the chain.
    pub fn push(&mut self, filter: impl Filter) {
        self.filters.push(Box::new(filter));
    }

    /// Names of the filters, in application order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Thread `input` through every filter. An empty chain is a pass-through.
    #[must_use]
    pub fn apply(self, input: ResultStream) -> ResultStream {
        self.filters
            .into_iter()
            .fold(input, |stream, filter| filter.apply(stream))
    }
}

/// Drops paths matching any of a set of glob patterns.
///
/// `*` also matches path separators, so `"/tmp/*"` excludes everything
/// below `/tmp`.
#[derive(Clone, Debug, Default)]
pub struct ExcludeGlobs {
    patterns: Vec<Pattern>,
}

impl ExcludeGlobs {
    /// Compile `patterns`. Invalid patterns are logged and skipped.
    #[must_use]
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("[filter] invalid pattern ({p}): {e}");
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Whether `path` matches one of the patterns.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(path))
    }
}

impl Filter for ExcludeGlobs {
    fn name(&self) -> &'static str {
        "exclude"
    }

    fn keep(&mut self, result: &ScanResult) -> bool {
        !self.is_excluded(&result.path)
    }
}

/// Drops paths that no longer exist on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotExists;

impl Filter for NotExists {
    fn name(&self) -> &'static str {
        "not-exists"
    }

    fn keep(&mut self, result: &ScanResult) -> bool {
        fs::metadata(&result.path).is_ok()
    }

    /// Same as the default stage, but stats through `tokio::fs` so a long
    /// stream of paths never blocks a runtime worker.
    fn apply(self: Box<Self>, mut input: ResultStream) -> ResultStream {
        let (tx, rx) = channel();

        tokio::spawn(async move {
            while let Some(result) = input.recv().await {
                if tokio::fs::metadata(&result.path).await.is_err() {
                    trace!("[{}] dropped {}", self.name(), result.path.display());
                    continue;
                }
                if tx.send(result).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

/// Drops paths already seen earlier in the same stream.
///
/// State lives only as long as the filter, i.e. one scan cycle.
#[derive(Debug, Default)]
pub struct Duplicates {
    seen: HashSet<PathBuf>,
}

impl Filter for Duplicates {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn keep(&mut self, result: &ScanResult) -> bool {
        self.seen.insert(result.path.clone())
    }
}

/// Drops paths whose name does not end with the project-file extension.
#[derive(Clone, Debug)]
pub struct Extension {
    extension: String,
}

impl Extension {
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Filter for Extension {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn keep(&mut self, result: &ScanResult) -> bool {
        result
            .path
            .to_str()
            .is_some_and(|p| p.ends_with(&self.extension))
    }
}
