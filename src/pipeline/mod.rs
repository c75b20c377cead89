//! Streaming scan pipeline.
//!
//! Discovery sources produce [`ResultStream`]s: bounded channels of candidate
//! paths that downstream stages consume while the producer is still running.
//! Streams are combined with [`merge`], narrowed by a [`FilterChain`], and
//! teed into the cache by [`record`].
//!
//! Every stage runs as its own tokio task and owns its state, so none of them
//! need locking. All constructors here spawn tasks and must be called from
//! inside a tokio runtime.

pub mod filter;
pub mod merge;
pub mod record;

use std::path::PathBuf;

use tokio::sync::mpsc;

pub use filter::{Duplicates, ExcludeGlobs, Extension, Filter, FilterChain, NotExists};
pub use merge::merge;
pub use record::{record, replay};

/// Capacity of every channel between pipeline stages.
pub const STREAM_BUFFER: usize = 100;

/// A candidate project file reported by a discovery source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    /// Path of the candidate file
    pub path: PathBuf,

    /// Name of the source that reported it
    pub source: &'static str,
}

impl ScanResult {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: &'static str) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Receiving end of a pipeline stage. Closed when the producer is done.
pub type ResultStream = mpsc::Receiver<ScanResult>;

/// Create a connected sender/stream pair with the standard buffer size.
#[must_use]
pub fn channel() -> (mpsc::Sender<ScanResult>, ResultStream) {
    mpsc::channel(STREAM_BUFFER)
}

/// Stream the items of `results` from a background task.
pub fn from_iter<I>(results: I) -> ResultStream
where
    I: IntoIterator<Item = ScanResult>,
    I::IntoIter: Send + 'static,
{
    let (tx, rx) = channel();
    let results = results.into_iter();

    tokio::spawn(async move {
        for result in results {
            if tx.send(result).await.is_err() {
                break;
            }
        }
    });

    rx
}

/// Drain `stream` into a vector, in arrival order.
pub async fn collect(mut stream: ResultStream) -> Vec<ScanResult> {
    let mut results = Vec::new();
    while let Some(result) = stream.recv().await {
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_iter_then_collect_preserves_order() {
        let input = vec![
            ScanResult::new("/a", "test"),
            ScanResult::new("/b", "test"),
            ScanResult::new("/c", "test"),
        ];

        let output = collect(from_iter(input.clone())).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_from_iter_larger_than_buffer() {
        let input: Vec<_> = (0..STREAM_BUFFER * 3)
            .map(|i| ScanResult::new(format!("/p/{i}"), "test"))
            .collect();

        let output = collect(from_iter(input.clone())).await;
        assert_eq!(output, input);
    }
}
