//! Raw-cache tee and replay.
//!
//! A live source is wrapped in [`record`], which forwards every result and,
//! once the source is exhausted, writes the collected paths to that source's
//! cache entry. A source that is not due is replaced by [`replay`], which
//! streams the paths back out of the same entry.

use std::path::PathBuf;

use tracing::{info, warn};

use super::{ResultStream, ScanResult, channel, from_iter};
use crate::cache::Cache;

/// Forward `input` unchanged and save its paths under `key` when it closes.
///
/// Paths are sorted before writing so the entry is stable between runs. The
/// cache write completes before the returned stream closes, so a consumer
/// that has drained the stream can rely on the entry being up to date.
#[must_use]
pub fn record(
    mut input: ResultStream,
    cache: Cache,
    key: String,
    source: &'static str,
) -> ResultStream {
    let (tx, rx) = channel();

    tokio::spawn(async move {
        let mut paths: Vec<PathBuf> = Vec::new();
        let mut forwarding = true;

        while let Some(result) = input.recv().await {
            paths.push(result.path.clone());
            if forwarding && tx.send(result).await.is_err() {
                // Keep draining so the cache still gets the full result set
                forwarding = false;
            }
        }

        paths.sort();
        let count = paths.len();
        let stored =
            tokio::task::spawn_blocking(move || cache.store(&key, &encode_paths(&paths))).await;
        match stored {
            Ok(Ok(())) => info!("[cache] {count} path(s) saved for {source:?}"),
            Ok(Err(e)) => warn!("[cache] save error for {source:?}: {e}"),
            Err(e) => warn!("[cache] save task failed for {source:?}: {e}"),
        }

        drop(tx);
    });

    rx
}

/// Stream the paths stored under `key` as results of `source`.
///
/// A missing or unreadable entry is logged and yields an empty stream.
#[must_use]
pub fn replay(cache: &Cache, key: &str, source: &'static str) -> ResultStream {
    let paths = match cache.load(key) {
        Ok(data) => decode_paths(&data),
        Err(e) => {
            warn!("[cache] load error for {source:?}: {e}");
            Vec::new()
        }
    };

    info!("[cache] {} path(s) loaded for {source:?}", paths.len());
    from_iter(
        paths
            .into_iter()
            .map(move |path| ScanResult::new(path, source))
            .collect::<Vec<_>>(),
    )
}

/// Newline-delimited encoding of a path list.
#[must_use]
pub fn encode_paths(paths: &[PathBuf]) -> Vec<u8> {
    let mut out = String::new();
    for path in paths {
        out.push_str(&path.to_string_lossy());
        out.push('\n');
    }
    out.into_bytes()
}

/// Inverse of [`encode_paths`]; blank lines are skipped.
#[must_use]
pub fn decode_paths(data: &[u8]) -> Vec<PathBuf> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::pipeline::{channel, collect};

    #[test]
    fn test_decode_skips_blank_lines() {
        let paths = decode_paths(b"/b\n\n/a\r\n\n");
        assert_eq!(paths, vec![PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn test_encode_is_newline_terminated() {
        let data = encode_paths(&[PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(data, b"/a\n/b\n");
        assert!(encode_paths(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_record_forwards_and_stores_sorted() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        let input = from_iter(vec![
            ScanResult::new("/z", "find"),
            ScanResult::new("/a", "find"),
            ScanResult::new("/m", "find"),
        ]);

        let out = collect(record(input, cache.clone(), "raw.txt".into(), "find")).await;

        // Arrival order downstream, sorted on disk
        let forwarded: Vec<_> = out.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            forwarded,
            vec![PathBuf::from("/z"), PathBuf::from("/a"), PathBuf::from("/m")]
        );
        assert_eq!(cache.load("raw.txt").unwrap(), b"/a\n/m\n/z\n");
    }

    #[tokio::test]
    async fn test_record_stores_even_if_downstream_hangs_up() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        let (tx, rx) = channel();
        let out = record(rx, cache.clone(), "raw.txt".into(), "find");
        drop(out);

        tx.send(ScanResult::new("/b", "find")).await.unwrap();
        tx.send(ScanResult::new("/a", "find")).await.unwrap();
        drop(tx);

        // Poll until the background task has written the entry
        for _ in 0..100 {
            if cache.exists("raw.txt") {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(cache.load("raw.txt").unwrap(), b"/a\n/b\n");
    }

    #[tokio::test]
    async fn test_replay_round_trips_recorded_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());
        cache.store("raw.txt", b"/a\n/b\n").unwrap();

        let out = collect(replay(&cache, "raw.txt", "mdfind")).await;
        assert_eq!(
            out,
            vec![
                ScanResult::new("/a", "mdfind"),
                ScanResult::new("/b", "mdfind"),
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_missing_entry_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        assert!(collect(replay(&cache, "nope.txt", "locate")).await.is_empty());
    }
}
