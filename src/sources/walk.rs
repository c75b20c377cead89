//! Tree-walk discovery source.
//!
//! Walks every configured search root down to its configured depth and
//! reports files whose name ends with the project-file extension. Each root
//! is walked by its own producer on the blocking thread pool; their outputs
//! are merged into one stream.

use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::{Config, SearchRoot},
    pipeline::{ExcludeGlobs, ResultStream, ScanResult, channel, merge},
};

/// Native bounded-depth directory walk over the configured roots.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeWalk;

impl TreeWalk {
    pub const NAME: &'static str = "find";

    /// Ready when there is at least one root to walk.
    #[must_use]
    pub fn ready(config: &Config) -> bool {
        !config.roots.is_empty()
    }

    /// Start one walker per existing root and merge their output.
    ///
    /// Roots that are missing or not directories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Never fails to start; the `Result` matches the other sources.
    pub fn scan(config: &Config) -> Result<ResultStream> {
        let extension = config.mode.extension();
        let mut streams = Vec::with_capacity(config.roots.len());

        for root in &config.roots {
            if !root.path.is_dir() {
                warn!("[{}] search root {} is not a directory", Self::NAME, root.path.display());
                continue;
            }

            let (tx, rx) = channel();
            let root = root.clone();
            tokio::task::spawn_blocking(move || walk_root(&root, extension, &tx));
            streams.push(rx);
        }

        Ok(merge(streams))
    }
}

/// Walk one root, sending matches on `tx` as they are found.
fn walk_root(root: &SearchRoot, extension: &str, tx: &mpsc::Sender<ScanResult>) {
    let start = Instant::now();
    let excludes = ExcludeGlobs::new(&root.excludes);
    let mut count = 0usize;

    // depth 0 = files directly inside the root
    let walker = WalkDir::new(&root.path)
        .max_depth(root.depth + 1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !excludes.is_excluded(entry.path()));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if !is_project_file(&entry, extension) {
                    continue;
                }
                if tx
                    .blocking_send(ScanResult::new(entry.into_path(), TreeWalk::NAME))
                    .is_err()
                {
                    return;
                }
                count += 1;
            }
            Err(e) => debug!("[{}] {e}", TreeWalk::NAME),
        }
    }

    debug!(
        "[{}] {count} result(s) under {} in {:.2?}",
        TreeWalk::NAME,
        root.path.display(),
        start.elapsed()
    );
}

fn is_project_file(entry: &DirEntry, extension: &str) -> bool {
    entry.file_type().is_file()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(extension))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::TempDir;

    use super::*;
    use crate::pipeline::collect;

    fn create_file(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    async fn scan_paths(config: &Config) -> Vec<String> {
        let mut paths: Vec<_> = collect(TreeWalk::scan(config).unwrap())
            .await
            .into_iter()
            .map(|r| {
                assert_eq!(r.source, TreeWalk::NAME);
                r.path.display().to_string()
            })
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_ready_requires_roots() {
        assert!(!TreeWalk::ready(&Config::default()));

        let config = Config {
            roots: vec![SearchRoot::new("/", 1)],
            ..Config::default()
        };
        assert!(TreeWalk::ready(&config));
    }

    #[tokio::test]
    async fn test_walk_respects_depth() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        create_file(&base.join("top.sublime-project"));
        create_file(&base.join("a/one.sublime-project"));
        create_file(&base.join("a/b/two.sublime-project"));
        create_file(&base.join("a/b/c/three.sublime-project"));

        let config = Config {
            roots: vec![SearchRoot::new(base, 1)],
            ..Config::default()
        };

        let paths = scan_paths(&config).await;
        assert_eq!(
            paths,
            vec![
                base.join("a/one.sublime-project").display().to_string(),
                base.join("top.sublime-project").display().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_matches_extension_only() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        create_file(&base.join("x.sublime-project"));
        create_file(&base.join("x.sublime-workspace"));
        create_file(&base.join("x.code-workspace"));
        fs::create_dir_all(base.join("dir.sublime-project")).unwrap();

        let config = Config {
            roots: vec![SearchRoot::new(base, 2)],
            ..Config::default()
        };

        let paths = scan_paths(&config).await;
        assert_eq!(
            paths,
            vec![base.join("x.sublime-project").display().to_string()]
        );
    }

    #[tokio::test]
    async fn test_walk_prunes_root_excludes() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        create_file(&base.join("keep/x.sublime-project"));
        create_file(&base.join("vendor/y.sublime-project"));

        let mut root = SearchRoot::new(base, 3);
        root.excludes = vec!["*/vendor".to_string()];
        let config = Config {
            roots: vec![root],
            ..Config::default()
        };

        let paths = scan_paths(&config).await;
        assert_eq!(
            paths,
            vec![base.join("keep/x.sublime-project").display().to_string()]
        );
    }

    #[tokio::test]
    async fn test_walk_multiple_roots_and_missing_root() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        create_file(&first.join("a.sublime-project"));
        create_file(&second.join("b.sublime-project"));

        let config = Config {
            roots: vec![
                SearchRoot::new(&first, 2),
                SearchRoot::new(tmp.path().join("missing"), 2),
                SearchRoot::new(&second, 2),
            ],
            ..Config::default()
        };

        let paths = scan_paths(&config).await;
        assert_eq!(
            paths,
            vec![
                first.join("a.sublime-project").display().to_string(),
                second.join("b.sublime-project").display().to_string(),
            ]
        );
    }
}
