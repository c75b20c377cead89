//! Scan orchestration and cache freshness.
//!
//! The [`ScanManager`] decides, per discovery source, whether to run it live
//! or replay its cached results, pushes everything through the filter chain,
//! resolves the surviving files into [`Project`]s and persists the list.
//!
//! A source is *due* when it is active and any of these hold:
//!
//! 1. there is no structured project cache yet,
//! 2. the configuration file was modified after the structured cache was
//!    written (any edit invalidates everything),
//! 3. the source's own raw cache is older than its interval.

use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant, SystemTime},
};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::{
    cache::Cache,
    config::Config,
    error::CacheError,
    pipeline::{FilterChain, ResultStream, merge, record, replay},
    project::Project,
    sources::Source,
};

/// Snapshot of one source's state, as reported by [`ScanManager::status`].
#[derive(Clone, Debug)]
pub struct SourceStatus {
    pub name: &'static str,
    pub interval: Duration,
    pub active: bool,
    pub ready: bool,
    pub due: bool,
    pub cache_key: String,
    /// Age of the raw cache entry, `None` if there is none
    pub cache_age: Option<Duration>,
}

/// Orchestrates discovery sources, filters and the project cache.
///
/// Not re-entrant: run at most one [`ScanManager::scan`] per cache at a time
/// (see [`RescanLock`](crate::lock::RescanLock)).
pub struct ScanManager {
    config: Config,
    cache: Cache,
    sources: Vec<Source>,
    force: bool,
}

impl ScanManager {
    /// Create a manager over every known source.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved configuration (mode, roots, intervals, excludes)
    /// * `cache` - Store holding the raw per-source lists and the project list
    ///
    /// # Returns
    ///
    /// A manager visiting `find`, `mdfind` and `locate` in that order, with
    /// `force` off.
    ///
    /// # Examples
    ///
    /// ```
    /// # use editor_projects::{cache::Cache, config::Config, scanner::ScanManager};
    /// let manager = ScanManager::new(Config::default(), Cache::new("/tmp/editor-projects"));
    /// ```
    #[must_use]
    pub fn new(config: Config, cache: Cache) -> Self {
        Self {
            config,
            cache,
            sources: Source::all(),
            force: false,
        }
    }

    /// Replace the list of sources (in visiting order).
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// When `true`, every active source is treated as due.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Cache key of the structured project list.
    #[must_use]
    pub fn projects_key(&self) -> String {
        self.config.mode.projects_key()
    }

    /// Whether the structured cache is missing or older than the config file.
    ///
    /// When true, every active source is due regardless of its own interval.
    #[must_use]
    pub fn cache_invalidated(&self) -> bool {
        let modified = match self.cache.modified(&self.projects_key()) {
            Ok(modified) => modified,
            Err(CacheError::Missing { .. }) => return true,
            Err(e) => {
                warn!("[cache] {e}");
                return true;
            }
        };

        self.config_modified().is_some_and(|config| {
            let newer = config > modified;
            if newer {
                debug!("configuration changed since last scan");
            }
            newer
        })
    }

    fn config_modified(&self) -> Option<SystemTime> {
        let path = self.config.config_path.as_ref()?;
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn source_due(&self, source: &Source, invalidated: bool) -> bool {
        source.active(&self.config)
            && (self.force || invalidated || source.due(&self.config, &self.cache))
    }

    /// Whether any active source is currently due.
    ///
    /// Cheap enough to call before every listing: it only looks at cache and
    /// config modification times and never runs a source.
    ///
    /// # Returns
    ///
    /// `true` if some active source is due: the project list is missing or
    /// older than the config file, a source's raw list has outlived its
    /// interval, or `force` is set. Availability of the source's tool is not
    /// considered here; a due source that cannot run is skipped by
    /// [`ScanManager::scan`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use editor_projects::{cache::Cache, config::Config, scanner::ScanManager};
    /// # let manager = ScanManager::new(Config::default(), Cache::new("/tmp/editor-projects"));
    /// if manager.scan_due() {
    ///     // start a background rescan, then show the cached list anyway
    /// }
    /// ```
    #[must_use]
    pub fn scan_due(&self) -> bool {
        let invalidated = self.cache_invalidated();

        self.sources.iter().any(|source| {
            let due = self.source_due(source, invalidated);
            if due {
                info!("[{}] rescan due", source.name());
            }
            due
        })
    }

    /// Per-source status for diagnostics.
    #[must_use]
    pub fn status(&self) -> Vec<SourceStatus> {
        let invalidated = self.cache_invalidated();

        self.sources
            .iter()
            .map(|source| {
                let cache_key = source.cache_key(&self.config);
                SourceStatus {
                    name: source.name(),
                    interval: source.interval(&self.config),
                    active: source.active(&self.config),
                    ready: source.ready(&self.config),
                    due: self.source_due(source, invalidated),
                    cache_age: self.cache.age(&cache_key).ok(),
                    cache_key,
                }
            })
            .collect()
    }

    /// The last persisted project list, however old.
    ///
    /// # Returns
    ///
    /// The projects written by the most recent [`ScanManager::scan`], or an
    /// empty list if no scan has completed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache entry exists but cannot be read or
    /// decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// # use editor_projects::{cache::Cache, config::Config, scanner::ScanManager};
    /// # let cache = Cache::new("/nonexistent/editor-projects");
    /// # let manager = ScanManager::new(Config::default(), cache);
    /// for project in manager.load()? {
    ///     println!("{}\t{}", project.name(), project.folder().display());
    /// }
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(&self) -> Result<Vec<Project>> {
        let key = self.projects_key();
        match self.cache.load_json(&key) {
            Ok(projects) => Ok(projects),
            Err(CacheError::Missing { .. }) => Ok(Vec::new()),
            Err(e) => Err(e).context("failed to load cached projects"),
        }
    }

    /// Run one full scan cycle and persist the result.
    ///
    /// Every active source is either run live (when due and available) or
    /// replayed from its raw cache. The merged stream goes through the
    /// standard filter chain, survivors are parsed in parallel, and the
    /// resulting list replaces the cached one.
    ///
    /// Source failures and unreadable project files only shrink the result;
    /// they are logged and the cycle continues.
    ///
    /// # Returns
    ///
    /// The freshly persisted projects, in filtered arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the final project list cannot be written to
    /// the cache.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use editor_projects::{cache::Cache, config::Config, scanner::ScanManager};
    /// # async fn run() -> anyhow::Result<()> {
    /// let manager = ScanManager::new(Config::load(None)?, Cache::new("/tmp/editor-projects"));
    /// let projects = manager.scan().await?;
    /// println!("Found {} projects", projects.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scan(&self) -> Result<Vec<Project>> {
        let start = Instant::now();
        let invalidated = self.cache_invalidated();

        let streams: Vec<ResultStream> = self
            .sources
            .iter()
            .filter_map(|source| self.dispatch(source, invalidated))
            .collect();

        let chain = FilterChain::standard(&self.config);
        debug!("filters: {}", chain.names().join(" -> "));
        let mut filtered = chain.apply(merge(streams));

        let mut paths = Vec::new();
        while let Some(result) = filtered.recv().await {
            debug!("[{}] {}", result.source, result.path.display());
            paths.push(result.path);
        }

        let cache = self.cache.clone();
        let key = self.projects_key();
        let projects = tokio::task::spawn_blocking(move || {
            let projects = resolve_projects(paths);
            cache.store_json(&key, &projects).map(|()| projects)
        })
        .await
        .context("project resolution task failed")?
        .context("failed to save projects")?;

        info!(
            "{} project(s) found in {:.2?}",
            projects.len(),
            start.elapsed()
        );
        Ok(projects)
    }

    /// Live stream, cached replay, or nothing for one source.
    fn dispatch(&self, source: &Source, invalidated: bool) -> Option<ResultStream> {
        let name = source.name();
        let key = source.cache_key(&self.config);

        if !source.active(&self.config) {
            info!("[{name}] inactive");
            if let Err(e) = self.cache.clear(&key) {
                warn!("[{name}] couldn't clear cache: {e}");
            }
            return None;
        }

        if !self.source_due(source, invalidated) {
            info!("[{name}] using cached results");
            return Some(replay(&self.cache, &key, name));
        }

        if !source.ready(&self.config) {
            info!("[{name}] not available, skipping");
            return None;
        }

        info!("[{name}] starting ...");
        match source.scan(&self.config) {
            Ok(stream) => Some(record(stream, self.cache.clone(), key, name)),
            Err(e) => {
                error!("[{name}] error: {e:#}");
                None
            }
        }
    }
}

/// Parse project files in parallel, keeping input order.
fn resolve_projects(paths: Vec<PathBuf>) -> Vec<Project> {
    paths
        .into_par_iter()
        .filter_map(|path| match Project::from_file(&path) {
            Ok(project) => Some(project),
            Err(e) => {
                error!("{e}");
                None
            }
        })
        .collect()
}
