//! Resolved scan configuration.
//!
//! [`Config`] is what the rest of the crate consumes: every default is filled
//! in, intervals are parsed and `~` is expanded. It is built once at startup
//! and never mutated afterwards.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{FileConfig, Mode, file::expand_tilde};

/// How deep to search directories by default.
///
/// 0 means files directly inside the root, 1 its immediate children, etc.
pub const DEFAULT_DEPTH: usize = 2;

/// Default rescan interval of the tree-walk source.
pub const DEFAULT_FIND_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default rescan interval of the content-index source.
pub const DEFAULT_MDFIND_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default rescan interval of the path-database source.
pub const DEFAULT_LOCATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const ENV_FIND_INTERVAL: &str = "INTERVAL_FIND";
const ENV_MDFIND_INTERVAL: &str = "INTERVAL_MDFIND";
const ENV_LOCATE_INTERVAL: &str = "INTERVAL_LOCATE";

/// Rescan interval for each discovery source. Zero disables a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intervals {
    pub find: Duration,
    pub mdfind: Duration,
    pub locate: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            find: DEFAULT_FIND_INTERVAL,
            mdfind: DEFAULT_MDFIND_INTERVAL,
            locate: DEFAULT_LOCATE_INTERVAL,
        }
    }
}

/// A directory searched by the tree-walk source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRoot {
    /// Absolute (tilde-expanded) root directory
    pub path: PathBuf,

    /// Maximum directory depth below `path`
    pub depth: usize,

    /// Glob patterns pruned while walking this root
    pub excludes: Vec<String>,
}

impl SearchRoot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            path: path.into(),
            depth,
            excludes: Vec::new(),
        }
    }
}

/// Fully resolved configuration handed to the scan pipeline.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Active project-file family
    pub mode: Mode,

    /// Roots for the tree-walk source
    pub roots: Vec<SearchRoot>,

    /// Glob patterns excluded from every source
    pub excludes: Vec<String>,

    /// Rescan interval per source
    pub intervals: Intervals,

    /// File the configuration was read from, if any.
    ///
    /// Its modification time invalidates the structured cache.
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Load and resolve the configuration file at its default location.
    ///
    /// Interval environment overrides are applied, then `mode` (when given)
    /// replaces whatever the file selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed, or if one of
    /// its intervals is not a valid duration.
    pub fn load(mode: Option<Mode>) -> Result<Self> {
        let path = FileConfig::config_path();
        let file_config = match &path {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::resolve(file_config, path)?
            .with_env_overrides(|key| std::env::var(key).ok());
        if let Some(mode) = mode {
            config.mode = mode;
        }

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Like [`Config::load`] but reading an explicit file.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let file_config = FileConfig::load_from(path)?;
        Ok(Self::resolve(file_config, Some(path.to_path_buf()))?
            .with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Fill in defaults for everything `file` leaves out.
    ///
    /// # Errors
    ///
    /// Returns an error if an interval string cannot be parsed.
    pub fn resolve(file: FileConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let depth = match file.depth {
            Some(0) | None => DEFAULT_DEPTH,
            Some(depth) => depth,
        };

        let roots = file
            .paths
            .into_iter()
            .map(|sp| SearchRoot {
                path: expand_tilde(&sp.path),
                depth: sp.depth.filter(|d| *d > 0).unwrap_or(depth),
                excludes: sp.excludes,
            })
            .collect();

        let defaults = Intervals::default();
        let intervals = Intervals {
            find: parse_interval("find", file.intervals.find.as_deref(), defaults.find)?,
            mdfind: parse_interval("mdfind", file.intervals.mdfind.as_deref(), defaults.mdfind)?,
            locate: parse_interval("locate", file.intervals.locate.as_deref(), defaults.locate)?,
        };

        Ok(Self {
            mode: file.mode.unwrap_or_default(),
            roots,
            excludes: file.excludes,
            intervals,
            config_path,
        })
    }

    /// Override intervals from `INTERVAL_FIND`, `INTERVAL_MDFIND` and
    /// `INTERVAL_LOCATE`.
    ///
    /// Invalid values are logged and ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let targets = [
            (ENV_FIND_INTERVAL, &mut self.intervals.find),
            (ENV_MDFIND_INTERVAL, &mut self.intervals.mdfind),
            (ENV_LOCATE_INTERVAL, &mut self.intervals.locate),
        ];

        for (key, interval) in targets {
            let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match humantime::parse_duration(value.trim()) {
                Ok(d) => {
                    debug!("[env] {key}={value}");
                    *interval = d;
                }
                Err(e) => warn!("[env] invalid duration ({value}) for {key:?}: {e}"),
            }
        }

        self
    }
}

fn parse_interval(name: &str, value: Option<&str>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(s) => humantime::parse_duration(s.trim())
            .with_context(|| format!("invalid interval {s:?} for source {name:?}")),
    }
}
