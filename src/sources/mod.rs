//! Discovery sources.
//!
//! Each source locates candidate project files through one OS facility and
//! streams the paths it finds. The set of sources is closed: [`Source`] is an
//! enum over the three implementations, and [`Source::all`] lists them in the
//! fixed order the scan manager visits them.
//!
//! | Source   | Facility                  | Interval key |
//! |----------|---------------------------|--------------|
//! | `find`   | native directory walk     | `find`       |
//! | `mdfind` | OS content index          | `mdfind`     |
//! | `locate` | system path database      | `locate`     |

pub mod command;
pub mod locate;
pub mod mdfind;
pub mod walk;

use std::time::Duration;

use anyhow::Result;

pub use locate::PathDatabase;
pub use mdfind::ContentIndex;
pub use walk::TreeWalk;

use crate::{cache::Cache, config::Config, pipeline::ResultStream};

/// One discovery source.
#[derive(Clone, Debug)]
pub enum Source {
    TreeWalk(TreeWalk),
    ContentIndex(ContentIndex),
    PathDatabase(PathDatabase),
}

impl Source {
    /// Every source with its default settings, in scan order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::TreeWalk(TreeWalk),
            Self::ContentIndex(ContentIndex::default()),
            Self::PathDatabase(PathDatabase::default()),
        ]
    }

    /// Short name, used in logs and cache keys.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TreeWalk(_) => TreeWalk::NAME,
            Self::ContentIndex(_) => ContentIndex::NAME,
            Self::PathDatabase(_) => PathDatabase::NAME,
        }
    }

    /// Configured rescan interval.
    #[must_use]
    pub const fn interval(&self, config: &Config) -> Duration {
        match self {
            Self::TreeWalk(_) => config.intervals.find,
            Self::ContentIndex(_) => config.intervals.mdfind,
            Self::PathDatabase(_) => config.intervals.locate,
        }
    }

    /// A zero interval permanently disables a source.
    #[must_use]
    pub const fn active(&self, config: &Config) -> bool {
        !self.interval(config).is_zero()
    }

    /// Whether the source can run at all right now.
    #[must_use]
    pub fn ready(&self, config: &Config) -> bool {
        self.active(config)
            && match self {
                Self::TreeWalk(_) => TreeWalk::ready(config),
                Self::ContentIndex(source) => source.ready(),
                Self::PathDatabase(source) => source.ready(),
            }
    }

    /// Key of this source's raw result list in the active mode.
    #[must_use]
    pub fn cache_key(&self, config: &Config) -> String {
        config.mode.source_key(self.name())
    }

    /// Whether this source's own cached results have outlived its interval.
    ///
    /// Inactive sources are never due.
    #[must_use]
    pub fn due(&self, config: &Config, cache: &Cache) -> bool {
        self.active(config) && cache.expired(&self.cache_key(config), self.interval(config))
    }

    /// Start the source and return its result stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query cannot be launched.
    pub fn scan(&self, config: &Config) -> Result<ResultStream> {
        match self {
            Self::TreeWalk(_) => TreeWalk::scan(config),
            Self::ContentIndex(source) => source.scan(config),
            Self::PathDatabase(source) => source.scan(config),
        }
    }
}
