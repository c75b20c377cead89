//! Configuration file support.
//!
//! This module provides support for loading configuration from a TOML file
//! located at `~/.config/editor-projects/config.toml` (or the platform-specific
//! equivalent). The raw file is deserialized into [`FileConfig`], whose fields
//! are all optional, and later resolved into a
//! [`Config`](crate::config::Config) with defaults filled in.
//!
//! # Example config
//!
//! ```toml
//! mode = "sublime"
//! depth = 2
//! excludes = ["/tmp/*", "*/node_modules/*"]
//!
//! [intervals]
//! find = "5m"
//! mdfind = "5m"
//! locate = "24h"   # "0s" disables a source
//!
//! [[paths]]
//! path = "~/Code"
//! depth = 3
//! excludes = ["*/vendor/*"]
//!
//! [[paths]]
//! path = "~/Dropbox"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use super::Mode;

/// Top-level configuration file structure.
///
/// Everything is optional so an empty file is a valid configuration.
#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    /// Project-file family to search for
    pub mode: Option<Mode>,

    /// Default traversal depth for `[[paths]]` entries
    pub depth: Option<usize>,

    /// Glob patterns excluded from every source
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Rescan intervals per discovery source
    #[serde(default)]
    pub intervals: FileIntervalConfig,

    /// Directories searched by the tree-walk source
    #[serde(default)]
    pub paths: Vec<FileSearchPath>,
}

/// Per-source rescan intervals, as humantime strings (`"5m"`, `"24h"`).
#[derive(Deserialize, Default, Debug)]
pub struct FileIntervalConfig {
    pub find: Option<String>,
    pub mdfind: Option<String>,
    pub locate: Option<String>,
}

/// One `[[paths]]` entry.
#[derive(Deserialize, Debug)]
pub struct FileSearchPath {
    /// Root directory; a leading `~` is expanded
    pub path: PathBuf,

    /// Traversal depth; absent or `0` inherits the top-level depth
    pub depth: Option<usize>,

    /// Glob patterns pruned while walking this root only
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// `None` if the platform config directory cannot be determined.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("editor-projects").join("config.toml"))
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not
    /// valid TOML for this schema.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }
}
