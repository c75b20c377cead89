//! Path-database discovery source (`locate`).

use std::path::PathBuf;

use anyhow::Result;

use super::command::line_command;
use crate::{config::Config, pipeline::ResultStream};

/// Known locations of the system path database.
pub const LOCATE_DATABASES: &[&str] = &[
    "/var/db/locate.database",
    "/var/lib/plocate/plocate.db",
    "/var/lib/mlocate/mlocate.db",
    "/var/cache/locate/locatedb",
];

/// Queries the precomputed system path database.
///
/// Without a database file this source is simply not ready; it is never an
/// error for the database to be missing.
#[derive(Clone, Debug)]
pub struct PathDatabase {
    program: String,
    databases: Vec<PathBuf>,
}

impl Default for PathDatabase {
    fn default() -> Self {
        Self::new("locate", LOCATE_DATABASES.iter().map(PathBuf::from).collect())
    }
}

impl PathDatabase {
    pub const NAME: &'static str = "locate";

    #[must_use]
    pub fn new(program: impl Into<String>, databases: Vec<PathBuf>) -> Self {
        Self {
            program: program.into(),
            databases,
        }
    }

    /// The first database file that exists, if any.
    #[must_use]
    pub fn database(&self) -> Option<&PathBuf> {
        self.databases.iter().find(|db| db.is_file())
    }

    /// Ready when a database exists and the query program can be found.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.database().is_some() && which::which(&self.program).is_ok()
    }

    /// Arguments passed to the query program.
    #[must_use]
    pub fn args(config: &Config) -> Vec<String> {
        vec![format!("*{}", config.mode.extension())]
    }

    /// Start the query and stream its results.
    ///
    /// # Errors
    ///
    /// Returns an error if the query program cannot be started.
    pub fn scan(&self, config: &Config) -> Result<ResultStream> {
        line_command(Self::NAME, &self.program, &Self::args(config))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_args() {
        assert_eq!(
            PathDatabase::args(&Config::default()),
            vec!["*.sublime-project"]
        );
    }

    #[test]
    fn test_not_ready_without_database() {
        let tmp = TempDir::new().unwrap();
        let source = PathDatabase::new("sh", vec![tmp.path().join("missing.db")]);

        assert!(source.database().is_none());
        assert!(!source.ready());
    }

    #[cfg(unix)]
    #[test]
    fn test_ready_with_database() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("locate.db");
        fs::write(&db, b"").unwrap();

        let source = PathDatabase::new("sh", vec![tmp.path().join("missing.db"), db.clone()]);
        assert_eq!(source.database(), Some(&db));
        assert!(source.ready());
    }
}
