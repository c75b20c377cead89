//! Content-index discovery source (Spotlight's `mdfind`).

use anyhow::Result;

use super::command::line_command;
use crate::{config::Config, pipeline::ResultStream};

/// Queries the OS content index for files named like project files.
///
/// `mdfind -name` is a substring match, so this source is noisy; the
/// extension filter downstream cleans it up.
#[derive(Clone, Debug)]
pub struct ContentIndex {
    program: String,
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self::new("mdfind")
    }
}

impl ContentIndex {
    pub const NAME: &'static str = "mdfind";

    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Ready when the query program can be found.
    #[must_use]
    pub fn ready(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Arguments passed to the query program.
    #[must_use]
    pub fn args(config: &Config) -> Vec<String> {
        vec!["-name".to_string(), config.mode.extension().to_string()]
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
