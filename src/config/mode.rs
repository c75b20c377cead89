//! Project-file families.
//!
//! The active [`Mode`] decides which file extension is searched for and which
//! cache keys are used, so two editors never share cached results.

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Editor whose project files are being discovered.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Sublime Text `.sublime-project` files
    #[default]
    Sublime,

    /// Visual Studio Code `.code-workspace` files
    #[value(name = "vscode")]
    #[serde(rename = "vscode")]
    VsCode,
}

impl Mode {
    /// File extension of this family's project files, including the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Sublime => ".sublime-project",
            Self::VsCode => ".code-workspace",
        }
    }

    /// Prefix prepended to every cache key written in this mode.
    #[must_use]
    pub const fn cache_prefix(self) -> &'static str {
        match self {
            Self::Sublime => "sublime",
            Self::VsCode => "vscode",
        }
    }

    /// Key of the structured project list.
    #[must_use]
    pub fn projects_key(self) -> String {
        format!("{}-projects.json", self.cache_prefix())
    }

    /// Key of the raw path list written by the named discovery source.
    #[must_use]
    pub fn source_key(self, source: &str) -> String {
        format!("{}-{source}.txt", self.cache_prefix())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sublime => write!(f, "sublime"),
            Self::VsCode => write!(f, "vscode"),
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sublime" | "subl" | "st" => Ok(Self::Sublime),
            "vscode" | "code" => Ok(Self::VsCode),
            other => anyhow::bail!("unknown mode {other:?} (expected \"sublime\" or \"vscode\")"),
        }
    }
}
