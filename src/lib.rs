//! # editor-projects
//!
//! Discover Sublime Text (`.sublime-project`) and VS Code (`.code-workspace`)
//! project files across the filesystem and keep a cached, query-ready list
//! of them.
//!
//! This library provides the scan pipeline behind the `editor-projects` CLI:
//! discovery sources stream candidate paths, the streams are merged and
//! filtered, and the surviving files are parsed into [`project::Project`]s.
//! Both the raw per-source results and the final list are cached, and each
//! source is only rerun once its own interval has passed.

pub mod cache;
pub mod config;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod project;
pub mod scanner;
pub mod sources;
pub mod utils;
