//! Project records.
//!
//! This module contains the durable output of a scan: one [`Project`] per
//! discovered project file, with the folders it declares resolved to real
//! directories.
//!
//! ## Main Parts
//!
//! - [`Project`] - A parsed project file and its resolved folders
//! - [`resolve_path`] - Resolution of declared folders against the file's directory

#[allow(clippy::module_inception)]
pub mod project;

pub use project::{Project, clean_path, resolve_path};
