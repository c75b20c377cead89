//! Utility functions and helpers.
//!
//! This module contains utility functions used throughout the application,
//! such as the relaxed JSON preprocessing used for project files.

pub mod jsonc;

pub use jsonc::strip_jsonc;
