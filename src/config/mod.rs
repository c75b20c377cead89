//! Configuration types and options for the application.
//!
//! This module contains the raw configuration file schema, the project-file
//! [`Mode`], and the resolved [`Config`] consumed by the scan pipeline.

pub mod file;
pub mod mode;
pub mod scan;

pub use file::FileConfig;
pub use mode::Mode;
pub use scan::{Config, Intervals, SearchRoot};
