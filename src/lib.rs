//! Assetpipe - incremental asset build pipeline
//!
//! This library provides functionality to:
//! - Resolve asset definitions and glob patterns to source files
//! - Run each asset through a typed import, process and write pipeline
//! - Persist a binary manifest and skip unchanged assets on the next build

pub mod build;
pub mod builtin;
pub mod cli;
pub mod config;
pub mod glob;
pub mod io;
pub mod log;
pub mod path;
pub mod registry;
