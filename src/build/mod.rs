//! Build pipeline module for assetpipe
//!
//! Turns a [`BuildConfiguration`](crate::config::BuildConfiguration) into built
//! assets and a [`BuildManifest`] describing the outcome.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Expand asset definitions and glob patterns into assets
//! - **Staleness**: Compare each asset with the previous manifest
//! - **Execution**: Import, process and write every asset that is out of date
//!
//! # Example
//!
//! ```ignore
//! use assetpipe::build::{BuildEngine, BuildManifest};
//! use assetpipe::config::load_config;
//!
//! let mut config = load_config(Path::new("assetpipe.toml"))?;
//! let engine = BuildEngine::new(Environment::physical()?, builtin::components())?;
//!
//! let manifest = engine.build(&mut config, previous.as_ref())?;
//! println!("{}", manifest.summary());
//! ```

pub mod asset;
pub mod context;
pub mod discovery;
pub mod engine;
pub mod incremental;
pub mod manifest;
pub mod pipeline;
pub mod result;

pub use asset::*;
pub use context::*;
pub use discovery::*;
pub use engine::*;
pub use incremental::*;
pub use manifest::*;
pub use pipeline::*;
pub use result::*;
