//! Build configuration.
//!
//! [`BuildConfiguration`] is what the engine consumes. It can be built in code
//! or loaded from an `assetpipe.toml` file via [`load_config`].

pub mod loader;
pub mod model;
pub mod schema;

pub use loader::*;
pub use model::*;
pub use schema::*;
