//! Nodepack - Node.js build orchestrator
//!
//! Resolves and installs node and npm into an application's build tree,
//! builds its dependency tree, and keeps a side-cache that makes repeated
//! builds fast.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod deps;
pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod runtime_env;
pub mod secondary;
pub mod startup;
pub mod toolchain;
pub mod ui;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NodepackError, NodepackResult};
