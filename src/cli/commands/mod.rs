//! CLI command implementations

pub mod compile;

pub use compile::execute as compile;
