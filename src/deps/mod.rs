//! Dependency tree installation
//!
//! | Source | Cache | Strategy |
//! |--------|-------|----------|
//! | nothing | any | skip |
//! | prebuilt `node_modules` | any | `npm rebuild`, `npm install` |
//! | lockfile or manifest | usable | restore, `npm prune`, `npm install` |
//! | lockfile or manifest | invalid | empty tree, `npm install` |

pub mod install;
pub mod source;

pub use install::{install_dependencies, select_strategy, InstallStrategy};
pub use source::ManifestSource;
