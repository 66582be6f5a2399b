//! Persistent dependency cache
//!
//! The cache dir is namespaced by concern: `node/` holds the dependency
//! tree and the versions that built it, `ruby/` holds the stylesheet
//! toolchain's gems.
//!
//! # Validity
//!
//! | Condition | Verdict |
//! |-----------|---------|
//! | no cached `node_modules` | invalid, no prior cache |
//! | `NODE_MODULES_CACHE=false` | invalid, disabled |
//! | node version changed | invalid, runtime changed |
//! | npm version changed | invalid, package manager changed |
//! | otherwise | usable |

pub mod record;
pub mod verdict;

pub use record::{clean, restore_modules, write_cache, CacheRecord, CacheWrite, CacheWriteSummary};
pub use verdict::{evaluate, CacheInputs, CacheVerdict, InvalidationReason};
