//! Cache validity decision
//!
//! A cached dependency tree is only reused when nothing that could make
//! its native-compiled artifacts incompatible has changed. Any mismatch
//! invalidates the whole tree.

use std::fmt;

/// Everything the decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInputs<'a> {
    /// A dependency tree exists in the cache
    pub modules_cached: bool,
    /// The cache feature flag
    pub cache_enabled: bool,
    /// Runtime version recorded by the previous build
    pub previous_runtime: Option<&'a str>,
    /// Runtime version of this build
    pub runtime: &'a str,
    /// Package-manager version recorded by the previous build
    pub previous_package_manager: Option<&'a str>,
    /// Package-manager version of this build
    pub package_manager: &'a str,
}

/// Why a cache cannot be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReason {
    /// Nothing cached yet
    NoPriorCache,
    /// Disabled by configuration
    Disabled,
    /// Runtime version differs from the one that built the cache
    RuntimeChanged { from: String, to: String },
    /// Package-manager version differs from the one that built the cache
    PackageManagerChanged { from: String, to: String },
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPriorCache => write!(f, "no prior cache"),
            Self::Disabled => write!(f, "disabled by configuration"),
            Self::RuntimeChanged { from, to } => {
                write!(f, "runtime version changed ({} => {})", from, to)
            }
            Self::PackageManagerChanged { from, to } => {
                write!(f, "package manager version changed ({} => {})", from, to)
            }
        }
    }
}

/// Whether the cached dependency tree may be reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheVerdict {
    Usable,
    Invalid(InvalidationReason),
}

impl CacheVerdict {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }

    /// Human-readable reason for the build log
    pub fn reason(&self) -> String {
        match self {
            Self::Usable => "versions unchanged".to_string(),
            Self::Invalid(reason) => reason.to_string(),
        }
    }
}

/// Decide cache validity. First matching condition wins.
pub fn evaluate(inputs: &CacheInputs<'_>) -> CacheVerdict {
    if !inputs.modules_cached {
        return CacheVerdict::Invalid(InvalidationReason::NoPriorCache);
    }
    if !inputs.cache_enabled {
        return CacheVerdict::Invalid(InvalidationReason::Disabled);
    }
    if let Some(previous) = inputs.previous_runtime {
        if previous != inputs.runtime {
            return CacheVerdict::Invalid(InvalidationReason::RuntimeChanged {
                from: previous.to_string(),
                to: inputs.runtime.to_string(),
            });
        }
    }
    if let Some(previous) = inputs.previous_package_manager {
        if previous != inputs.package_manager {
            return CacheVerdict::Invalid(InvalidationReason::PackageManagerChanged {
                from: previous.to_string(),
                to: inputs.package_manager.to_string(),
            });
        }
    }
    CacheVerdict::Usable
}
