//! Version resolution
//!
//! Turns a possibly-partial version specifier into an exact
//! `MAJOR.MINOR.PATCH` version. Exact specifiers never leave the process;
//! anything else is delegated to a [`VersionSource`].

mod service;

pub use service::SemverService;

use crate::error::{NodepackError, NodepackResult};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// What a version is being resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The runtime itself
    Node,
    /// The package manager bundled with (or installed over) the runtime
    Npm,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Npm => write!(f, "npm"),
        }
    }
}

/// An exact three-component numeric version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExactVersion(String);

impl ExactVersion {
    /// Accept `MAJOR.MINOR.PATCH` with numeric components only.
    ///
    /// Leading zeros are kept as written (`0.010.1` stays `0.010.1`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('.').collect();
        let numeric = parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        numeric.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External "resolve range to concrete version" capability
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Resolve `spec` (empty means latest stable) for `target`
    async fn resolve(&self, target: Target, spec: &str) -> NodepackResult<String>;
}

/// Resolve a specifier to an exact version.
///
/// Exact specifiers are returned unchanged without querying `source`.
/// Resolution failures are fatal and name both the specifier and target.
pub async fn resolve(
    source: &dyn VersionSource,
    target: Target,
    spec: Option<&str>,
) -> NodepackResult<ExactVersion> {
    let spec = spec.map(str::trim).unwrap_or_default();

    if let Some(exact) = ExactVersion::parse(spec) {
        debug!("{} version {} is already exact", target, exact);
        return Ok(exact);
    }

    let answer = source.resolve(target, spec).await?;
    ExactVersion::parse(&answer).ok_or_else(|| {
        NodepackError::resolution(
            target.to_string(),
            spec,
            format!("resolver returned '{}', not an exact version", answer.trim()),
        )
    })
}

/// Warnings worth surfacing about a requested runtime range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// No range declared, latest stable will be used
    Unspecified,
    /// Range has no upper bound and may jump major versions
    OpenEnded,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unspecified => {
                "No node version specified in package.json engines, defaulting to latest stable"
            }
            Self::OpenEnded => {
                "Open-ended node version range: a future build may pick up a new major version"
            }
        }
    }
}

/// Inspect the requested runtime range for risky patterns
pub fn advise(spec: Option<&str>) -> Option<Advisory> {
    let Some(spec) = spec.map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(Advisory::Unspecified);
    };
    if spec == "*" || spec == "x" || spec.starts_with('>') {
        let bounded = spec.contains('<') || spec.contains(" - ");
        if !bounded {
            return Some(Advisory::OpenEnded);
        }
    }
    None
}
