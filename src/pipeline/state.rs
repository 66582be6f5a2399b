//! Values passed between pipeline stages

use crate::cache::{CacheVerdict, CacheWriteSummary};
use crate::deps::{InstallStrategy, ManifestSource};
use crate::error::{NodepackError, NodepackResult};
use crate::manifest::{PackageManifest, VersionSpec};
use crate::secondary::SecondaryOutcome;
use crate::startup::StartupMethod;
use crate::toolchain::ToolchainLocations;
use crate::version::ExactVersion;

/// Everything the stages have decided so far.
///
/// Each field is written by exactly one stage; later stages read it through
/// the accessors, which fail if the producing stage has not run.
#[derive(Debug, Default)]
pub struct BuildState {
    pub manifest: PackageManifest,
    pub spec: VersionSpec,
    pub source: Option<ManifestSource>,
    pub node: Option<ExactVersion>,
    pub npm: Option<ExactVersion>,
    pub toolchain: Option<ToolchainLocations>,
    pub verdict: Option<CacheVerdict>,
    pub strategy: Option<InstallStrategy>,
    pub startup: Option<StartupMethod>,
    pub secondary: SecondaryOutcome,
    pub cached: Option<CacheWriteSummary>,
}

impl BuildState {
    pub fn source(&self) -> NodepackResult<&ManifestSource> {
        require(self.source.as_ref(), "manifest source")
    }

    pub fn node(&self) -> NodepackResult<&ExactVersion> {
        require(self.node.as_ref(), "node version")
    }

    pub fn npm(&self) -> NodepackResult<&ExactVersion> {
        require(self.npm.as_ref(), "npm version")
    }

    pub fn toolchain(&self) -> NodepackResult<&ToolchainLocations> {
        require(self.toolchain.as_ref(), "toolchain")
    }

    pub fn toolchain_mut(&mut self) -> NodepackResult<&mut ToolchainLocations> {
        require(self.toolchain.as_mut(), "toolchain")
    }

    pub fn verdict(&self) -> NodepackResult<&CacheVerdict> {
        require(self.verdict.as_ref(), "cache verdict")
    }
}

fn require<T>(value: Option<T>, what: &str) -> NodepackResult<T> {
    value.ok_or_else(|| NodepackError::Internal(format!("{} used before it was decided", what)))
}
