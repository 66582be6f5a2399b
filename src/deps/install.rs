//! Installation strategy selection and execution

use super::ManifestSource;
use crate::cache::{self, CacheVerdict};
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::fsutil;
use crate::toolchain::Npm;
use std::fmt;
use tracing::{debug, info};

/// How the dependency tree is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// Nothing declares dependencies
    Skip,
    /// Recompile a committed tree, then add missing modules
    Rebuild,
    /// Start from the cached tree, drop undeclared modules, add new ones
    RestoreAndPrune,
    /// Start from an empty tree
    Fresh,
}

impl fmt::Display for InstallStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Skip => "skip install",
            Self::Rebuild => "rebuild prebuilt modules",
            Self::RestoreAndPrune => "restore cache and prune",
            Self::Fresh => "fresh install",
        };
        write!(f, "{}", name)
    }
}

/// Pick the strategy from what the tree provides and whether the cache holds
pub fn select_strategy(source: &ManifestSource, verdict: &CacheVerdict) -> InstallStrategy {
    match (source, verdict) {
        (ManifestSource::None, _) => InstallStrategy::Skip,
        (ManifestSource::Prebuilt, _) => InstallStrategy::Rebuild,
        (ManifestSource::Lockfile(_) | ManifestSource::ManifestOnly, CacheVerdict::Usable) => {
            InstallStrategy::RestoreAndPrune
        }
        (ManifestSource::Lockfile(_) | ManifestSource::ManifestOnly, CacheVerdict::Invalid(_)) => {
            InstallStrategy::Fresh
        }
    }
}

/// Run `strategy` against the build tree. Any failing npm step is fatal.
pub async fn install_dependencies(
    ctx: &BuildContext,
    npm: &Npm<'_>,
    strategy: InstallStrategy,
) -> NodepackResult<()> {
    debug!("Installing dependencies: {}", strategy);
    match strategy {
        InstallStrategy::Skip => {}
        InstallStrategy::Rebuild => {
            info!("Rebuilding prebuilt node_modules");
            npm.rebuild().await?;
            npm.install().await?;
        }
        InstallStrategy::RestoreAndPrune => {
            info!("Restoring node_modules from cache");
            cache::restore_modules(ctx).await?;
            npm.prune().await?;
            npm.install().await?;
        }
        InstallStrategy::Fresh => {
            let modules = ctx.modules_dir();
            fsutil::blocking(format!("removing {}", modules.display()), move || {
                fsutil::remove_path(&modules)
            })
            .await?;
            npm.install().await?;
        }
    }
    Ok(())
}
