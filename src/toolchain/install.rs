//! Node and npm installation into the toolchain home

use super::archive::{node_archive_url, ArchiveFetcher};
use super::npm::Npm;
use super::ToolchainLocations;
use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::fsutil;
use crate::version::{self, ExactVersion, Target, VersionSource};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Download node `version` and install it into the toolchain home.
///
/// The archive is unpacked into a scratch directory first; the contents of
/// its single top-level directory then replace the toolchain home.
pub async fn install_node(
    ctx: &BuildContext,
    version: &ExactVersion,
    mirror: &str,
    fetcher: &dyn ArchiveFetcher,
) -> NodepackResult<ToolchainLocations> {
    let url = node_archive_url(mirror, version);
    let scratch = std::env::temp_dir().join(format!("nodepack-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&scratch)
        .await
        .map_err(|e| NodepackError::io("creating download directory", e))?;

    let result = unpack_into_home(ctx, &url, &scratch, fetcher).await;

    // Clean up scratch directory (best-effort)
    let _ = tokio::fs::remove_dir_all(&scratch).await;

    let home = result?;
    info!("Installed node {} into {}", version, home.display());
    Ok(ToolchainLocations::new(home, &ctx.build_dir))
}

async fn unpack_into_home(
    ctx: &BuildContext,
    url: &str,
    scratch: &Path,
    fetcher: &dyn ArchiveFetcher,
) -> NodepackResult<PathBuf> {
    fetcher.fetch_and_extract(url, scratch).await?;

    let home = ctx.toolchain_home();
    let scratch = scratch.to_path_buf();
    let target = home.clone();
    fsutil::blocking(format!("installing node into {}", home.display()), move || {
        let root = extracted_root(&scratch)?;
        debug!("Extracted archive root: {}", root.display());
        fsutil::remove_path(&target)?;
        fsutil::move_dir_contents(&root, &target)?;
        fsutil::make_executable(&target.join("bin"))
    })
    .await?;

    Ok(home)
}

/// The single top-level directory of an extracted archive, or the
/// extraction dir itself when the archive is flat
fn extracted_root(dir: &Path) -> std::io::Result<PathBuf> {
    let entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(dir.to_path_buf()),
    }
}

/// Settle the active npm version.
///
/// Without a requested range the bundled npm is kept. Otherwise the range
/// is resolved and installed globally unless it matches the bundled one.
pub async fn ensure_npm(
    npm: &Npm<'_>,
    spec: Option<&str>,
    versions: &dyn VersionSource,
) -> NodepackResult<ExactVersion> {
    let bundled = npm.version().await?;

    let Some(spec) = spec else {
        debug!("Using bundled npm {}", bundled);
        return Ok(bundled);
    };

    let requested = version::resolve(versions, Target::Npm, Some(spec)).await?;
    if requested == bundled {
        info!("npm {} already bundled with node", bundled);
        return Ok(bundled);
    }

    info!("Replacing bundled npm {} with {}", bundled, requested);
    npm.install_self(&requested).await?;
    Ok(requested)
}
