//! Reading and writing the runtime cache area
//!
//! Layout under `cache_dir/node/`:
//!
//! | Entry | Content |
//! |-------|---------|
//! | `node-version` | runtime version of the last successful build |
//! | `npm-version` | package-manager version of the last successful build |
//! | `node_modules/` | dependency tree of the last successful build |

use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::fsutil;
use crate::version::ExactVersion;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const NODE_VERSION_FILE: &str = "node-version";
const NPM_VERSION_FILE: &str = "npm-version";
const MODULES_DIR: &str = "node_modules";

/// Entries of the flat layout used before the cache was namespaced
const LEGACY_ENTRIES: [&str; 3] = ["node_modules", "node-version", "npm-version"];

/// Toolchain scratch dirs that must not end up in the slug
const SCRATCH_DIRS: [&str; 2] = [".node-gyp", ".npm"];

/// What the previous successful build left in the cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    pub previous_node: Option<String>,
    pub previous_npm: Option<String>,
    pub modules_present: bool,
}

impl CacheRecord {
    pub async fn read(ctx: &BuildContext) -> NodepackResult<Self> {
        let area = ctx.node_cache();
        let record = Self {
            previous_node: read_version(&area.join(NODE_VERSION_FILE)).await?,
            previous_npm: read_version(&area.join(NPM_VERSION_FILE)).await?,
            modules_present: area.join(MODULES_DIR).is_dir(),
        };
        debug!("Cache record: {:?}", record);
        Ok(record)
    }
}

/// Single-line version record; missing or blank means unrecorded
pub async fn read_version(path: &Path) -> NodepackResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content
            .lines()
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(NodepackError::io(format!("reading {}", path.display()), e)),
    }
}

pub async fn write_version(path: &Path, version: &str) -> NodepackResult<()> {
    tokio::fs::write(path, format!("{}\n", version))
        .await
        .map_err(|e| NodepackError::io(format!("writing {}", path.display()), e))
}

/// Versions of the build being cached
#[derive(Debug, Clone, Copy)]
pub struct CacheWrite<'a> {
    pub node: &'a ExactVersion,
    pub npm: &'a ExactVersion,
}

/// What [`write_cache`] stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheWriteSummary {
    /// A dependency tree was copied into the cache
    pub modules_cached: bool,
}

/// Persist this build, then clean scratch and legacy entries.
///
/// The new cache area is assembled next to the old one and swapped in only
/// once complete, so a failed write leaves the previous cache intact. The
/// version records are always written. The dependency tree is only copied
/// when the build produced one.
pub async fn write_cache(
    ctx: &BuildContext,
    versions: CacheWrite<'_>,
) -> NodepackResult<CacheWriteSummary> {
    let area = ctx.node_cache();
    let staging = ctx
        .cache_dir
        .join(format!(".node-{}", Uuid::new_v4().simple()));
    let modules = ctx.modules_dir();
    let copy_modules = modules.is_dir();

    let staged = stage(&staging, &modules, copy_modules, versions).await;
    if let Err(e) = staged {
        let leftover = staging.clone();
        let _ = fsutil::blocking("removing cache staging dir", move || {
            fsutil::remove_path(&leftover)
        })
        .await;
        return Err(e);
    }

    clean(ctx).await?;

    let target = area.clone();
    fsutil::blocking(format!("replacing {}", area.display()), move || {
        fsutil::remove_path(&target)?;
        std::fs::rename(&staging, &target)
    })
    .await?;

    if copy_modules {
        info!("Cached node_modules for node {} / npm {}", versions.node, versions.npm);
    } else {
        debug!("No node_modules to cache");
    }

    Ok(CacheWriteSummary {
        modules_cached: copy_modules,
    })
}

async fn stage(
    staging: &Path,
    modules: &Path,
    copy_modules: bool,
    versions: CacheWrite<'_>,
) -> NodepackResult<()> {
    tokio::fs::create_dir_all(staging)
        .await
        .map_err(|e| NodepackError::io(format!("creating {}", staging.display()), e))?;
    write_version(&staging.join(NODE_VERSION_FILE), versions.node.as_str()).await?;
    write_version(&staging.join(NPM_VERSION_FILE), versions.npm.as_str()).await?;

    if copy_modules {
        let from = modules.to_path_buf();
        let to = staging.join(MODULES_DIR);
        fsutil::blocking(format!("caching {}", from.display()), move || {
            fsutil::copy_dir_recursive(&from, &to)
        })
        .await?;
    }
    Ok(())
}

/// Remove toolchain scratch dirs from the build and the legacy cache layout
pub async fn clean(ctx: &BuildContext) -> NodepackResult<()> {
    let mut doomed: Vec<_> = SCRATCH_DIRS.iter().map(|d| ctx.build_dir.join(d)).collect();
    doomed.extend(LEGACY_ENTRIES.iter().map(|e| ctx.cache_dir.join(e)));

    fsutil::blocking("cleaning scratch and legacy cache entries", move || {
        for path in &doomed {
            if path.exists() {
                debug!("Removing {}", path.display());
            }
            fsutil::remove_path(path)?;
        }
        Ok(())
    })
    .await
}

/// Copy the cached dependency tree into the build
pub async fn restore_modules(ctx: &BuildContext) -> NodepackResult<()> {
    let from = ctx.node_cache().join(MODULES_DIR);
    let to = ctx.modules_dir();
    fsutil::blocking(format!("restoring {}", from.display()), move || {
        fsutil::remove_path(&to)?;
        fsutil::copy_dir_recursive(&from, &to)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{module_names, Fixture};

    fn versions() -> (ExactVersion, ExactVersion) {
        (
            ExactVersion::parse("0.10.26").unwrap(),
            ExactVersion::parse("1.4.3").unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_cache_reads_as_nothing_recorded() {
        let fixture = Fixture::new();
        let record = CacheRecord::read(&fixture.ctx).await.unwrap();
        assert_eq!(record, CacheRecord::default());
    }

    #[tokio::test]
    async fn records_written_without_modules() {
        let fixture = Fixture::new();
        let (node, npm) = versions();

        let summary = write_cache(&fixture.ctx, CacheWrite { node: &node, npm: &npm })
            .await
            .unwrap();

        assert!(!summary.modules_cached);
        let area = fixture.ctx.node_cache();
        assert_eq!(
            std::fs::read_to_string(area.join("node-version")).unwrap(),
            "0.10.26\n"
        );
        assert_eq!(
            std::fs::read_to_string(area.join("npm-version")).unwrap(),
            "1.4.3\n"
        );
        assert!(!area.join("node_modules").exists());

        let record = CacheRecord::read(&fixture.ctx).await.unwrap();
        assert_eq!(record.previous_node.as_deref(), Some("0.10.26"));
        assert_eq!(record.previous_npm.as_deref(), Some("1.4.3"));
        assert!(!record.modules_present);
    }

    #[tokio::test]
    async fn modules_copied_and_stale_cache_replaced() {
        let fixture = Fixture::new();
        let (node, npm) = versions();
        fixture.cache_module("stale");
        fixture.install_module("express");

        let summary = write_cache(&fixture.ctx, CacheWrite { node: &node, npm: &npm })
            .await
            .unwrap();

        assert!(summary.modules_cached);
        assert_eq!(
            module_names(&fixture.ctx.node_cache().join("node_modules")),
            vec!["express".to_string()]
        );
        // The build keeps its own copy
        assert!(fixture.ctx.modules_dir().join("express").is_dir());
    }

    #[tokio::test]
    async fn scratch_and_legacy_entries_removed() {
        let fixture = Fixture::new();
        let ctx = &fixture.ctx;
        for dir in [ctx.build_dir.join(".npm"), ctx.build_dir.join(".node-gyp")] {
            std::fs::create_dir_all(dir.join("inner")).unwrap();
        }
        std::fs::create_dir_all(ctx.cache_dir.join("node_modules").join("old")).unwrap();
        std::fs::write(ctx.cache_dir.join("node-version"), "0.8.0\n").unwrap();
        std::fs::write(ctx.cache_dir.join("npm-version"), "1.2.0\n").unwrap();
        let (node, npm) = versions();

        write_cache(ctx, CacheWrite { node: &node, npm: &npm })
            .await
            .unwrap();

        assert!(!ctx.build_dir.join(".npm").exists());
        assert!(!ctx.build_dir.join(".node-gyp").exists());
        for legacy in LEGACY_ENTRIES {
            assert!(!ctx.cache_dir.join(legacy).exists(), "{} left behind", legacy);
        }
        assert!(ctx.node_cache().join("node-version").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_copy_keeps_previous_cache() {
        let fixture = Fixture::new();
        let ctx = &fixture.ctx;
        std::fs::create_dir_all(ctx.node_cache()).unwrap();
        std::fs::write(ctx.node_cache().join("node-version"), "0.8.0\n").unwrap();
        fixture.cache_module("previous");
        fixture.install_module("express");
        // Sockets cannot be copied
        let _listener = std::os::unix::net::UnixListener::bind(
            ctx.modules_dir().join("express").join("sock"),
        )
        .unwrap();
        let (node, npm) = versions();

        let result = write_cache(ctx, CacheWrite { node: &node, npm: &npm }).await;

        assert!(matches!(result, Err(NodepackError::Io { .. })));
        let record = CacheRecord::read(ctx).await.unwrap();
        assert_eq!(record.previous_node.as_deref(), Some("0.8.0"));
        assert_eq!(
            module_names(&ctx.node_cache().join("node_modules")),
            vec!["previous".to_string()]
        );
        let leftovers: Vec<_> = std::fs::read_dir(&ctx.cache_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".node-"))
            .collect();
        assert!(leftovers.is_empty(), "staging left behind: {:?}", leftovers);
    }

    #[tokio::test]
    async fn restore_replaces_build_modules() {
        let fixture = Fixture::new();
        fixture.cache_module("lodash");
        fixture.install_module("leftover");

        restore_modules(&fixture.ctx).await.unwrap();

        assert_eq!(
            module_names(&fixture.ctx.modules_dir()),
            vec!["lodash".to_string()]
        );
    }

    #[tokio::test]
    async fn blank_record_is_unrecorded() {
        let fixture = Fixture::new();
        let path = fixture.temp.path().join("node-version");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_version(&path).await.unwrap(), None);
    }
}
