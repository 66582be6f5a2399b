//! Build context and the directory layout derived from it

use crate::error::{NodepackError, NodepackResult};
use std::path::{Path, PathBuf};

/// Toolchain home relative to the build (and, at runtime, `$HOME`)
pub const TOOLCHAIN_HOME: &str = ".heroku/node";

/// Directories the pipeline reads and writes for one build
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Application source tree, becomes the slug
    pub build_dir: PathBuf,
    /// Persistent cross-build cache
    pub cache_dir: PathBuf,
    /// One-file-per-variable config import (optional)
    pub env_dir: Option<PathBuf>,
    /// Script sourced by later buildpacks in the same build
    pub export_path: PathBuf,
}

impl BuildContext {
    /// Create a context, validating that the build directory exists
    pub fn new(
        build_dir: PathBuf,
        cache_dir: PathBuf,
        env_dir: Option<PathBuf>,
        export_path: PathBuf,
    ) -> NodepackResult<Self> {
        if !build_dir.is_dir() {
            return Err(NodepackError::PathNotFound(build_dir));
        }
        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            NodepackError::io(format!("creating cache directory {}", cache_dir.display()), e)
        })?;

        Ok(Self {
            build_dir,
            cache_dir,
            env_dir,
            export_path,
        })
    }

    /// Default location of the export file: `<buildpack root>/export`.
    ///
    /// The binary lives in `<root>/bin/`, so the root is two levels up.
    pub fn default_export_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("export")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.build_dir.join("package.json")
    }

    /// Installed dependency tree inside the build
    pub fn modules_dir(&self) -> PathBuf {
        self.build_dir.join("node_modules")
    }

    pub fn toolchain_home(&self) -> PathBuf {
        self.build_dir.join(TOOLCHAIN_HOME)
    }

    /// Per-build npm configuration override
    pub fn npm_userconfig(&self) -> PathBuf {
        self.build_dir.join(".npmrc")
    }

    pub fn procfile(&self) -> PathBuf {
        self.build_dir.join("Procfile")
    }

    pub fn profile_script(&self) -> PathBuf {
        self.build_dir.join(".profile.d").join("nodejs.sh")
    }

    /// Where gems for the stylesheet toolchain are installed
    pub fn gem_home(&self) -> PathBuf {
        self.build_dir.join(".gem")
    }

    /// Runtime concern of the cache
    pub fn node_cache(&self) -> PathBuf {
        self.cache_dir.join("node")
    }

    /// Stylesheet toolchain concern of the cache
    pub fn ruby_cache(&self) -> PathBuf {
        self.cache_dir.join("ruby")
    }
}
