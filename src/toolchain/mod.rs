//! Runtime toolchain installation
//!
//! Installs the node binary distribution into the build's toolchain home
//! and settles which npm version is active. The result is a
//! [`ToolchainLocations`] value that later stages use to build search paths,
//! rather than mutating the process environment.

pub mod archive;
pub mod install;
pub mod npm;

pub use archive::{node_archive_url, ArchiveFetcher, HttpArchiveFetcher};
pub use install::{ensure_npm, install_node};
pub use npm::Npm;

use std::path::{Path, PathBuf};

/// Where installed executables live for the rest of the build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainLocations {
    /// Toolchain home (`NODE_HOME`)
    pub home: PathBuf,
    /// `{home}/bin`
    pub bin: PathBuf,
    /// `node_modules/.bin` of the application
    pub modules_bin: PathBuf,
    /// Executable dirs added by later stages (e.g. gem binaries)
    pub extra_bins: Vec<PathBuf>,
}

impl ToolchainLocations {
    pub fn new(home: PathBuf, build_dir: &Path) -> Self {
        Self {
            bin: home.join("bin"),
            home,
            modules_bin: build_dir.join("node_modules").join(".bin"),
            extra_bins: Vec::new(),
        }
    }

    /// Add an executable dir for subsequent invocations
    pub fn add_bin(&mut self, dir: PathBuf) {
        if !self.extra_bins.contains(&dir) {
            self.extra_bins.push(dir);
        }
    }

    /// Dirs to put in front of `PATH`, highest priority first
    pub fn search_path(&self) -> Vec<PathBuf> {
        std::iter::once(self.bin.clone())
            .chain(self.extra_bins.iter().cloned())
            .chain(std::iter::once(self.modules_bin.clone()))
            .collect()
    }

    pub fn npm(&self) -> PathBuf {
        self.bin.join("npm")
    }
}
