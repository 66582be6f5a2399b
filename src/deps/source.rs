//! Detection of where the dependency tree comes from

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lockfiles recognized next to `package.json`, in priority order
const LOCKFILES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

/// What the source tree already provides for its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// A `node_modules` dir was committed with the source
    Prebuilt,
    /// Exact versions are pinned by a lockfile
    Lockfile(PathBuf),
    /// Only `package.json` declares dependencies
    ManifestOnly,
    /// Nothing to install
    None,
}

impl ManifestSource {
    /// Decide once by first match: prebuilt tree, lockfile, manifest
    pub fn detect(build_dir: &Path) -> Self {
        let source = if build_dir.join("node_modules").is_dir() {
            Self::Prebuilt
        } else if let Some(lockfile) = LOCKFILES
            .iter()
            .map(|name| build_dir.join(name))
            .find(|path| path.is_file())
        {
            Self::Lockfile(lockfile)
        } else if build_dir.join("package.json").is_file() {
            Self::ManifestOnly
        } else {
            Self::None
        };
        debug!("Manifest source: {}", source);
        source
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prebuilt => write!(f, "prebuilt node_modules"),
            Self::Lockfile(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                write!(f, "{}", name)
            }
            Self::ManifestOnly => write!(f, "package.json"),
            Self::None => write!(f, "nothing"),
        }
    }
}
