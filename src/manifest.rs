//! `package.json` parsing
//!
//! Only the fields the build needs are read: engine version ranges and the
//! start script. A `null` field reads the same as a missing one.

use crate::error::{NodepackError, NodepackResult};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

/// The fields of `package.json` used by the build
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    #[serde(deserialize_with = "null_as_default")]
    pub engines: Engines,

    #[serde(deserialize_with = "null_as_default")]
    pub scripts: BTreeMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Requested runtime and package-manager versions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Engines {
    pub node: Option<String>,
    pub npm: Option<String>,
}

/// Version ranges requested by the source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSpec {
    /// `engines.node`, `None` means latest stable
    pub node: Option<String>,
    /// `engines.npm`, `None` keeps the bundled npm
    pub npm: Option<String>,
}

impl PackageManifest {
    /// Parse a manifest from disk; a missing file yields an empty manifest
    pub async fn from_file(path: &Path) -> NodepackResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(NodepackError::io(
                    format!("reading manifest {}", path.display()),
                    e,
                ))
            }
        };
        Self::parse(&content).map_err(|e| match e {
            NodepackError::ManifestInvalid { reason, .. } => NodepackError::ManifestInvalid {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a manifest from a JSON string
    pub fn parse(content: &str) -> NodepackResult<Self> {
        serde_json::from_str(content).map_err(|e| NodepackError::ManifestInvalid {
            path: "package.json".into(),
            reason: e.to_string(),
        })
    }

    /// Engine ranges, with blank strings treated as absent
    pub fn version_spec(&self) -> VersionSpec {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        VersionSpec {
            node: clean(&self.engines.node),
            npm: clean(&self.engines.npm),
        }
    }

    pub fn start_script(&self) -> Option<&str> {
        self.scripts
            .get("start")
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "name": "shop",
        "engines": { "node": "0.10.x", "npm": " " },
        "scripts": { "start": "node app.js", "test": "mocha" },
        "dependencies": { "express": "~4.0.0", "async": "*" },
        "devDependencies": { "mocha": "1.x" }
    }"#;

    #[test]
    fn parse_engines_and_scripts() {
        let manifest = PackageManifest::parse(MANIFEST).unwrap();
        assert_eq!(
            manifest.version_spec(),
            VersionSpec {
                node: Some("0.10.x".to_string()),
                npm: None,
            }
        );
        assert_eq!(manifest.start_script(), Some("node app.js"));
    }

    #[test]
    fn null_fields_read_as_absent() {
        let manifest = PackageManifest::parse(
            r#"{"engines":null,"scripts":null,"dependencies":null,"devDependencies":null}"#,
        )
        .unwrap();
        assert_eq!(manifest.version_spec(), VersionSpec::default());
        assert!(manifest.start_script().is_none());

        let manifest = PackageManifest::parse(r#"{"engines":{"node":null,"npm":"1.4.x"}}"#).unwrap();
        assert_eq!(manifest.version_spec().node, None);
        assert_eq!(manifest.version_spec().npm.as_deref(), Some("1.4.x"));
    }

    #[test]
    fn empty_object_is_valid() {
        let manifest = PackageManifest::parse("{}").unwrap();
        assert_eq!(manifest.version_spec(), VersionSpec::default());
        assert!(manifest.start_script().is_none());
    }

    #[test]
    fn invalid_json_errors() {
        let result = PackageManifest::parse("{ not json");
        assert!(matches!(result, Err(NodepackError::ManifestInvalid { .. })));
    }

    #[tokio::test]
    async fn missing_file_is_empty_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest = PackageManifest::from_file(&temp.path().join("package.json"))
            .await
            .unwrap();
        assert_eq!(manifest.version_spec(), VersionSpec::default());
        assert!(manifest.scripts.is_empty());
    }

    #[tokio::test]
    async fn invalid_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(&path, "[").unwrap();

        let err = PackageManifest::from_file(&path).await.unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
