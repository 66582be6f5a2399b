//! Startup method detection and Procfile synthesis

use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::manifest::PackageManifest;
use std::fmt;
use tracing::debug;

/// Entry file run directly when nothing else declares how to start
const DEFAULT_ENTRY: &str = "server.js";

/// How the deployed application is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMethod {
    /// A Procfile was committed and is used unchanged
    ExistingProcessFile,
    /// `scripts.start` in package.json
    PackageStartScript,
    /// `server.js` at the root of the tree
    DefaultEntryFile,
    /// No way to start the app was found
    None,
}

impl StartupMethod {
    /// Decide once by first match
    pub fn detect(ctx: &BuildContext, manifest: &PackageManifest) -> Self {
        let method = if ctx.procfile().is_file() {
            Self::ExistingProcessFile
        } else if manifest.start_script().is_some() {
            Self::PackageStartScript
        } else if ctx.build_dir.join(DEFAULT_ENTRY).is_file() {
            Self::DefaultEntryFile
        } else {
            Self::None
        };
        debug!("Startup method: {:?}", method);
        method
    }

    /// Procfile content to synthesize, if any
    pub fn process_declaration(&self) -> Option<String> {
        match self {
            Self::PackageStartScript => Some("web: npm start\n".to_string()),
            Self::DefaultEntryFile => Some(format!("web: node {}\n", DEFAULT_ENTRY)),
            Self::ExistingProcessFile | Self::None => None,
        }
    }
}

impl fmt::Display for StartupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExistingProcessFile => write!(f, "existing Procfile"),
            Self::PackageStartScript => write!(f, "npm start"),
            Self::DefaultEntryFile => write!(f, "node {}", DEFAULT_ENTRY),
            Self::None => write!(f, "none"),
        }
    }
}

/// Write the Procfile for `method` when one must be synthesized
pub async fn write_process_declaration(
    ctx: &BuildContext,
    method: StartupMethod,
) -> NodepackResult<bool> {
    let Some(content) = method.process_declaration() else {
        return Ok(false);
    };
    let path = ctx.procfile();
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| NodepackError::io(format!("writing {}", path.display()), e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    const WITH_START: &str = r#"{"scripts": {"start": "node app.js"}}"#;

    fn procfile(fixture: &Fixture) -> Option<String> {
        std::fs::read_to_string(fixture.ctx.procfile()).ok()
    }

    #[tokio::test]
    async fn existing_procfile_left_untouched() {
        let fixture = Fixture::new();
        fixture.write_build_file("Procfile", "web: node custom.js\n");
        fixture.write_build_file("server.js", "");
        let manifest = PackageManifest::parse(WITH_START).unwrap();

        let method = StartupMethod::detect(&fixture.ctx, &manifest);
        assert_eq!(method, StartupMethod::ExistingProcessFile);
        assert!(!write_process_declaration(&fixture.ctx, method).await.unwrap());
        assert_eq!(procfile(&fixture).as_deref(), Some("web: node custom.js\n"));
    }

    #[tokio::test]
    async fn start_script_beats_default_entry() {
        let fixture = Fixture::new();
        fixture.write_build_file("server.js", "");
        let manifest = PackageManifest::parse(WITH_START).unwrap();

        let method = StartupMethod::detect(&fixture.ctx, &manifest);
        assert_eq!(method, StartupMethod::PackageStartScript);
        assert!(write_process_declaration(&fixture.ctx, method).await.unwrap());
        assert_eq!(procfile(&fixture).as_deref(), Some("web: npm start\n"));
    }

    #[tokio::test]
    async fn default_entry_file() {
        let fixture = Fixture::new();
        fixture.write_build_file("server.js", "");

        let method = StartupMethod::detect(&fixture.ctx, &PackageManifest::default());
        assert_eq!(method, StartupMethod::DefaultEntryFile);
        write_process_declaration(&fixture.ctx, method).await.unwrap();
        assert_eq!(procfile(&fixture).as_deref(), Some("web: node server.js\n"));
    }

    #[tokio::test]
    async fn nothing_to_start_writes_nothing() {
        let fixture = Fixture::new();
        let manifest = PackageManifest::parse(r#"{"scripts": {"start": "  "}}"#).unwrap();

        let method = StartupMethod::detect(&fixture.ctx, &manifest);
        assert_eq!(method, StartupMethod::None);
        assert!(!write_process_declaration(&fixture.ctx, method).await.unwrap());
        assert!(procfile(&fixture).is_none());
    }
}
