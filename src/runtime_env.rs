//! Environment scripts for the running app and for later buildpacks
//!
//! Both scripts are rewritten from scratch on every build. Stages that run
//! after the writer may append their own exports to the export file.

use crate::context::{BuildContext, TOOLCHAIN_HOME};
use crate::error::{NodepackError, NodepackResult};
use crate::toolchain::ToolchainLocations;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Startup-time script sourced from `.profile.d` with `$HOME` as the app root
pub fn profile_script() -> String {
    format!(
        "export PATH=\"$HOME/{home}/bin:$HOME/bin:$HOME/node_modules/.bin:$PATH\"\n\
         export NODE_HOME=\"$HOME/{home}\"\n",
        home = TOOLCHAIN_HOME,
    )
}

/// Build-stage script with the same exports as absolute build paths
pub fn export_script(ctx: &BuildContext, toolchain: &ToolchainLocations) -> String {
    format!(
        "export PATH=\"{bin}:{user_bin}:{modules_bin}:$PATH\"\n\
         export NODE_HOME=\"{home}\"\n",
        bin = toolchain.bin.display(),
        user_bin = ctx.build_dir.join("bin").display(),
        modules_bin = toolchain.modules_bin.display(),
        home = toolchain.home.display(),
    )
}

/// Overwrite both scripts
pub async fn write_runtime_env(
    ctx: &BuildContext,
    toolchain: &ToolchainLocations,
) -> NodepackResult<()> {
    write_script(&ctx.profile_script(), &profile_script()).await?;
    write_script(&ctx.export_path, &export_script(ctx, toolchain)).await?;
    debug!(
        "Wrote {} and {}",
        ctx.profile_script().display(),
        ctx.export_path.display()
    );
    Ok(())
}

/// Append `export NAME="value"` lines to the export file
pub async fn append_exports(path: &Path, vars: &[(&str, String)]) -> NodepackResult<()> {
    let context = || format!("appending to {}", path.display());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NodepackError::io(format!("creating {}", parent.display()), e))?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| NodepackError::io(context(), e))?;

    let lines: String = vars
        .iter()
        .map(|(name, value)| format!("export {}=\"{}\"\n", name, value))
        .collect();
    file.write_all(lines.as_bytes())
        .await
        .map_err(|e| NodepackError::io(context(), e))?;
    file.flush().await.map_err(|e| NodepackError::io(context(), e))
}

async fn write_script(path: &Path, content: &str) -> NodepackResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NodepackError::io(format!("creating {}", parent.display()), e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| NodepackError::io(format!("writing {}", path.display()), e))
}
