//! Front-end package fetch and task runner

use crate::config::Config;
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::process::{CommandRunner, Invocation};
use crate::toolchain::ToolchainLocations;
use std::path::PathBuf;
use tracing::{debug, info};

/// Task runner config files, any one of which enables the task
const GRUNTFILES: [&str; 3] = ["Gruntfile.js", "gruntfile.js", "Gruntfile.coffee"];

/// `bower install` in the build tree
pub async fn fetch_frontend_packages(
    ctx: &BuildContext,
    config: &Config,
    runner: &dyn CommandRunner,
    toolchain: &ToolchainLocations,
) -> NodepackResult<()> {
    info!("Fetching front-end packages");
    let invocation = Invocation::new("bower", &ctx.build_dir)
        .arg("install")
        .envs(&config.imported)
        .path_prepend(toolchain.search_path());
    runner.run_checked(&invocation).await?;
    Ok(())
}

/// The task runner config present in the build tree
pub fn find_gruntfile(ctx: &BuildContext) -> Option<PathBuf> {
    GRUNTFILES
        .iter()
        .map(|name| ctx.build_dir.join(name))
        .find(|path| path.is_file())
}

/// Run `grunt heroku:{NODE_ENV}` when a Gruntfile exists.
///
/// Returns whether the task ran.
pub async fn run_task_runner(
    ctx: &BuildContext,
    config: &Config,
    runner: &dyn CommandRunner,
    toolchain: &ToolchainLocations,
) -> NodepackResult<bool> {
    let Some(gruntfile) = find_gruntfile(ctx) else {
        debug!("No Gruntfile, skipping task runner");
        return Ok(false);
    };

    let task = format!("heroku:{}", config.secondary.node_env);
    info!("Running grunt {} ({})", task, gruntfile.display());
    let invocation = Invocation::new("grunt", &ctx.build_dir)
        .arg(task)
        .envs(&config.imported)
        .env("NODE_ENV", &config.secondary.node_env)
        .path_prepend(toolchain.search_path());
    runner.run_checked(&invocation).await?;
    Ok(true)
}
