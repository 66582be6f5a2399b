//! Secondary toolchains: stylesheet preprocessor, front-end packages and
//! the task runner
//!
//! Every failure here fails the build.

pub mod frontend;
pub mod sass;

pub use frontend::{fetch_frontend_packages, find_gruntfile, run_task_runner};
pub use sass::{install_sass, save_sass_cache, SassInstall};

use crate::config::Config;
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::process::CommandRunner;
use crate::toolchain::ToolchainLocations;
use tracing::debug;

/// What the secondary stage did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryOutcome {
    /// Present when the sass gem was installed or restored
    pub sass: Option<SassInstall>,
    /// The task runner ran
    pub task_ran: bool,
}

/// Run the enabled secondary steps in order
pub async fn run_secondary(
    ctx: &BuildContext,
    config: &Config,
    runner: &dyn CommandRunner,
    toolchain: &mut ToolchainLocations,
) -> NodepackResult<SecondaryOutcome> {
    let mut outcome = SecondaryOutcome::default();

    if config.secondary.sass {
        outcome.sass = Some(install_sass(ctx, config, runner, toolchain).await?);
    } else {
        debug!("Stylesheet toolchain disabled");
    }

    if config.secondary.frontend {
        fetch_frontend_packages(ctx, config, runner, toolchain).await?;
        outcome.task_ran = run_task_runner(ctx, config, runner, toolchain).await?;
    } else {
        debug!("Front-end steps disabled");
    }

    Ok(outcome)
}
