//! npm invocations
//!
//! Every install, prune and rebuild goes through the per-build
//! `--userconfig` file so the user's global npm configuration never leaks
//! into the build.

use super::ToolchainLocations;
use crate::config::Config;
use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::process::{CommandOutput, CommandRunner, Invocation};
use crate::version::{ExactVersion, Target};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// npm bound to one build's toolchain and settings
pub struct Npm<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
    search_path: Vec<PathBuf>,
    cwd: PathBuf,
    userconfig: PathBuf,
    env: BTreeMap<String, String>,
    production: bool,
}

impl<'a> Npm<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        toolchain: &ToolchainLocations,
        ctx: &BuildContext,
        config: &Config,
    ) -> Self {
        Self {
            runner,
            program: toolchain.npm(),
            search_path: toolchain.search_path(),
            cwd: ctx.build_dir.clone(),
            userconfig: ctx.npm_userconfig(),
            env: config.imported.clone(),
            production: config.install.production,
        }
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(self.program.to_string_lossy(), &self.cwd)
            .args(args.iter().copied())
            .envs(&self.env)
            .path_prepend(self.search_path.iter().cloned())
    }

    /// Arguments shared by every tree-modifying command
    fn tree_args<'b>(&'b self, command: &'b str) -> Vec<&'b str> {
        let mut args = vec![command, "--userconfig"];
        args.push(self.userconfig.to_str().unwrap_or(".npmrc"));
        if self.production && command != "rebuild" {
            args.push("--production");
        }
        args
    }

    /// The active npm version
    pub async fn version(&self) -> NodepackResult<ExactVersion> {
        let output = self.runner.run_checked(&self.invocation(&["--version"])).await?;
        ExactVersion::parse(&output.stdout).ok_or_else(|| {
            NodepackError::resolution(
                Target::Npm.to_string(),
                "bundled",
                format!("npm reported '{}'", output.stdout.trim()),
            )
        })
    }

    /// Replace the bundled npm with an exact version
    pub async fn install_self(&self, version: &ExactVersion) -> NodepackResult<CommandOutput> {
        let package = format!("npm@{}", version);
        self.runner
            .run_checked(&self.invocation(&["install", "--unsafe-perm", "--quiet", "-g", &package]))
            .await
    }

    /// Install declared modules that are missing or changed
    pub async fn install(&self) -> NodepackResult<CommandOutput> {
        let mut args = self.tree_args("install");
        args.insert(1, "--quiet");
        self.runner.run_checked(&self.invocation(&args)).await
    }

    /// Remove installed modules that are no longer declared
    pub async fn prune(&self) -> NodepackResult<CommandOutput> {
        self.runner
            .run_checked(&self.invocation(&self.tree_args("prune")))
            .await
    }

    /// Recompile native modules for the current architecture
    pub async fn rebuild(&self) -> NodepackResult<CommandOutput> {
        self.runner
            .run_checked(&self.invocation(&self.tree_args("rebuild")))
            .await
    }
}
