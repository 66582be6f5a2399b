//! Build pipeline
//!
//! A build is an ordered list of named stages run one after another by
//! [`Pipeline::run`]. The first failing stage aborts the build. Writing the
//! cache is the last stage, so a failed build never touches it.

mod state;

pub use state::BuildState;

use crate::cache::{self, CacheInputs, CacheRecord, CacheWrite};
use crate::config::Config;
use crate::context::BuildContext;
use crate::deps::{self, InstallStrategy, ManifestSource};
use crate::error::NodepackResult;
use crate::manifest::PackageManifest;
use crate::process::{CommandRunner, SystemRunner};
use crate::runtime_env;
use crate::secondary;
use crate::startup::{self, StartupMethod};
use crate::toolchain::{self, ArchiveFetcher, HttpArchiveFetcher, Npm};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::version::{self, SemverService, Target, VersionSource};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One step of the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadManifest,
    DetectSources,
    ResolveVersions,
    InstallToolchain,
    EvaluateCache,
    InstallDependencies,
    DetectStartup,
    WriteRuntimeEnv,
    SecondaryToolchains,
    WriteCache,
}

impl Stage {
    /// Execution order
    pub const ORDER: [Stage; 10] = [
        Stage::ReadManifest,
        Stage::DetectSources,
        Stage::ResolveVersions,
        Stage::InstallToolchain,
        Stage::EvaluateCache,
        Stage::InstallDependencies,
        Stage::DetectStartup,
        Stage::WriteRuntimeEnv,
        Stage::SecondaryToolchains,
        Stage::WriteCache,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadManifest => "read-manifest",
            Self::DetectSources => "detect-sources",
            Self::ResolveVersions => "resolve-versions",
            Self::InstallToolchain => "install-toolchain",
            Self::EvaluateCache => "evaluate-cache",
            Self::InstallDependencies => "install-dependencies",
            Self::DetectStartup => "detect-startup",
            Self::WriteRuntimeEnv => "write-runtime-env",
            Self::SecondaryToolchains => "secondary-toolchains",
            Self::WriteCache => "write-cache",
        }
    }

    /// Build log header, for stages that narrate
    fn title(&self) -> Option<&'static str> {
        match self {
            Self::ResolveVersions => Some("Resolving engine versions"),
            Self::InstallToolchain => Some("Installing binaries"),
            Self::EvaluateCache => Some("Restoring cache"),
            Self::InstallDependencies => Some("Building dependencies"),
            Self::DetectStartup => Some("Detecting startup method"),
            Self::SecondaryToolchains => Some("Installing secondary toolchains"),
            Self::WriteCache => Some("Caching node_modules for future builds"),
            Self::ReadManifest | Self::DetectSources | Self::WriteRuntimeEnv => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// External collaborators
#[derive(Clone)]
pub struct Services {
    pub versions: Arc<dyn VersionSource>,
    pub archives: Arc<dyn ArchiveFetcher>,
    pub runner: Arc<dyn CommandRunner>,
}

impl Services {
    /// HTTP resolver and mirror, host subprocesses
    pub fn system(config: &Config, ui: &UiContext) -> Self {
        Self {
            versions: Arc::new(SemverService::new(&config.endpoints.resolver_url)),
            archives: Arc::new(HttpArchiveFetcher::new(ui)),
            runner: Arc::new(SystemRunner::new()),
        }
    }
}

/// A configured build, ready to run
pub struct Pipeline {
    ctx: BuildContext,
    config: Config,
    services: Services,
    ui: UiContext,
}

impl Pipeline {
    pub fn new(ctx: BuildContext, config: Config, services: Services, ui: UiContext) -> Self {
        Self {
            ctx,
            config,
            services,
            ui,
        }
    }

    /// Run every stage in order, stopping at the first error
    pub async fn run(&self) -> NodepackResult<BuildState> {
        let mut state = BuildState::default();
        for stage in Stage::ORDER {
            debug!("Stage {}", stage);
            if let Some(title) = stage.title() {
                ui::section(&self.ui, title);
            }
            self.run_stage(stage, &mut state)
                .await
                .inspect_err(|e| debug!("Stage {} failed: {}", stage, e))?;
        }
        Ok(state)
    }

    async fn run_stage(&self, stage: Stage, state: &mut BuildState) -> NodepackResult<()> {
        match stage {
            Stage::ReadManifest => self.read_manifest(state).await,
            Stage::DetectSources => {
                state.source = Some(ManifestSource::detect(&self.ctx.build_dir));
                Ok(())
            }
            Stage::ResolveVersions => self.resolve_versions(state).await,
            Stage::InstallToolchain => self.install_toolchain(state).await,
            Stage::EvaluateCache => self.evaluate_cache(state).await,
            Stage::InstallDependencies => self.install_dependencies(state).await,
            Stage::DetectStartup => self.detect_startup(state).await,
            Stage::WriteRuntimeEnv => {
                runtime_env::write_runtime_env(&self.ctx, state.toolchain()?).await
            }
            Stage::SecondaryToolchains => {
                let runner = &*self.services.runner;
                let toolchain = state.toolchain_mut()?;
                let outcome =
                    secondary::run_secondary(&self.ctx, &self.config, runner, toolchain).await?;
                state.secondary = outcome;
                Ok(())
            }
            Stage::WriteCache => self.write_cache(state).await,
        }
    }

    fn npm<'a>(&'a self, state: &BuildState) -> NodepackResult<Npm<'a>> {
        Ok(Npm::new(
            &*self.services.runner,
            state.toolchain()?,
            &self.ctx,
            &self.config,
        ))
    }

    async fn read_manifest(&self, state: &mut BuildState) -> NodepackResult<()> {
        state.manifest = PackageManifest::from_file(&self.ctx.manifest_path()).await?;
        state.spec = state.manifest.version_spec();
        Ok(())
    }

    async fn resolve_versions(&self, state: &mut BuildState) -> NodepackResult<()> {
        let spec = state.spec.node.as_deref();
        ui::key_value(&self.ui, "engines.node", spec.unwrap_or("unspecified"));
        ui::key_value(
            &self.ui,
            "engines.npm",
            state.spec.npm.as_deref().unwrap_or("unspecified (use default)"),
        );
        if let Some(advisory) = version::advise(spec) {
            ui::step_warn(&self.ui, advisory.message());
        }

        let node = version::resolve(&*self.services.versions, Target::Node, spec).await?;
        ui::step_ok(&self.ui, &format!("Resolved node version: {}", node));
        state.node = Some(node);
        Ok(())
    }

    async fn install_toolchain(&self, state: &mut BuildState) -> NodepackResult<()> {
        let node = state.node()?;
        let mut spinner = TaskSpinner::new(&self.ui);
        spinner.start(&format!("Downloading and installing node {}...", node));
        let locations = toolchain::install_node(
            &self.ctx,
            node,
            &self.config.endpoints.node_mirror,
            &*self.services.archives,
        )
        .await
        .inspect_err(|_| spinner.stop_error(&format!("node {} install failed", node)))?;
        spinner.stop(&format!("Installed node {}", node));
        state.toolchain = Some(locations);

        let npm = self.npm(state)?;
        let active = toolchain::ensure_npm(
            &npm,
            state.spec.npm.as_deref(),
            &*self.services.versions,
        )
        .await?;
        ui::step_ok(&self.ui, &format!("Using npm {}", active));
        state.npm = Some(active);
        Ok(())
    }

    async fn evaluate_cache(&self, state: &mut BuildState) -> NodepackResult<()> {
        let record = CacheRecord::read(&self.ctx).await?;
        let verdict = cache::evaluate(&CacheInputs {
            modules_cached: record.modules_present,
            cache_enabled: self.config.cache.enabled,
            previous_runtime: record.previous_node.as_deref(),
            runtime: state.node()?.as_str(),
            previous_package_manager: record.previous_npm.as_deref(),
            package_manager: state.npm()?.as_str(),
        });

        if verdict.is_usable() {
            ui::step_ok_detail(&self.ui, "Cache usable", &verdict.reason());
        } else {
            ui::step_info(&self.ui, &format!("Skipping cache: {}", verdict.reason()));
        }
        state.verdict = Some(verdict);
        Ok(())
    }

    async fn install_dependencies(&self, state: &mut BuildState) -> NodepackResult<()> {
        let source = state.source()?;
        let strategy = deps::select_strategy(source, state.verdict()?);
        ui::key_value(&self.ui, "Dependencies from", &source.to_string());
        ui::key_value(&self.ui, "Strategy", &strategy.to_string());

        if strategy == InstallStrategy::Skip {
            ui::step_warn_hint(
                &self.ui,
                "No package.json found",
                "nothing to install",
            );
        }

        deps::install_dependencies(&self.ctx, &self.npm(state)?, strategy).await?;
        state.strategy = Some(strategy);
        Ok(())
    }

    async fn detect_startup(&self, state: &mut BuildState) -> NodepackResult<()> {
        let method = StartupMethod::detect(&self.ctx, &state.manifest);
        if startup::write_process_declaration(&self.ctx, method).await? {
            ui::step_ok_detail(&self.ui, "Wrote Procfile", &method.to_string());
        } else if method == StartupMethod::None {
            ui::step_warn_hint(
                &self.ui,
                "No Procfile, start script or server.js found",
                "the app will have no default web process",
            );
        } else {
            ui::step_ok(&self.ui, &format!("Using {}", method));
        }
        state.startup = Some(method);
        Ok(())
    }

    async fn write_cache(&self, state: &mut BuildState) -> NodepackResult<()> {
        let summary = cache::write_cache(
            &self.ctx,
            CacheWrite {
                node: state.node()?,
                npm: state.npm()?,
            },
        )
        .await?;
        if let Some(ref sass) = state.secondary.sass {
            secondary::save_sass_cache(&self.ctx, sass).await?;
        }

        if summary.modules_cached {
            ui::step_ok(&self.ui, "Cached node_modules");
        } else {
            ui::step_info(&self.ui, "No node_modules to cache, recorded versions only");
        }
        state.cached = Some(summary);
        Ok(())
    }
}
