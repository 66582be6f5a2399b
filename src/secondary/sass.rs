//! Stylesheet preprocessor (the sass gem)
//!
//! Gems live in `build_dir/.gem` and are cached under `cache_dir/ruby/`
//! together with the Ruby version that installed them. The cache is
//! judged by the same evaluator as the dependency tree, with Ruby in the
//! runtime role.

use crate::cache::record::{read_version, write_version};
use crate::cache::{self, CacheInputs, CacheVerdict};
use crate::config::Config;
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::fsutil;
use crate::process::{CommandRunner, Invocation};
use crate::runtime_env;
use crate::toolchain::ToolchainLocations;
use tracing::{debug, info};

const GEM: &str = "sass";
const CACHED_GEMS: &str = ".gem";
const RUBY_VERSION_FILE: &str = "ruby-version";

/// Result of the stylesheet step, needed to save its cache later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SassInstall {
    pub ruby_version: String,
    pub verdict: CacheVerdict,
}

/// Restore or install the sass gem and expose its executables
pub async fn install_sass(
    ctx: &BuildContext,
    config: &Config,
    runner: &dyn CommandRunner,
    toolchain: &mut ToolchainLocations,
) -> NodepackResult<SassInstall> {
    let ruby_version = ruby_version(ctx, runner, toolchain).await?;
    let cached = ctx.ruby_cache().join(CACHED_GEMS);
    let previous = read_version(&ctx.ruby_cache().join(RUBY_VERSION_FILE)).await?;

    let verdict = cache::evaluate(&CacheInputs {
        modules_cached: cached.is_dir(),
        cache_enabled: config.cache.enabled,
        previous_runtime: previous.as_deref(),
        runtime: &ruby_version,
        previous_package_manager: None,
        package_manager: "",
    });

    let gem_home = ctx.gem_home();
    if verdict.is_usable() {
        info!("Restoring {} gem from cache", GEM);
        let target = gem_home.clone();
        fsutil::blocking(format!("restoring {}", cached.display()), move || {
            fsutil::remove_path(&target)?;
            fsutil::copy_dir_recursive(&cached, &target)
        })
        .await?;
    } else {
        info!("Installing {} gem ({})", GEM, verdict.reason());
        let target = gem_home.clone();
        fsutil::blocking(format!("removing {}", target.display()), move || {
            fsutil::remove_path(&target)
        })
        .await?;
        let invocation = Invocation::new("gem", &ctx.build_dir)
            .args(["install", GEM, "--no-document"])
            .envs(&config.imported)
            .env("GEM_HOME", gem_home.to_string_lossy())
            .path_prepend(toolchain.search_path());
        runner.run_checked(&invocation).await?;
    }

    let gem_bin = gem_home.join("bin");
    toolchain.add_bin(gem_bin.clone());
    runtime_env::append_exports(
        &ctx.export_path,
        &[
            ("GEM_HOME", gem_home.display().to_string()),
            ("PATH", format!("{}:$PATH", gem_bin.display())),
        ],
    )
    .await?;

    Ok(SassInstall {
        ruby_version,
        verdict,
    })
}

/// Persist the installed gems and the Ruby version that built them
pub async fn save_sass_cache(ctx: &BuildContext, install: &SassInstall) -> NodepackResult<()> {
    let area = ctx.ruby_cache();
    let gem_home = ctx.gem_home();
    let cached = area.join(CACHED_GEMS);

    let target = area.clone();
    fsutil::blocking(format!("caching {}", gem_home.display()), move || {
        fsutil::remove_path(&cached)?;
        std::fs::create_dir_all(&target)?;
        if gem_home.is_dir() {
            fsutil::copy_dir_recursive(&gem_home, &cached)?;
        }
        Ok(())
    })
    .await?;

    write_version(&area.join(RUBY_VERSION_FILE), &install.ruby_version).await?;
    debug!("Cached gems for ruby {}", install.ruby_version);
    Ok(())
}

async fn ruby_version(
    ctx: &BuildContext,
    runner: &dyn CommandRunner,
    toolchain: &ToolchainLocations,
) -> NodepackResult<String> {
    let invocation = Invocation::new("ruby", &ctx.build_dir)
        .args(["-e", "print RUBY_VERSION"])
        .path_prepend(toolchain.search_path());
    let output = runner.run_checked(&invocation).await?;
    Ok(output.stdout.trim().to_string())
}
