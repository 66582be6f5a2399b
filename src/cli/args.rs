//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Nodepack - Node.js build orchestrator
///
/// Installs node and npm into the build directory, builds the dependency
/// tree and keeps it in the cache directory for the next build.
#[derive(Parser, Debug)]
#[command(name = "nodepack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application source tree, turned into the slug
    #[arg(value_name = "BUILD_DIR")]
    pub build_dir: PathBuf,

    /// Persistent cache shared between builds
    #[arg(value_name = "CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Directory of config variables, one file per variable
    #[arg(value_name = "ENV_DIR")]
    pub env_dir: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Where to write exports for later buildpacks
    #[arg(long, env = "NODEPACK_EXPORT_PATH", hide = true)]
    pub export_path: Option<PathBuf>,
}
