//! Nodepack - Node.js build orchestrator
//!
//! CLI entry point: `nodepack <BUILD_DIR> <CACHE_DIR> [ENV_DIR]`.

use clap::Parser;
use console::style;
use nodepack::cli::Cli;
use nodepack::error::NodepackResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> NodepackResult<()> {
    let cli = Cli::parse();

    // 0 = warn (build log only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("nodepack=warn"),
        1 => EnvFilter::new("nodepack=info"),
        _ => EnvFilter::new("nodepack=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    nodepack::cli::commands::compile(cli).await
}
