//! Compile command - run the build pipeline once

use crate::cli::Cli;
use crate::config::ConfigManager;
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::pipeline::{Pipeline, Services};
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute a build for the directories given on the command line
pub async fn execute(cli: Cli) -> NodepackResult<()> {
    let ui = UiContext::detect();
    let export_path = cli
        .export_path
        .unwrap_or_else(BuildContext::default_export_path);
    let ctx = BuildContext::new(cli.build_dir, cli.cache_dir, cli.env_dir, export_path)?;
    debug!("Build context: {:?}", ctx);
    ui::intro(&ui, "Node.js app detected");

    let config = ConfigManager::new(ctx.env_dir.clone()).load().await?;
    if !config.imported.is_empty() {
        let names: Vec<&str> = config.imported.keys().map(String::as_str).collect();
        ui::key_value(&ui, "Imported config", &names.join(", "));
    }

    let services = Services::system(&config, &ui);
    let pipeline = Pipeline::new(ctx, config, services, ui.clone());

    match pipeline.run().await {
        Ok(state) => {
            debug!("Build finished: {:?}", state);
            ui::outro_success(&ui, "Build succeeded!");
            Ok(())
        }
        Err(e) => {
            ui::outro_error(&ui, "Build failed");
            Err(e)
        }
    }
}
