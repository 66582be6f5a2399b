//! Configuration management for nodepack

pub mod env_dir;
pub mod schema;

pub use env_dir::import_env_dir;
pub use schema::Config;

use crate::error::NodepackResult;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Configuration manager
///
/// Combines the process environment with the variables imported from the
/// env dir. Imported values win.
pub struct ConfigManager {
    env_dir: Option<PathBuf>,
    process_env: BTreeMap<String, String>,
}

impl ConfigManager {
    /// Create a config manager reading the current process environment
    pub fn new(env_dir: Option<PathBuf>) -> Self {
        Self {
            env_dir,
            process_env: std::env::vars().collect(),
        }
    }

    /// Create a config manager with an explicit base environment
    pub fn with_process_env(env_dir: Option<PathBuf>, process_env: BTreeMap<String, String>) -> Self {
        Self {
            env_dir,
            process_env,
        }
    }

    /// Load configuration
    pub async fn load(&self) -> NodepackResult<Config> {
        let imported = match self.env_dir {
            Some(ref dir) => import_env_dir(dir).await?,
            None => BTreeMap::new(),
        };

        let mut merged = self.process_env.clone();
        merged.extend(imported.clone());

        let mut config = Config::from_vars(&merged);
        config.imported = imported;

        debug!(
            "Loaded config: {}",
            serde_json::to_string(&config).unwrap_or_default()
        );
        Ok(config)
    }
}
