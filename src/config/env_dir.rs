//! Env dir import
//!
//! The env dir holds one file per variable: the file name is the variable
//! name and the contents are its value.

use crate::error::{NodepackError, NodepackResult};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Variables that must never be overridden from the env dir
const BLACKLIST: &[&str] = &[
    "PATH",
    "GIT_DIR",
    "CPATH",
    "CPPATH",
    "LD_PRELOAD",
    "LIBRARY_PATH",
];

/// Whether a variable may be imported from the env dir
pub fn is_importable(name: &str) -> bool {
    !name.is_empty() && !BLACKLIST.contains(&name)
}

/// Read every importable variable from the env dir.
///
/// A missing directory imports nothing.
pub async fn import_env_dir(env_dir: &Path) -> NodepackResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();

    let mut entries = match fs::read_dir(env_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Env dir {} does not exist", env_dir.display());
            return Ok(vars);
        }
        Err(e) => {
            return Err(NodepackError::io(
                format!("reading env dir {}", env_dir.display()),
                e,
            ))
        }
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| NodepackError::io("iterating env dir", e))?
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_importable(&name) {
            debug!("Skipping blacklisted variable {}", name);
            continue;
        }

        let value = fs::read_to_string(&path)
            .await
            .map_err(|e| NodepackError::io(format!("reading {}", path.display()), e))?;
        vars.insert(name, value.trim_end_matches(['\n', '\r']).to_string());
    }

    debug!("Imported {} variables from env dir", vars.len());
    Ok(vars)
}
