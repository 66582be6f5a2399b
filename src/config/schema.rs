//! Configuration schema for nodepack
//!
//! Settings come from the build environment: process variables overlaid
//! with the files of the env dir (see [`super::env_dir`]).

use serde::Serialize;
use std::collections::BTreeMap;

/// Default semver resolution service
pub const DEFAULT_RESOLVER_URL: &str = "https://semver.io";

/// Default node binary distribution mirror
pub const DEFAULT_NODE_MIRROR: &str = "https://nodejs.org/dist";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Dependency cache settings
    pub cache: CacheConfig,

    /// npm install settings
    pub install: InstallConfig,

    /// Stylesheet, front-end and task-runner settings
    pub secondary: SecondaryConfig,

    /// Remote services
    pub endpoints: EndpointConfig,

    /// Variables imported from the env dir, passed through verbatim to
    /// every build and task-runner invocation
    #[serde(skip)]
    pub imported: BTreeMap<String, String>,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize)]
pub struct CacheConfig {
    /// Reuse the cached dependency tree when valid (`NODE_MODULES_CACHE`)
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// npm install configuration
#[derive(Debug, Clone, Serialize)]
pub struct InstallConfig {
    /// Skip devDependencies (`NPM_CONFIG_PRODUCTION`)
    pub production: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self { production: true }
    }
}

/// Secondary toolchain configuration
#[derive(Debug, Clone, Serialize)]
pub struct SecondaryConfig {
    /// Install the sass gem (`NODEPACK_SASS`)
    pub sass: bool,

    /// Run the front-end fetch and the task runner (`NODEPACK_FRONTEND`)
    pub frontend: bool,

    /// Environment name passed to the task runner (`NODE_ENV`)
    pub node_env: String,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            sass: true,
            frontend: true,
            node_env: "production".to_string(),
        }
    }
}

/// Remote service endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EndpointConfig {
    /// Semver resolution service (`NODEPACK_RESOLVER_URL`)
    pub resolver_url: String,

    /// Node binary mirror (`NODEPACK_NODE_MIRROR`)
    pub node_mirror: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            node_mirror: DEFAULT_NODE_MIRROR.to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from a flat variable map
    pub fn from_vars(vars: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();

        config.cache.enabled = flag(vars.get("NODE_MODULES_CACHE"), config.cache.enabled);
        config.install.production =
            flag(vars.get("NPM_CONFIG_PRODUCTION"), config.install.production);
        config.secondary.sass = flag(vars.get("NODEPACK_SASS"), config.secondary.sass);
        config.secondary.frontend = flag(vars.get("NODEPACK_FRONTEND"), config.secondary.frontend);

        if let Some(env) = non_empty(vars.get("NODE_ENV")) {
            config.secondary.node_env = env;
        }
        if let Some(url) = non_empty(vars.get("NODEPACK_RESOLVER_URL")) {
            config.endpoints.resolver_url = url.trim_end_matches('/').to_string();
        }
        if let Some(mirror) = non_empty(vars.get("NODEPACK_NODE_MIRROR")) {
            config.endpoints.node_mirror = mirror.trim_end_matches('/').to_string();
        }

        config
    }
}

/// Interpret a boolean switch, keeping the default for unknown values
fn flag(value: Option<&String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("false" | "0" | "no" | "off") => false,
        Some("true" | "1" | "yes" | "on") => true,
        _ => default,
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(&BTreeMap::new());
        assert!(config.cache.enabled);
        assert!(config.install.production);
        assert!(config.secondary.sass);
        assert_eq!(config.secondary.node_env, "production");
        assert_eq!(config.endpoints.node_mirror, DEFAULT_NODE_MIRROR);
    }

    #[test]
    fn cache_and_production_switches() {
        let config = Config::from_vars(&vars(&[
            ("NODE_MODULES_CACHE", "false"),
            ("NPM_CONFIG_PRODUCTION", "false"),
        ]));
        assert!(!config.cache.enabled);
        assert!(!config.install.production);
    }

    #[test]
    fn unknown_flag_value_keeps_default() {
        let config = Config::from_vars(&vars(&[("NODE_MODULES_CACHE", "maybe")]));
        assert!(config.cache.enabled);
    }

    #[test]
    fn endpoints_strip_trailing_slash() {
        let config = Config::from_vars(&vars(&[
            ("NODEPACK_NODE_MIRROR", "https://mirror.example.com/node/"),
            ("NODE_ENV", "staging"),
        ]));
        assert_eq!(config.endpoints.node_mirror, "https://mirror.example.com/node");
        assert_eq!(config.secondary.node_env, "staging");
    }

    #[test]
    fn default_config_serializes() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"cache\""));
        assert!(!json.contains("imported"));
    }
}
