//! Configuration for the Sveriges Radio client
//!
//! The configuration is a YAML document merged over an embedded default:
//!
//! ```yaml
//! api:
//!   base_url: https://api.sr.se/api/v2
//!   page_size: 10
//!   timeout_secs: 30
//!   user_agent: PMOMusic/0.3.10 (pmosr)
//! catalog:
//!   cache_file: null
//! episodes:
//!   count: 1
//! ```
//!
//! [`SrConfig::load`] looks for the file named by `PMOSR_CONFIG`, then
//! `.pmosr.yaml` in the working directory. Any value can then be overridden
//! from the environment with `PMOSR__<SECTION>__<KEY>`, for instance
//! `PMOSR__API__PAGE_SIZE=20`.

use crate::cache::ProgramCache;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing::info;

const DEFAULT_CONFIG: &str = include_str!("pmosr.yaml");

/// Environment variable naming the configuration file
pub const ENV_CONFIG_FILE: &str = "PMOSR_CONFIG";

/// Prefix of per-key environment overrides
pub const ENV_PREFIX: &str = "PMOSR__";

/// Configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".pmosr.yaml";

/// Full client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub episodes: EpisodesConfig,
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Raw program list cache, `None` to always fetch
    pub cache_file: Option<PathBuf>,
}

/// Episode refresh settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodesConfig {
    /// Episodes fetched per program on refresh
    pub count: usize,
}

impl SrConfig {
    /// The embedded default configuration
    pub fn defaults() -> Result<Self> {
        Self::from_value(default_value()?)
    }

    /// Parse a YAML document merged over the defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_env(yaml, std::iter::empty())
    }

    /// Read a YAML file merged over the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load the configuration from the usual places plus the environment
    pub fn load() -> Result<Self> {
        let yaml = match find_config_file() {
            Some(path) => {
                info!(config_file = %path.display(), "Loading config file");
                fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read config file {}", path.display()))?
            }
            None => {
                info!("No config file found, using default embedded config");
                String::new()
            }
        };

        Self::from_yaml_with_env(&yaml, env::vars())
    }

    /// Merge `yaml` and `PMOSR__` overrides from `vars` over the defaults
    pub fn from_yaml_with_env(
        yaml: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut value = default_value()?;

        if !yaml.trim().is_empty() {
            let external: Value = serde_yaml::from_str(yaml).context("Invalid YAML")?;
            merge_yaml(&mut value, &lower_keys(external));
        }
        apply_env_overrides(&mut value, vars);

        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        let config: SrConfig = serde_yaml::from_value(value).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 {
            return Err(anyhow!("api.page_size must be at least 1"));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be at least 1"));
        }
        if self.episodes.count == 0 {
            return Err(anyhow!("episodes.count must be at least 1"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// The program cache, when one is configured
    pub fn program_cache(&self) -> Option<ProgramCache> {
        self.catalog.cache_file.as_ref().map(|path| ProgramCache::new(path))
    }
}

fn default_value() -> Result<Value> {
    serde_yaml::from_str(DEFAULT_CONFIG).context("Invalid embedded default configuration")
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var(ENV_CONFIG_FILE) {
        return Some(PathBuf::from(path));
    }

    let local = Path::new(LOCAL_CONFIG_FILE);
    local.exists().then(|| local.to_path_buf())
}

/// Recursively merge `external` into `default`; scalars and sequences are
/// replaced
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        other => other,
    }
}

fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (key, value) in vars {
        let Some(path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = path.split("__").map(str::to_lowercase).collect();
        set_path(config, &path, convert_env_value(&value));
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn set_path(node: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };

    if !matches!(node, Value::Mapping(_)) {
        *node = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = node {
        let entry = map
            .entry(Value::String(head.clone()))
            .or_insert(Value::Mapping(Mapping::new()));
        set_path(entry, rest, value);
    }
}
