use crate::error::{Result, VizcatError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub vizquery: VizqueryConfig,
}

#[derive(Debug, Deserialize)]
pub struct VizqueryConfig {
    /// Name or path of the external query executable.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Directory holding one `.ini` descriptor per catalog.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,
    /// Upper bound on a single subprocess invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_binary() -> String {
    "vizquery".to_string()
}

fn default_catalog_dir() -> String {
    "config".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for VizqueryConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            catalog_dir: default_catalog_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VizcatError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
