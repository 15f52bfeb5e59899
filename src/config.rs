use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) source_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) output_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) launcher: Option<String>,
    #[serde(default)]
    pub(crate) no_launcher: bool,
    #[serde(default)]
    pub(crate) pip: Option<String>,
    #[serde(default)]
    pub(crate) cmake: Option<String>,
    #[serde(default)]
    pub(crate) generator: Option<String>,
    #[serde(default)]
    pub(crate) requirements: Option<PathBuf>,
    #[serde(default)]
    pub(crate) skip_pip: bool,
    #[serde(default)]
    pub(crate) amdgpu_families: Option<String>,
    #[serde(default)]
    pub(crate) package_version: Option<String>,
    #[serde(default)]
    pub(crate) cmake_args: Vec<String>,
    #[serde(default)]
    pub(crate) log_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) parallel: Option<u32>,
}

impl Config {
    /// Load the first config file found in the default locations.
    /// Unreadable or malformed files are skipped with a warning.
    pub(crate) fn load() -> Self {
        for path in Self::get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{e}"),
            }
        }

        Self::default()
    }

    /// Load an explicitly requested config file; any failure is an error.
    pub(crate) fn load_from(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/rockbuild/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("rockbuild").join("config.toml"));
        }

        // 2. Platform config dir (macOS: ~/Library/Application Support)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("rockbuild").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.rockbuild.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rockbuild.toml"));
        }

        paths
    }
}
