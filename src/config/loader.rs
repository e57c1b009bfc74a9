//! Configuration Loader
//!
//! Loads and merges service settings from the built-in defaults and settings files.

use crate::config::client::ClientConfig;
use crate::config::settings::{Service, ServicesConfig};
use crate::error::{AilabError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    config: ServicesConfig,
}

impl ConfigLoader {
    /// Create a new config loader and load from default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self {
            config: ServicesConfig::default(),
        };

        loader.load_builtin_defaults()?;

        // Files on disk override the built-ins
        loader.load_from_default_paths()?;

        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self {
            config: ServicesConfig::default(),
        };

        loader.load_builtin_defaults()?;
        loader.load_from_file(path)?;

        Ok(loader)
    }

    /// Load built-in service defaults
    fn load_builtin_defaults(&mut self) -> Result<()> {
        let defaults = include_str!("../../services.json");
        let config: ServicesConfig = serde_json::from_str(defaults).map_err(|e| {
            AilabError::Config(format!("Failed to parse built-in services.json: {}", e))
        })?;

        self.config.merge(config);
        Ok(())
    }

    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of config paths to check, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".ailab").join("services.json"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ailab").join("services.json"));
        }

        paths.push(PathBuf::from("ailab.json"));

        if let Ok(custom_path) = std::env::var("AILAB_CONFIG_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AilabError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ServicesConfig = serde_json::from_str(&content).map_err(|e| {
            AilabError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loaded service settings");
        self.config.merge(config);
        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    /// Take ownership of the configuration
    pub fn into_config(self) -> ServicesConfig {
        self.config
    }

    /// Resolve a ready-to-use client config for one service.
    ///
    /// A `.env` file in the working directory is honored before the key
    /// variable is read.
    pub fn client_config(&self, service: Service) -> Result<ClientConfig> {
        let _ = dotenvy::dotenv();
        self.config.service(service)?.client_config()
    }
}
