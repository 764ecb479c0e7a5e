use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::composer::DEFAULT_MAX_ROWS;
use crate::reply::DEFAULT_REPLY_DELAY_MS;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub reply_delay_ms: Option<u64>,
    pub max_input_rows: Option<u16>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            reply_delay_ms: Some(DEFAULT_REPLY_DELAY_MS),
            max_input_rows: Some(DEFAULT_MAX_ROWS),
        }
    }

    /// Load from the default location, writing defaults on first run.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::new();
            // A read-only config dir shouldn't stop the app
            if let Err(err) = config.save_to(config_path) {
                tracing::warn!("could not write default config: {:#}", err);
            }
            return Ok(config);
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("simple-chat"))
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms.unwrap_or(DEFAULT_REPLY_DELAY_MS))
    }

    pub fn max_input_rows(&self) -> u16 {
        self.max_input_rows.unwrap_or(DEFAULT_MAX_ROWS).max(1)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("simple-chat").join("config.json"))
    }
}
