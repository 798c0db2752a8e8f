use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::filter::TimeFilter;

/// Overrides `gateway_url` from the config file
pub const GATEWAY_ENV: &str = "RUMIE_READER_GATEWAY_URL";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the gateway worker (default: http://localhost:8787)
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Public URL of the rendered page, used for share links
    /// (default: the gateway URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    /// Filter applied when a thread is first shown (recent or all)
    #[serde(default)]
    pub default_filter: TimeFilter,
}

fn default_gateway_url() -> String {
    "http://localhost:8787".to_string()
}

fn data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".rumie-reader"))
}

fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

/// Where `render` writes the page when no `--out` is given
pub fn default_page_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("index.html"))
}

impl Config {
    /// Load config from ~/.rumie-reader/config.toml, returning defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        if let Ok(url) = std::env::var(GATEWAY_ENV) {
            if !url.trim().is_empty() {
                config.gateway_url = url;
            }
        }
        Ok(config)
    }

    /// Save config to ~/.rumie-reader/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Page URL for share links, falling back to the gateway root
    pub fn page_url(&self) -> String {
        match &self.page_url {
            Some(url) => url.clone(),
            None => format!("{}/", self.gateway_url.trim_end_matches('/')),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "gateway_url" | "gateway" => {
                if value.trim().is_empty() {
                    bail!("gateway_url cannot be empty");
                }
                self.gateway_url = value.trim().to_string();
            }
            "page_url" | "page" => {
                self.page_url = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "default_filter" | "filter" => {
                self.default_filter = TimeFilter::parse(value)?;
            }
            _ => bail!("unknown config key: {key}"),
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            page_url: None,
            default_filter: TimeFilter::default(),
        }
    }
}
