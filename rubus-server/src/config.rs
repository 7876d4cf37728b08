use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server configuration, loaded from a TOML file at startup
/// (`annil::config::Config::from_file`'s pattern, §6 "CLI / config").
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    #[serde(default = "default_max_fetch_pieces")]
    pub max_fetch_pieces: u32,
    pub media_root: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_max_fetch_pieces() -> u32 {
    60
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
