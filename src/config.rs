//! TOML application configuration.
//!
//! Every section is optional; a missing key falls back to the defaults
//! below. The language-model API key is never stored in the file; it is
//! read from the environment variable named by `openai.api_key_env`.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [data]
//! root = "./data"
//!
//! [modes]
//! file = "./config/modes_config.json"
//!
//! [openai]
//! model = "gpt-4o"
//! temperature = 0.7
//!
//! [publish]
//! enabled = true
//! utc_offset_hours = 9
//! ```

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub modes: ModesConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_root")]
    pub root: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

/// The mode file is loaded at startup; a missing or malformed file is fatal.
#[derive(Debug, Deserialize, Clone)]
pub struct ModesConfig {
    #[serde(default = "default_modes_file")]
    pub file: PathBuf,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            file: default_modes_file(),
        }
    }
}

fn default_modes_file() -> PathBuf {
    PathBuf::from("./config/modes_config.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAIConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl OpenAIConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => anyhow::bail!("{} environment variable not set", self.api_key_env),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_git_program")]
    pub git_program: PathBuf,
    /// Offset used for commit message timestamps (JST by default).
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            git_program: default_git_program(),
            utc_offset_hours: default_utc_offset_hours(),
            remote: None,
            branch: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_git_program() -> PathBuf {
    PathBuf::from("git")
}
fn default_utc_offset_hours() -> i32 {
    9
}

impl PublishConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            anyhow::anyhow!(
                "publish.utc_offset_hours out of range: {}",
                self.utc_offset_hours
            )
        })
    }
}

impl Config {
    /// Defaults only; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            anyhow::bail!("openai.temperature must be in [0.0, 2.0]");
        }

        if self.openai.model.trim().is_empty() {
            anyhow::bail!("openai.model must not be empty");
        }

        if !(-23..=23).contains(&self.publish.utc_offset_hours) {
            anyhow::bail!("publish.utc_offset_hours must be in [-23, 23]");
        }

        if self.publish.remote.is_some() != self.publish.branch.is_some() {
            anyhow::bail!("publish.remote and publish.branch must be set together");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
