//! Configuration file handling
//!
//! Settings live in `~/.toolbuddy/config.toml`. Missing sections and keys
//! fall back to their defaults.

use crate::agent::DriverConfig;
use crate::provider::RetryPolicy;
use crate::throttle::EstimatorKind;
use crate::tools::types::DEFAULT_RESTRICTED_FILES;
use crate::tools::ToolContext;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OpenAI-compatible API root, without `/chat/completions`
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key, if the endpoint needs one
    pub api_key_env: Option<String>,
    pub request_timeout_secs: u64,
    pub max_tool_rounds: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: crate::provider::openai::DEFAULT_BASE_URL.to_string(),
            model: crate::provider::openai::DEFAULT_MODEL.to_string(),
            api_key_env: None,
            request_timeout_secs: crate::provider::openai::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_tool_rounds: crate::agent::driver::DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub input_limit: u64,
    pub output_limit: u64,
    pub window_secs: u64,
    pub estimator: EstimatorKind,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            input_limit: crate::agent::driver::DEFAULT_INPUT_LIMIT,
            output_limit: crate::agent::driver::DEFAULT_OUTPUT_LIMIT,
            window_secs: crate::throttle::DEFAULT_WINDOW.as_secs(),
            estimator: EstimatorKind::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub backoff_secs: u64,
    /// Unbounded when absent
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: crate::provider::retry::DEFAULT_BACKOFF.as_secs(),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub timeout_secs: u64,
    pub restricted_files: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            restricted_files: DEFAULT_RESTRICTED_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it
    /// doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".toolbuddy").join("config.toml"))
    }

    /// API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        self.provider
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            input_limit: self.throttle.input_limit,
            output_limit: self.throttle.output_limit,
            window: Duration::from_secs(self.throttle.window_secs),
            max_tool_rounds: self.provider.max_tool_rounds,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.retry.backoff_secs), self.retry.max_attempts)
    }

    pub fn tool_context(&self, working_dir: PathBuf) -> ToolContext {
        ToolContext::new(working_dir)
            .with_timeout(Duration::from_secs(self.tools.timeout_secs))
            .with_restricted_files(self.tools.restricted_files.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_secs)
    }
}
