//! Configuration loading and management

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub bluesky: BlueskyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seconds between cycles (5 minutes by default)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum post length in characters
    #[serde(default = "default_max_post_length")]
    pub max_post_length: usize,

    #[serde(default = "default_step_timeout")]
    pub generation_timeout_secs: u64,

    #[serde(default = "default_step_timeout")]
    pub publish_timeout_secs: u64,

    #[serde(default)]
    pub dry_run: bool,

    /// Topic override; empty uses the built-in list
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default = "default_bluesky_service")]
    pub service: String,

    #[serde(default = "default_bluesky_identifier_env")]
    pub identifier_env: String,

    #[serde(default = "default_bluesky_password_env")]
    pub password_env: String,

    /// Limit enforced by the service itself
    #[serde(default = "default_bluesky_max_chars")]
    pub max_chars: usize,
}

// Default value functions
fn default_interval() -> u64 {
    300
}

fn default_max_post_length() -> usize {
    150
}

fn default_step_timeout() -> u64 {
    60
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.9
}

fn default_timeout() -> u64 {
    45
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base_url() -> String {
    infopost_adapters::llm::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_bluesky_service() -> String {
    infopost_adapters::bluesky::DEFAULT_SERVICE.to_string()
}

fn default_bluesky_identifier_env() -> String {
    "BSKY_USERNAME".to_string()
}

fn default_bluesky_password_env() -> String {
    "BSKY_PASSWORD".to_string()
}

fn default_bluesky_max_chars() -> usize {
    infopost_adapters::bluesky::MAX_POST_CHARS
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_post_length: default_max_post_length(),
            generation_timeout_secs: default_step_timeout(),
            publish_timeout_secs: default_step_timeout(),
            dry_run: false,
            categories: vec![],
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: 0,
            max_output_tokens: default_max_output_tokens(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_api_key_env(),
            base_url: default_gemini_base_url(),
        }
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service: default_bluesky_service(),
            identifier_env: default_bluesky_identifier_env(),
            password_env: default_bluesky_password_env(),
            max_chars: default_bluesky_max_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("INFOPOST")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail once the bot is running
    pub fn validate(&self) -> Result<()> {
        if self.general.interval_secs == 0 {
            bail!("general.interval_secs must be greater than 0");
        }

        if self.general.max_post_length == 0 {
            bail!("general.max_post_length must be greater than 0");
        }

        if self.general.max_post_length > self.bluesky.max_chars {
            bail!(
                "general.max_post_length ({}) exceeds the Bluesky limit ({})",
                self.general.max_post_length,
                self.bluesky.max_chars
            );
        }

        if self.general.generation_timeout_secs == 0 || self.general.publish_timeout_secs == 0 {
            bail!("general timeouts must be greater than 0");
        }

        match self.llm.provider.as_str() {
            "gemini" | "stub" => Ok(()),
            other => bail!("Unknown LLM provider: {}", other),
        }
    }
}

/// Read a required secret from the environment variable named in config
pub fn load_secret(env_var: &str, purpose: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for {}", purpose);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, purpose))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, purpose);
    }

    Ok(SecretString::new(value.into()))
}
