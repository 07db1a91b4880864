use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::constants::*;
use crate::navigation::classify;

/// Application configuration with sensible defaults.
///
/// Can be overridden via ~/.config/cloakgate/config.toml
#[derive(Debug, Clone)]
pub struct Config {
    /// External proxy base; resolved URLs are appended as a path segment.
    pub proxy_base: String,
    /// Alternate proxy base used by the `stealth` proxy method.
    pub stealth_proxy_base: Option<String>,
    /// Search engine base for non-URL input.
    pub search_base: String,
    /// SQLite file holding history, settings and cloak profile.
    pub database_path: PathBuf,
    /// Support chat provider configuration.
    pub ai: AiConfig,
}

/// Chat provider settings. The API key is not part of the config file; it
/// comes from the environment.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// OpenAI-compatible API base (".../v1").
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            max_tokens: DEFAULT_AI_MAX_TOKENS,
            temperature: DEFAULT_AI_TEMPERATURE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            stealth_proxy_base: None,
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            database_path: database_path(),
            ai: AiConfig::default(),
        }
    }
}

/// TOML-deserializable config file format.
/// All fields are optional — missing fields use defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    proxy_base: Option<String>,
    stealth_proxy_base: Option<String>,
    search_base: Option<String>,
    database_path: Option<PathBuf>,
    ai: Option<FileAiConfig>,
}

/// TOML-deserializable `[ai]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileAiConfig {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Config {
    /// Load config from ~/.config/cloakgate/config.toml, falling back to
    /// defaults for any missing fields. If the file doesn't exist, returns
    /// pure defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`; see [`Config::load`].
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Config::default(), // No config file — use defaults
        };
        Self::from_toml(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
            Config::default()
        })
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file_config: FileConfig = toml::from_str(content)?;
        let mut config = Config::default();

        // Merge file values over defaults
        if let Some(v) = file_config.proxy_base {
            if let Some(base) = http_base("proxy_base", &v) {
                config.proxy_base = base;
            }
        }
        if let Some(v) = file_config.stealth_proxy_base {
            config.stealth_proxy_base = http_base("stealth_proxy_base", &v);
        }
        if let Some(v) = file_config.search_base {
            if let Some(base) = http_base("search_base", &v) {
                config.search_base = base;
            }
        }
        if let Some(v) = file_config.database_path {
            if !v.as_os_str().is_empty() {
                config.database_path = v;
            }
        }

        if let Some(ai) = file_config.ai {
            if let Some(v) = ai.base_url {
                if let Some(base) = http_base("ai.base_url", &v) {
                    config.ai.base_url = base;
                }
            }
            if let Some(v) = ai.model {
                if !v.trim().is_empty() {
                    config.ai.model = v.trim().to_string();
                }
            }
            if let Some(v) = ai.max_tokens {
                config.ai.max_tokens = v.clamp(1, MAX_AI_MAX_TOKENS);
            }
            if let Some(v) = ai.temperature {
                config.ai.temperature = v.clamp(0.0, 2.0);
            }
        }

        Ok(config)
    }
}

/// Accept `value` as a base address only if it is an http(s) URL.
/// Trailing slashes are dropped so paths can be appended with `/`.
fn http_base(field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if classify(value).is_url {
        Some(value.trim_end_matches('/').to_string())
    } else {
        if !value.is_empty() {
            warn!(field, value, "ignoring non-http(s) base address");
        }
        None
    }
}
