//! Configuration loading for Veritas services.
//!
//! Settings are loaded from a JSON file (default `~/.veritas/config.json`)
//! and then overridden by `VERITAS_*` environment variables, so deployments
//! can keep secrets out of the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default config directory (`~/.veritas`).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".veritas")
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API key for the provider (overridable via VERITAS_LLM_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model identifier, e.g. "meta-llama/llama-3.3-70b-instruct".
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Google Custom Search API key (overridable via VERITAS_SEARCH_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Google Custom Search engine id.
    #[serde(default)]
    pub engine_id: Option<String>,
    /// Search API endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    /// Results requested per tool call (capped at 10 by the API).
    #[serde(default = "default_num_results")]
    pub num_results: u8,
}

/// Analysis loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Number of prior messages included in discussion context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

/// Top-level settings for all Veritas services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api".to_string()
}

fn default_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_search_endpoint() -> String {
    "https://customsearch.googleapis.com/customsearch/v1".to_string()
}

fn default_num_results() -> u8 {
    5
}

fn default_history_window() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: default_search_endpoint(),
            num_results: default_num_results(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            analysis: AnalysisSettings::default(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from the default location and apply env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_dir().join("config.json"))
    }

    /// Load settings from a specific file and apply env overrides.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut settings = match read_settings_file(path.as_ref()) {
            Ok(Some(s)) => s,
            Ok(None) => Self::default(),
            Err(e) => return Err(Error::Config(format!("{e:#}"))),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Apply `VERITAS_*` environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("VERITAS_LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("VERITAS_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("VERITAS_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("VERITAS_SEARCH_API_KEY") {
            self.search.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("VERITAS_SEARCH_ENGINE_ID") {
            self.search.engine_id = Some(v);
        }
        if let Ok(v) = std::env::var("VERITAS_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("VERITAS_LOG_FORMAT") {
            self.log_format = v;
        }
    }
}

/// Read and parse a settings file, returning None if it doesn't exist.
fn read_settings_file(path: &Path) -> anyhow::Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(settings))
}
