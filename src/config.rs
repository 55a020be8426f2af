// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::page::MAX_CONTENT_CHARS;

pub const CONFIG_ENV_VAR: &str = "JOBFILL_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "jobfill.yaml";

/// LLM provider settings handed to the background on scrape requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, alias = "api_provider", skip_serializing_if = "Option::is_none")]
    pub api_provider: Option<String>,
    #[serde(default, alias = "api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Backend paths of the background-only actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub extract_job: String,
    pub analyze_form: String,
    pub generate_answer: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            extract_job: "/api/jobs/extract".to_string(),
            analyze_form: "/api/forms/analyze".to_string(),
            generate_answer: "/api/autofill/answer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub web_app_url: String,
    pub store_path: PathBuf,
    pub provider: ProviderConfig,
    pub endpoints: Endpoints,
    pub content_limit: usize,
    pub highlight_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8001".to_string(),
            web_app_url: "http://localhost:5173".to_string(),
            store_path: PathBuf::from("data/extension_storage.json"),
            provider: ProviderConfig::default(),
            endpoints: Endpoints::default(),
            content_limit: MAX_CONTENT_CHARS,
            highlight_ms: 2_000,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file, then `JOBFILL_*` environment overrides.
    ///
    /// An explicitly named file must exist. The default `jobfill.yaml` in the
    /// working directory is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let explicit = explicit.map(Path::to_path_buf).or(from_env);

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.content_limit = config.content_limit.min(MAX_CONTENT_CHARS);
        config.store_path = resolve_path(&config.store_path)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `JOBFILL_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("JOBFILL_API_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("JOBFILL_WEB_APP_URL") {
            self.web_app_url = url;
        }
        if let Some(path) = lookup("JOBFILL_STORE") {
            self.store_path = PathBuf::from(path);
        }
        if let Some(key) = lookup("JOBFILL_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(provider) = lookup("JOBFILL_API_PROVIDER") {
            self.provider.api_provider = Some(provider);
        }
    }

    pub fn highlight_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.highlight_ms)
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(current_dir.join(path))
    }
}
