// src/store.rs
//! Extension-local key-value storage and the typed state kept in it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::ProviderConfig;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const STORED_JOBS_KEY: &str = "storedJobs";
pub const API_PROVIDER_KEY: &str = "apiProvider";
pub const API_KEY_KEY: &str = "apiKey";
pub const MAX_STORED_JOBS: usize = 5;

/// Last-writer-wins key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        if tokio::fs::metadata(&self.path).await.is_err() {
            return Ok(Map::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read store: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store: {}", self.path.display()))
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(entries).context("Failed to serialize store")?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write store: {}", self.path.display()))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// A scraped job as kept in extension storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredJob {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub scraped_at: DateTime<Utc>,
    pub url: String,
}

impl StoredJob {
    /// Wrap backend job data. Non-object payloads are kept under `data`.
    pub fn new(job_data: Value, url: &str, scraped_at: DateTime<Utc>) -> Self {
        let mut fields = match job_data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        fields.remove("scrapedAt");
        fields.remove("url");
        Self {
            fields,
            scraped_at,
            url: url.to_string(),
        }
    }

    fn text(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.text("title")
    }

    pub fn company(&self) -> &str {
        self.text("company")
    }
}

/// Typed view over the extension's storage
#[derive(Clone)]
pub struct ExtensionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ExtensionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }

    pub async fn auth_token(&self) -> Result<Option<String>> {
        let token = self.kv.get(AUTH_TOKEN_KEY).await?;
        Ok(token
            .as_ref()
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }

    pub async fn set_auth_token(&self, token: &str) -> Result<()> {
        self.kv
            .set(AUTH_TOKEN_KEY, Value::String(token.to_string()))
            .await?;
        info!("Auth token stored");
        Ok(())
    }

    pub async fn clear_auth_token(&self) -> Result<()> {
        self.kv.remove(AUTH_TOKEN_KEY).await?;
        info!("Auth token removed");
        Ok(())
    }

    /// Provider settings saved in storage, each falling back to `defaults`
    pub async fn provider_config(&self, defaults: &ProviderConfig) -> Result<ProviderConfig> {
        let read = |value: Option<Value>| {
            value
                .as_ref()
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let api_provider = read(self.kv.get(API_PROVIDER_KEY).await?);
        let api_key = read(self.kv.get(API_KEY_KEY).await?);
        Ok(ProviderConfig {
            api_provider: api_provider.or_else(|| defaults.api_provider.clone()),
            api_key: api_key.or_else(|| defaults.api_key.clone()),
        })
    }

    pub async fn set_provider_config(&self, provider: &ProviderConfig) -> Result<()> {
        if let Some(name) = &provider.api_provider {
            self.kv
                .set(API_PROVIDER_KEY, Value::String(name.clone()))
                .await?;
        }
        if let Some(key) = &provider.api_key {
            self.kv.set(API_KEY_KEY, Value::String(key.clone())).await?;
        }
        Ok(())
    }

    pub async fn stored_jobs(&self) -> Result<Vec<StoredJob>> {
        match self.kv.get(STORED_JOBS_KEY).await? {
            Some(value) => serde_json::from_value(value).context("Failed to parse stored jobs"),
            None => Ok(Vec::new()),
        }
    }

    /// Insert a job at the front, evicting the oldest beyond the cap
    pub async fn push_job(&self, job: StoredJob) -> Result<Vec<StoredJob>> {
        let mut jobs = self.stored_jobs().await?;
        jobs.insert(0, job);
        jobs.truncate(MAX_STORED_JOBS);

        let value = serde_json::to_value(&jobs).context("Failed to serialize stored jobs")?;
        self.kv.set(STORED_JOBS_KEY, value).await?;
        debug!("Stored jobs now {}", jobs.len());
        Ok(jobs)
    }

    pub async fn clear_jobs(&self) -> Result<()> {
        self.kv.remove(STORED_JOBS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn job(n: i64) -> StoredJob {
        StoredJob::new(
            json!({"title": format!("Job {}", n), "company": "Acme"}),
            &format!("https://example.com/jobs/{}", n),
            Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_token_roundtrip_and_clear() {
        let store = ExtensionStore::in_memory();
        assert_eq!(store.auth_token().await.unwrap(), None);
        store.set_auth_token("abc").await.unwrap();
        store.set_auth_token("def").await.unwrap();
        assert_eq!(store.auth_token().await.unwrap().as_deref(), Some("def"));
        store.clear_auth_token().await.unwrap();
        assert_eq!(store.auth_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sixth_job_evicts_oldest() {
        let store = ExtensionStore::in_memory();
        for n in 1..=6 {
            store.push_job(job(n)).await.unwrap();
        }
        let jobs = store.stored_jobs().await.unwrap();
        assert_eq!(jobs.len(), MAX_STORED_JOBS);
        assert_eq!(jobs[0].title(), "Job 6");
        assert_eq!(jobs[4].title(), "Job 2");
    }

    #[tokio::test]
    async fn test_provider_config_prefers_stored_values() {
        let store = ExtensionStore::in_memory();
        let defaults = ProviderConfig {
            api_provider: Some("openai".into()),
            api_key: None,
        };
        assert!(!store.provider_config(&defaults).await.unwrap().has_api_key());

        store
            .set_provider_config(&ProviderConfig {
                api_provider: None,
                api_key: Some("sk-test".into()),
            })
            .await
            .unwrap();
        let provider = store.provider_config(&defaults).await.unwrap();
        assert_eq!(provider.api_provider.as_deref(), Some("openai"));
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_stored_job_wire_shape() {
        let job = job(1);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["title"], "Job 1");
        assert_eq!(value["url"], "https://example.com/jobs/1");
        assert!(value["scrapedAt"].is_string());
        assert_eq!(job.company(), "Acme");
    }

    #[test]
    fn test_non_object_job_data_is_wrapped() {
        let job = StoredJob::new(json!("raw text"), "https://x", Utc::now());
        assert_eq!(job.fields["data"], "raw text");
        assert_eq!(job.title(), "");
    }
}
