//! Preference storage
//!
//! Values are JSON documents addressed by `(scope, key)`. `Sdm` scoped values
//! belong to one delivery machine; `Workspace` values are shared by every
//! machine in the organization.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceScope {
    #[default]
    Workspace,
    Sdm,
}

impl PreferenceScope {
    fn prefix(&self) -> &'static str {
        match self {
            PreferenceScope::Workspace => "workspace",
            PreferenceScope::Sdm => "sdm",
        }
    }
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference '{key}' has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode preference '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw preference backend
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_value(&self, key: &str, scope: PreferenceScope) -> Result<Option<Value>>;

    async fn put_value(&self, key: &str, value: Value, scope: PreferenceScope) -> Result<()>;
}

/// Typed access to a [`PreferenceStore`]
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPreferenceStore::new()))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        scope: PreferenceScope,
    ) -> Result<Option<T>> {
        match self.store.get_value(key, scope).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value).map_err(|source| PreferenceError::Decode {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(typed))
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T, scope: PreferenceScope) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| PreferenceError::Encode {
            key: key.to_string(),
            source,
        })?;
        debug!(key, scope = ?scope, "Storing preference");
        self.store.put_value(key, value, scope).await
    }
}

fn scoped_key(key: &str, scope: PreferenceScope) -> String {
    format!("{}/{}", scope.prefix(), key)
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get_value(&self, key: &str, scope: PreferenceScope) -> Result<Option<Value>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&scoped_key(key, scope))
            .cloned())
    }

    async fn put_value(&self, key: &str, value: Value, scope: PreferenceScope) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(scoped_key(key, scope), value);
        Ok(())
    }
}

/// Preferences persisted as one JSON object on disk
pub struct FilePreferenceStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `~/.config/stackgoals/preferences.json`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("stackgoals"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("preferences.json")
    }

    async fn load(&self) -> Result<BTreeMap<String, Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse preferences at {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get_value(&self, key: &str, scope: PreferenceScope) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(&scoped_key(key, scope)))
    }

    async fn put_value(&self, key: &str, value: Value, scope: PreferenceScope) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        values.insert(scoped_key(key, scope), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(&values)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
