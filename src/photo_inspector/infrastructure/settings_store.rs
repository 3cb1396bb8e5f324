use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::InfrastructureError;
use crate::domain::settings::{SettingKey, SettingsStore};

/// Settings kept as one JSON object on disk, rewritten on every change.
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileSettingsStore {
    /// A missing file starts empty. A corrupt file is logged and replaced on
    /// the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(json) => match serde_json::from_str::<Map<String, Value>>(&json) {
                Ok(values) => {
                    info!("Loaded settings from {:?}", path);
                    values
                }
                Err(e) => {
                    warn!("Settings file {:?} is corrupted, starting empty: {}", path, e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {:?}, using defaults", path);
                Map::new()
            }
            Err(e) => return Err(InfrastructureError::IoError(e)),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<(), InfrastructureError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Settings saved to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<Option<Value>, InfrastructureError>> + Send {
        async move { Ok(self.values.lock().await.get(key.as_str()).cloned()) }
    }

    fn store(
        &self,
        key: SettingKey,
        value: Value,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
        async move {
            let mut values = self.values.lock().await;
            values.insert(key.as_str().to_string(), value);
            self.persist(&values).await
        }
    }

    fn remove(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
        async move {
            let mut values = self.values.lock().await;
            if values.remove(key.as_str()).is_some() {
                self.persist(&values).await?;
            }
            Ok(())
        }
    }
}

/// Process-local store. Keeps a log of every write so callers can check what
/// was persisted.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: StdMutex<HashMap<SettingKey, Value>>,
    writes: StdMutex<Vec<(SettingKey, Value)>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(self, key: SettingKey, value: bool) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key, Value::Bool(value));
        }
        self
    }

    pub fn writes(&self) -> Vec<(SettingKey, Value)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn poisoned() -> InfrastructureError {
        InfrastructureError::StoreUnavailable("lock poisoned".to_string())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<Option<Value>, InfrastructureError>> + Send {
        let result = self
            .values
            .lock()
            .map(|values| values.get(&key).cloned())
            .map_err(|_| Self::poisoned());
        async move { result }
    }

    fn store(
        &self,
        key: SettingKey,
        value: Value,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
        let result = match (self.values.lock(), self.writes.lock()) {
            (Ok(mut values), Ok(mut writes)) => {
                values.insert(key, value.clone());
                writes.push((key, value));
                Ok(())
            }
            _ => Err(Self::poisoned()),
        };
        async move { result }
    }

    fn remove(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
        let result = self
            .values
            .lock()
            .map(|mut values| {
                values.remove(&key);
            })
            .map_err(|_| Self::poisoned());
        async move { result }
    }
}
