use std::future::Future;

use serde_json::Value;

use crate::infrastructure::error::InfrastructureError;

/// Preferences that outlive the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    EyedropperActive,
    HistogramActive,
    ShowHex,
    SelectedFolder,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::EyedropperActive => "eyedropperActive",
            SettingKey::HistogramActive => "histogramActive",
            SettingKey::ShowHex => "showHex",
            SettingKey::SelectedFolder => "selectedFolder",
        }
    }
}

/// Asynchronous key/value store. Writes are acknowledged but callers are free
/// to ignore the acknowledgement; the running session never reads its own
/// writes back.
pub trait SettingsStore: Send + Sync {
    fn load(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<Option<Value>, InfrastructureError>> + Send;

    fn store(
        &self,
        key: SettingKey,
        value: Value,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send;

    fn remove(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send;

    /// Non-boolean stored values read as `default`.
    fn get_flag(
        &self,
        key: SettingKey,
        default: bool,
    ) -> impl Future<Output = Result<bool, InfrastructureError>> + Send {
        async move { Ok(self.load(key).await?.and_then(|v| v.as_bool()).unwrap_or(default)) }
    }

    fn set_flag(
        &self,
        key: SettingKey,
        value: bool,
    ) -> impl Future<Output = Result<(), InfrastructureError>> + Send {
        self.store(key, Value::Bool(value))
    }

    fn get_text(
        &self,
        key: SettingKey,
    ) -> impl Future<Output = Result<Option<String>, InfrastructureError>> + Send {
        async move {
            Ok(self
                .load(key)
                .await?
                .and_then(|v| v.as_str().map(str::to_string)))
        }
    }
}
