use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::histogram::DEFAULT_SAMPLE_STRIDE;

pub const CONFIG_ENV_VAR: &str = "PHOTO_INSPECTOR_CONFIG";
const APP_DIR_NAME: &str = "photo_inspector";

fn default_bind_address() -> String {
    "0.0.0.0:3300".to_string()
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_histogram_width() -> u32 {
    256
}

fn default_histogram_height() -> u32 {
    100
}

fn default_sample_stride() -> u32 {
    DEFAULT_SAMPLE_STRIDE
}

/// Platform config directory for the app, or the working directory when the
/// platform has none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Server configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory of the browser frontend served at `/`
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,

    /// Where toggle states and the selected folder are kept
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    #[serde(default = "default_histogram_width")]
    pub histogram_width: u32,

    #[serde(default = "default_histogram_height")]
    pub histogram_height: u32,

    /// Histogram reads every Nth pixel
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            frontend_dir: default_frontend_dir(),
            settings_path: default_settings_path(),
            histogram_width: default_histogram_width(),
            histogram_height: default_histogram_height(),
            sample_stride: default_sample_stride(),
        }
    }
}

impl AppConfig {
    /// `$PHOTO_INSPECTOR_CONFIG` if set, otherwise `photo_inspector.json` in
    /// the config directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("photo_inspector.json"))
    }

    /// Never fails: a missing, unreadable or corrupt file falls back to the
    /// defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        let config = match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppConfig>(&json) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}, using defaults: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}, using defaults: {}", path, e);
                Self::default()
            }
        };
        config.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.sample_stride = self.sample_stride.max(1);
        // 0 幅のキャンバスは PNG にできない
        self.histogram_width = self.histogram_width.max(1);
        self.histogram_height = self.histogram_height.max(1);
        self
    }
}
