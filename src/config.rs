use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::presenter::DEFAULT_POINTER_OFFSET;

const APP_DIR: &str = "color-sampler";
pub const DEFAULT_LONG_PRESS_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dark_mode: bool,
    /// Hide the main window while a pick is in progress.
    pub setting_minimize: bool,
    /// Copy every successful pick without waiting for the shortcut.
    pub setting_autocopy: bool,
    pub pointer_offset: i32,
    pub long_press_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            setting_minimize: false,
            setting_autocopy: false,
            pointer_offset: DEFAULT_POINTER_OFFSET,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
        }
    }
}

fn config_path_from(xdg_config_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = xdg_config_home.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join(APP_DIR).join("config.json");
    }
    if let Some(home) = home {
        return PathBuf::from(home).join(".config").join(APP_DIR).join("config.json");
    }
    PathBuf::from("config.json")
}

pub fn config_path() -> PathBuf {
    config_path_from(std::env::var("XDG_CONFIG_HOME").ok(), std::env::var("HOME").ok())
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Loads the config, falling back to defaults. Only a missing file is silent.
    pub fn load() -> Self {
        let path = config_path();
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) {
        let path = config_path();
        if let Err(e) = self.save_to(&path) {
            log::warn!("could not save config {}: {}", path.display(), e);
        }
    }
}
