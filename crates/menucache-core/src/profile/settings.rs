use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings file name in cache directory
const SETTINGS_FILE: &str = "settings.json";

/// Small persistent key-value store for user settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn set_flag(&self, key: &str, value: bool) -> Result<()>;
    /// Missing keys and non-flag values read as `false`.
    fn get_flag(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum SettingValue {
    Flag(bool),
    Text(String),
}

type Settings = BTreeMap<String, SettingValue>;

fn text_of(settings: &Settings, key: &str) -> Option<String> {
    match settings.get(key) {
        Some(SettingValue::Text(s)) => Some(s.clone()),
        _ => None,
    }
}

fn flag_of(settings: &Settings, key: &str) -> bool {
    matches!(settings.get(key), Some(SettingValue::Flag(true)))
}

/// Settings persisted as a JSON object on disk.
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Mutex<Settings>,
}

impl JsonSettingsStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read settings file")?;
            serde_json::from_str(&contents).context("Failed to parse settings file")?
        } else {
            Settings::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn update(&self, key: &str, value: SettingValue) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        values.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*values)?;
        std::fs::write(&self.path, contents).context("Failed to write settings file")?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Settings) -> T) -> Result<T> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        Ok(f(&values))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(|s| text_of(s, key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(key, SettingValue::Text(value.to_string()))
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.update(key, SettingValue::Flag(value))
    }

    fn get_flag(&self, key: &str) -> Result<bool> {
        self.read(|s| flag_of(s, key))
    }
}

/// Non-persistent settings, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<Settings>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Settings>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(text_of(&*self.lock()?, key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), SettingValue::Text(value.to_string()));
        Ok(())
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.lock()?.insert(key.to_string(), SettingValue::Flag(value));
        Ok(())
    }

    fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(flag_of(&*self.lock()?, key))
    }
}
