use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BillnoteError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    /// JSON file of `{name_rule, bank, password}` entries.
    #[serde(default)]
    pub rules_file: Option<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub encrypt_db: bool,
}

fn default_owner() -> String {
    "default".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            owner: default_owner(),
            rules_file: None,
            workers: default_workers(),
            encrypt_db: false,
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("billnote.db")
    }

    /// Explicit `rules_file`, else `<data_dir>/filename_rules.json` when present.
    pub fn rules_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.rules_file {
            return Some(PathBuf::from(path));
        }
        let fallback = PathBuf::from(&self.data_dir).join("filename_rules.json");
        fallback.exists().then_some(fallback)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("billnote")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("billnote")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BillnoteError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
