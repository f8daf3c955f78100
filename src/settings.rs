use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
const DEBUG_INTERVAL_SECS: u64 = 5;
const DATABASE_FILE: &str = "timetracker.sqlite";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub interval_secs: u64,
    /// Falls back to the platform data directory when unset.
    pub database_path: Option<PathBuf>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            database_path: None,
        }
    }
}

impl TrackerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "timetracker")
        .ok_or_else(|| anyhow!("could not determine a home directory"))
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(SETTINGS_FILE))
}

pub fn default_database_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(DATABASE_FILE))
}

/// `TIMETRACKER_DEBUG=1` (or `true`) shortens the default interval.
fn debug_mode() -> bool {
    std::env::var("TIMETRACKER_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TrackerSettings>,
}

impl SettingsStore {
    /// Missing or malformed files yield defaults; the file is only written
    /// on update.
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings {}: {err}", path.display());
                TrackerSettings::default()
            })
        } else {
            TrackerSettings::default()
        };

        if !path.exists() && debug_mode() {
            data.interval_secs = DEBUG_INTERVAL_SECS;
        }

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> TrackerSettings {
        self.read().clone()
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match self.read().database_path.clone() {
            Some(path) => Ok(path),
            None => default_database_path(),
        }
    }

    pub fn update(&self, settings: TrackerSettings) -> Result<()> {
        if settings.interval_secs == 0 {
            return Err(anyhow!("interval_secs must be greater than zero"));
        }
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &TrackerSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
