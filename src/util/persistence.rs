use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::domain::{ColumnNames, RowFilter, SharedCost};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "SalesCommission";
const APP_NAME: &str = "SalesCommission";

/// Inputs remembered between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default)]
    pub shared_cost: SharedCost,
    #[serde(default)]
    pub filter: RowFilter,
    #[serde(default)]
    pub columns: ColumnNames,
}

fn data_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

pub fn load_persisted_settings() -> Option<PersistedSettings> {
    load_settings_from(&data_file()?)
}

pub fn save_persisted_settings(settings: &PersistedSettings) -> Result<PathBuf, PersistSaveError> {
    let path = data_file().ok_or(PersistSaveError::StorageUnavailable)?;
    save_settings_to(&path, settings)?;
    Ok(path)
}

/// Missing or unreadable settings mean defaults.
pub fn load_settings_from(path: &Path) -> Option<PersistedSettings> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(settings) => Some(settings),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings");
            None
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &PersistedSettings) -> Result<(), PersistSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
