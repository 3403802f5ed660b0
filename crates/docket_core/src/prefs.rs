//! Persisted UI preferences.
//!
//! Preferences are an opaque blob to this core: filter defaults and view
//! mode are read at startup and written on change, nothing here depends on
//! their content. The store is injected rather than globally accessed so
//! hosts can back it with local storage, a config file, or memory.

use crate::error::{CoreError, CoreResult};
use crate::filter::FilterCriteria;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// How the list views render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Flat list.
    #[default]
    List,
    /// Kanban board grouped by status.
    Board,
}

/// Persisted UI preference blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Filter criteria restored on startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<FilterCriteria>,
    /// Current view mode.
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Keys owned by the UI layer, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Storage for the preference blob.
pub trait PreferenceStore: Send + Sync {
    /// Loads preferences; defaults when nothing was saved yet.
    fn load(&self) -> CoreResult<Preferences>;

    /// Persists preferences.
    fn save(&self, prefs: &Preferences) -> CoreResult<()>;
}

/// Preference store held in memory. For tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    prefs: RwLock<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> CoreResult<Preferences> {
        Ok(self.prefs.read().clone().unwrap_or_default())
    }

    fn save(&self, prefs: &Preferences) -> CoreResult<()> {
        *self.prefs.write() = Some(prefs.clone());
        Ok(())
    }
}

/// Preference store backed by a JSON file.
///
/// A missing file loads defaults; saving creates the parent directory.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    /// Creates a store at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> CoreResult<Preferences> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(err) => Err(CoreError::from(err)),
        }
    }

    fn save(&self, prefs: &Preferences) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
