// vizboard_app/src/settings.rs

use crate::error::DashboardError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

pub type SettingsMap = BTreeMap<String, Value>;

/// Where the settings map lives between sessions.
pub trait SettingsBackend {
    fn load(&mut self) -> Result<SettingsMap, DashboardError>;
    fn save(&mut self, entries: &SettingsMap) -> Result<(), DashboardError>;
}

/// Pretty-printed JSON object on disk. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsBackend for JsonFileBackend {
    fn load(&mut self) -> Result<SettingsMap, DashboardError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file yet");
            return Ok(SettingsMap::new());
        }
        let text = fs::read_to_string(&self.path).map_err(DashboardError::Settings)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&mut self, entries: &SettingsMap) -> Result<(), DashboardError> {
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text).map_err(DashboardError::Settings)
    }
}

/// Keeps settings in memory. Clones share the same map, so a test can keep
/// a handle and inspect what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    shared: Rc<RefCell<SettingsMap>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SettingsMap {
        self.shared.borrow().clone()
    }
}

impl SettingsBackend for MemoryBackend {
    fn load(&mut self) -> Result<SettingsMap, DashboardError> {
        Ok(self.shared.borrow().clone())
    }

    fn save(&mut self, entries: &SettingsMap) -> Result<(), DashboardError> {
        *self.shared.borrow_mut() = entries.clone();
        Ok(())
    }
}

/// One entry per widget, keyed by widget id. Every write replaces the
/// widget's whole entry and flushes the map to the backend.
pub struct SettingsStore {
    entries: SettingsMap,
    backend: Box<dyn SettingsBackend>,
}

impl SettingsStore {
    pub fn open(mut backend: Box<dyn SettingsBackend>) -> Result<Self, DashboardError> {
        let entries = backend.load()?;
        info!(entries = entries.len(), "Settings loaded");
        Ok(Self { entries, backend })
    }

    pub fn in_memory() -> Self {
        Self {
            entries: SettingsMap::new(),
            backend: Box::new(MemoryBackend::new()),
        }
    }

    pub fn contains(&self, widget_id: &str) -> bool {
        self.entries.contains_key(widget_id)
    }

    /// The typed entry for `widget_id`, if one was saved.
    pub fn get<S: DeserializeOwned>(&self, widget_id: &str) -> Result<Option<S>, DashboardError> {
        self.entries
            .get(widget_id)
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|source| DashboardError::SettingsEntry {
                    widget: widget_id.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn put<S: Serialize>(&mut self, widget_id: &str, entry: &S) -> Result<(), DashboardError> {
        self.entries
            .insert(widget_id.to_string(), serde_json::to_value(entry)?);
        self.backend.save(&self.entries)?;
        debug!(widget = widget_id, "Settings saved");
        Ok(())
    }
}
