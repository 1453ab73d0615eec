use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alarm::AlarmDefinition;
use crate::error::CoreError;
use crate::registry::TagRegistry;
use crate::tag::TagSpec;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("config format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("config rejected: {0}")]
    Invalid(#[from] CoreError),
}

/// Serializable image of the full registry: tag specs plus the alarm
/// definitions per analog input tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub tags: Vec<TagSpec>,
    #[serde(default)]
    pub alarms: BTreeMap<String, Vec<AlarmDefinition>>,
}

impl RegistrySnapshot {
    pub fn capture(registry: &TagRegistry) -> Self {
        let mut snapshot = Self::default();
        for tag in registry.iter() {
            snapshot.tags.push(tag.to_spec());
            if !tag.alarms().is_empty() {
                snapshot
                    .alarms
                    .insert(tag.id().to_string(), tag.alarms().to_vec());
            }
        }
        snapshot
    }

    /// Rebuild a registry through the normal validation path, so an edited
    /// snapshot cannot smuggle in an illegal tag or a duplicate alarm.
    pub fn restore(&self) -> Result<TagRegistry, CoreError> {
        let mut registry = TagRegistry::new();
        for spec in &self.tags {
            registry.add_tag(spec.clone())?;
        }
        for (tag_id, definitions) in &self.alarms {
            for definition in definitions {
                registry.add_alarm_definition(tag_id, definition.clone())?;
            }
        }
        Ok(registry)
    }
}

/// Load/save boundary the host application drives once at startup and once
/// at shutdown.
pub trait ConfigStore {
    fn load(&self) -> Result<RegistrySnapshot, PersistError>;
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistError>;
}

/// Snapshot persistence as a pretty-printed JSON file. A missing file loads
/// as an empty snapshot so a first run starts clean.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<RegistrySnapshot, PersistError> {
        if !self.path.exists() {
            log::debug!("config file {} missing, starting empty", self.path.display());
            return Ok(RegistrySnapshot::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
