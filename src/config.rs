//! Container library loading
//!
//! A container library is a TOML file declaring script containers and their
//! events blocks:
//!
//! ```toml
//! [[containers]]
//! name = "clock"
//!
//! [[containers.events]]
//! on = "system time hourly priority:1"
//! script = ["narrate top of the hour"]
//! ```

use std::path::{Path, PathBuf};
use std::{fs, io};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::info;

use crate::containers::{ContainerStore, EventsBlock, ScriptContainer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("container library not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to parse container library: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("IO error reading container library: {0}")]
    Io(#[from] io::Error),
}

fn default_enabled() -> bool {
    true
}

/// One container as authored in the library file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSpec {
    pub name: String,

    /// Disabled containers stay indexed but never fire.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Declared event bindings. Absent means the container has no valid
    /// events block; the reload pass reports it and skips the container.
    pub events: Option<EventsBlock>,
}

/// The full container library file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptLibrary {
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

impl ScriptLibrary {
    /// Default library location (`~/.config/emberscript/scripts.toml` on Linux).
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "emberscript")
            .map(|dirs| dirs.config_dir().join("scripts.toml"))
            .unwrap_or_else(|| PathBuf::from("scripts.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let library = toml::from_str(&content)?;
        info!("Loaded container library from {}", path.display());
        Ok(library)
    }

    /// Build the runtime container store, preserving declaration order.
    pub fn into_store(self) -> ContainerStore {
        let mut store = ContainerStore::new();
        for spec in self.containers {
            store.insert(ScriptContainer::new(spec.name, spec.enabled, spec.events));
        }
        store
    }
}
