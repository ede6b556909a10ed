//! Script container model
//!
//! Containers are authored units of scripting: a name, an `enabled` flag and
//! an `events` block binding declared event lines to script step lists. The
//! store owns every container; the event registry only holds references.

use std::sync::Arc;

use serde::Deserialize;

/// One declared event binding inside a container's events block.
///
/// The `on` field carries the event text as authored (the `on ` prefix of the
/// written form is implied by the field name). Steps are opaque to this crate
/// and are handed to the execution queue verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEntry {
    pub on: String,
    #[serde(default)]
    pub script: Vec<String>,
}

/// Ordered events block of a container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct EventsBlock {
    entries: Vec<EventEntry>,
}

impl EventsBlock {
    pub fn new(entries: Vec<EventEntry>) -> Self {
        Self { entries }
    }

    /// Declared event texts in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.on.as_str())
    }

    /// Resolve script steps at a dotted path of the form `events.on <text>`.
    pub fn steps_at(&self, path: &str) -> Option<&[String]> {
        let event = path.strip_prefix("events.on ")?;
        self.entries
            .iter()
            .find(|e| e.on == event)
            .map(|e| e.script.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single script container.
#[derive(Debug, Clone)]
pub struct ScriptContainer {
    name: String,
    enabled: bool,
    events: Option<EventsBlock>,
}

impl ScriptContainer {
    pub fn new(name: impl Into<String>, enabled: bool, events: Option<EventsBlock>) -> Self {
        Self {
            name: name.into(),
            enabled,
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this container participates in dispatch. Disabled containers
    /// stay indexed but never match at fire time.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The events block, or `None` when the container declares none (a
    /// configuration error reported during reload).
    pub fn events(&self) -> Option<&EventsBlock> {
        self.events.as_ref()
    }

    /// Resolve script steps at a dotted path (`events.on <text>`).
    pub fn steps_at(&self, path: &str) -> Option<&[String]> {
        self.events.as_ref()?.steps_at(path)
    }
}

/// Ordered collection of all loaded script containers.
#[derive(Debug, Default)]
pub struct ContainerStore {
    containers: Vec<Arc<ScriptContainer>>,
}

impl ContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, container: ScriptContainer) {
        self.containers.push(Arc::new(container));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScriptContainer>> {
        self.containers.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ScriptContainer>> {
        self.containers.iter().find(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
