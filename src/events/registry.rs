//! Event registry and reload protocol
//!
//! The registry owns every registered kind for the life of the process.
//! Kinds register once at startup; `reload` rebuilds each kind's path index
//! wholesale from the container store. Reload is partial-failure tolerant: a
//! container with a missing events block is reported and skipped while the
//! rest of the rebuild continues.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::containers::ContainerStore;
use crate::events::core::{ReloadScriptsEvent, SystemTimeEvent};
use crate::events::{EventPath, RegisteredEvent, ScriptEventKind};

/// Outcome of one reload pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadReport {
    /// Whether any configuration error was reported during the pass.
    pub had_error: bool,
    /// Total paths bound across all kinds.
    pub indexed_paths: usize,
}

/// Process-wide set of registered event kinds.
#[derive(Default)]
pub struct EventRegistry {
    events: Vec<RegisteredEvent>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Kinds are never individually removed; their path
    /// indexes are rebuilt on each reload.
    pub fn register(&mut self, mut kind: Box<dyn ScriptEventKind>) {
        kind.reset();
        debug!(target: "events", "Registering script event kind: {}", kind.name());
        self.events.push(RegisteredEvent::new(kind));
    }

    /// Register the built-in kinds.
    pub fn register_core_events(&mut self) {
        self.register(Box::new(ReloadScriptsEvent::default()));
        self.register(Box::new(SystemTimeEvent::default()));
    }

    pub fn events(&self) -> impl Iterator<Item = &RegisteredEvent> {
        self.events.iter()
    }

    pub fn event(&self, name: &str) -> Option<&RegisteredEvent> {
        self.events.iter().find(|e| e.name() == name)
    }

    pub fn event_mut(&mut self, name: &str) -> Option<&mut RegisteredEvent> {
        self.events.iter_mut().find(|e| e.name() == name)
    }

    /// Rebuild every kind's path index from the container store.
    ///
    /// Re-running with an unchanged store produces identical path lists in
    /// identical order.
    pub fn reload(&mut self, store: &ContainerStore) -> ReloadReport {
        info!(target: "events", "Reloading script events");
        let mut report = ReloadReport::default();

        // Validation pass: report configuration problems once per container
        // instead of once per registered kind.
        for container in store.iter() {
            match container.events() {
                None => {
                    error!(
                        target: "events",
                        "Missing or invalid events block for '{}'",
                        container.name()
                    );
                    report.had_error = true;
                }
                Some(block) => {
                    for event in block.declared() {
                        if event.contains('@') {
                            warn!(
                                target: "events",
                                "Script '{}' has event '{}' which contains object notation, \
                                 which is deprecated for use in world events. Please remove it.",
                                container.name(),
                                event
                            );
                        }
                    }
                }
            }
        }

        for registered in &mut self.events {
            registered.kind_dyn_mut().destroy();
            registered.paths_mut().clear();
            let mut matched = false;
            for container in store.iter() {
                let Some(block) = container.events() else {
                    continue;
                };
                for event in block.declared() {
                    if registered.kind().could_match(container, event) {
                        debug!(
                            target: "events",
                            "Event match, {} matched for '{}'",
                            registered.name(),
                            event
                        );
                        registered
                            .paths_mut()
                            .push(EventPath::new(Arc::clone(container), event));
                        matched = true;
                    }
                }
            }
            if matched {
                registered.sort_paths();
                registered.kind_dyn_mut().init();
                report.indexed_paths += registered.paths().len();
            }
        }

        info!(
            target: "events",
            "Reload complete: {} path(s) indexed{}",
            report.indexed_paths,
            if report.had_error { ", with errors" } else { "" }
        );
        report
    }
}
