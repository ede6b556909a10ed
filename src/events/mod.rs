//! Script event engine
//!
//! Event kinds implement [`ScriptEventKind`] and register with the
//! [`registry::EventRegistry`]. A reload pass binds declared container event
//! lines to kinds through the coarse `could_match` predicate and sorts the
//! bindings by priority; firing walks the sorted paths, applies the
//! cancellation gates, confirms with the precise `matches` predicate and
//! hands matching script bodies to the execution queue.

pub mod context;
pub mod core;
pub mod dispatch;
pub mod registry;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::containers::ScriptContainer;
use crate::switches;
use context::ContextSnapshot;

/// Contract implemented by every event kind.
///
/// `could_match` is the cheap structural check used while rebuilding the
/// path index at reload time; `matches` is the exact semantic check run
/// against every bound path on each firing.
pub trait ScriptEventKind: Send {
    /// Stable display name of this kind.
    fn name(&self) -> &'static str;

    /// Could this declared event line ever fire for this kind?
    fn could_match(&self, container: &ScriptContainer, event: &str) -> bool;

    /// Does this path match the occurrence being fired right now?
    fn matches(&self, container: &ScriptContainer, event: &str) -> bool;

    /// Kind-specific context values for the current occurrence.
    fn context(&self, snapshot: &mut ContextSnapshot) {
        let _ = snapshot;
    }

    /// Called after a reload bound at least one path to this kind.
    fn init(&mut self) {}

    /// Called at the start of every reload, before the path list is cleared.
    fn destroy(&mut self) {}

    /// Called once before each firing.
    fn reset(&mut self) {}

    /// Downcast access for drivers that feed occurrence data into a kind.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Cumulative per-kind counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStats {
    /// Number of firings.
    pub fires: u64,
    /// Number of script bodies run across all firings.
    pub script_fires: u64,
    /// Total wall time spent inside the execution queue.
    pub execution_time: Duration,
}

/// One binding between a container's declared event line and a kind.
#[derive(Debug, Clone)]
pub struct EventPath {
    container: Arc<ScriptContainer>,
    event: String,
    priority: i32,
}

impl EventPath {
    pub fn new(container: Arc<ScriptContainer>, event: impl Into<String>) -> Self {
        let event = event.into();
        let priority = switches::parse_priority(&event);
        Self {
            container,
            event,
            priority,
        }
    }

    pub fn container(&self) -> &Arc<ScriptContainer> {
        &self.container
    }

    /// The event text as authored, switches included.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Priority resolved from the `priority:<int>` switch, 0 when absent.
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// A registered kind together with its engine-owned state: the path index,
/// counters and the per-firing cancellation flag.
pub struct RegisteredEvent {
    kind: Box<dyn ScriptEventKind>,
    paths: Vec<EventPath>,
    stats: EventStats,
    cancelled: bool,
}

impl RegisteredEvent {
    pub(crate) fn new(kind: Box<dyn ScriptEventKind>) -> Self {
        Self {
            kind,
            paths: Vec::new(),
            stats: EventStats::default(),
            cancelled: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Bound paths in firing order (ascending priority, stable among ties).
    pub fn paths(&self) -> &[EventPath] {
        &self.paths
    }

    pub fn stats(&self) -> EventStats {
        self.stats
    }

    /// Live cancellation flag. Meaningful only during a firing; reset to
    /// false before each new firing begins.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Downcast the kind for occurrence-specific updates before a fire.
    pub fn kind_mut<T: ScriptEventKind + 'static>(&mut self) -> Option<&mut T> {
        self.kind.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn kind(&self) -> &dyn ScriptEventKind {
        self.kind.as_ref()
    }

    pub(crate) fn kind_dyn_mut(&mut self) -> &mut dyn ScriptEventKind {
        self.kind.as_mut()
    }

    pub(crate) fn paths_mut(&mut self) -> &mut Vec<EventPath> {
        &mut self.paths
    }

    pub(crate) fn stats_mut(&mut self) -> &mut EventStats {
        &mut self.stats
    }

    pub(crate) fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    /// Sort the path index by ascending priority. `sort_by_key` is stable,
    /// so equal priorities keep declaration order.
    pub(crate) fn sort_paths(&mut self) {
        self.paths.sort_by_key(|p| p.priority());
    }
}
