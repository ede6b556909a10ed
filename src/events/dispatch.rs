//! Firing protocol
//!
//! One firing walks the priority-sorted path index of a registered kind.
//! Each path passes through the cancellation gates and the container enabled
//! check before the kind's precise matcher runs; matching bodies are handed
//! to the execution queue and their determinations are applied before the
//! next path is considered, so cancellation set by one path is visible to
//! every later path in the same firing.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error};

use crate::containers::ScriptContainer;
use crate::events::context::ContextSnapshot;
use crate::events::{EventPath, RegisteredEvent};
use crate::queue::{ExecutionQueue, QueueError, QueueRequest, ScriptStep};
use crate::switches::get_switch;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("container '{container}' has no script at 'events.on {event}'")]
    MissingScript { container: String, event: String },
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Decide whether a path is admitted given the live cancellation flag.
///
/// The `cancelled:<bool>` switch, when present, picks the cancellation state
/// the path fires in; absent defaults to uncancelled-only.
/// `ignorecancelled:true` overrides a failed gate so the path fires in
/// either state.
pub fn cancellation_admits(event: &str, cancelled: bool) -> bool {
    let admitted = match get_switch(event, "cancelled") {
        Some(mode) if mode.eq_ignore_ascii_case("true") => cancelled,
        _ => !cancelled,
    };
    admitted
        || get_switch(event, "ignorecancelled")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

impl RegisteredEvent {
    /// Fire one occurrence across all bound paths.
    ///
    /// A failure while processing one path (including a panicking matcher or
    /// queue) is logged with container and path identity and never aborts
    /// the rest of the firing.
    pub fn fire(&mut self, queue: &mut dyn ExecutionQueue) {
        self.stats_mut().fires += 1;
        self.set_cancelled(false);
        self.kind_dyn_mut().reset();

        let paths = self.paths().to_vec();
        for path in &paths {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| self.fire_path(path, &mut *queue)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        target: "events",
                        "Handling script '{}' path '{}': {}",
                        path.container().name(),
                        path.event(),
                        e
                    );
                }
                Err(_) => {
                    error!(
                        target: "events",
                        "Handling script '{}' path '{}': panicked",
                        path.container().name(),
                        path.event()
                    );
                }
            }
        }
    }

    fn fire_path(
        &mut self,
        path: &EventPath,
        queue: &mut dyn ExecutionQueue,
    ) -> Result<(), DispatchError> {
        if !path.container().enabled() {
            return Ok(());
        }
        if !cancellation_admits(path.event(), self.cancelled()) {
            return Ok(());
        }
        if !self.kind().matches(path.container(), path.event()) {
            return Ok(());
        }
        self.run(path, queue)
    }

    /// Run the script body bound at `path` and apply its determinations.
    fn run(&mut self, path: &EventPath, queue: &mut dyn ExecutionQueue) -> Result<(), DispatchError> {
        self.stats_mut().script_fires += 1;

        let mut snapshot = ContextSnapshot::new();
        self.kind().context(&mut snapshot);
        snapshot.set("cancelled", self.cancelled());
        snapshot.set("event_header", path.event());

        debug!(
            target: "events",
            "Running script event '{}', event '{}' for script '{}'",
            self.name(),
            path.event(),
            path.container().name()
        );
        for (name, value) in snapshot.iter() {
            debug!(target: "events", "Context '{}' = '{}'", name, value);
        }

        let dotted = format!("events.on {}", path.event());
        let steps = path
            .container()
            .steps_at(&dotted)
            .ok_or_else(|| DispatchError::MissingScript {
                container: path.container().name().to_string(),
                event: path.event().to_string(),
            })?;

        let id = queue.next_request_id();
        let tagged: Vec<ScriptStep> = steps
            .iter()
            .map(|step| ScriptStep::new(id, step.as_str()))
            .collect();

        let started = Instant::now();
        queue.run(QueueRequest {
            id,
            label: path.container().name().to_string(),
            steps: tagged,
            context: &snapshot,
        })?;
        self.stats_mut().execution_time += started.elapsed();

        if let Some(determinations) = queue.take_determinations(id) {
            for determination in determinations {
                self.apply_determination(path.container(), &determination);
            }
        }
        Ok(())
    }

    /// Apply one determination string. Returns false for an unrecognized
    /// determination, which is reported and changes no state.
    pub fn apply_determination(
        &mut self,
        container: &ScriptContainer,
        determination: &str,
    ) -> bool {
        if determination.eq_ignore_ascii_case("cancelled") {
            debug!(target: "events", "Event cancelled by '{}'", container.name());
            self.set_cancelled(true);
            true
        } else if determination.eq_ignore_ascii_case("cancelled:false") {
            debug!(target: "events", "Event uncancelled by '{}'", container.name());
            self.set_cancelled(false);
            true
        } else {
            error!(
                target: "events",
                "Unknown determination '{}' from '{}'",
                determination,
                container.name()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncancelled_instance_admits_plain_path() {
        assert!(cancellation_admits("object does something", false));
    }

    #[test]
    fn test_cancelled_instance_skips_plain_path() {
        assert!(!cancellation_admits("object does something", true));
    }

    #[test]
    fn test_ignorecancelled_admits_cancelled_instance() {
        assert!(cancellation_admits(
            "object does something ignorecancelled:true",
            true
        ));
    }

    #[test]
    fn test_ignorecancelled_false_is_not_an_override() {
        assert!(!cancellation_admits(
            "object does something ignorecancelled:false",
            true
        ));
    }

    #[test]
    fn test_cancelled_true_path_requires_cancelled_instance() {
        assert!(cancellation_admits("object cancelled:true", true));
        assert!(!cancellation_admits("object cancelled:true", false));
    }

    #[test]
    fn test_cancelled_false_path_requires_uncancelled_instance() {
        assert!(cancellation_admits("object cancelled:false", false));
        assert!(!cancellation_admits("object cancelled:false", true));
    }

    #[test]
    fn test_switch_values_compare_case_insensitively() {
        assert!(cancellation_admits("object cancelled:TRUE", true));
        assert!(cancellation_admits("object IGNORECANCELLED:True", true));
    }
}
