//! Execution queue boundary
//!
//! The engine never runs script bodies itself. It tags the resolved steps
//! with a fresh request id, submits them together with a context source and
//! blocks until the queue reports completion, then collects any
//! determinations recorded against that request. `InlineQueue` is the
//! reference implementation used by the CLI and the integration tests.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::events::context::ContextSource;

/// Identifier tying queued steps and determinations to one `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One script step tagged with the request it belongs to.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub request: RequestId,
    pub command: String,
}

impl ScriptStep {
    pub fn new(request: RequestId, command: impl Into<String>) -> Self {
        Self {
            request,
            command: command.into(),
        }
    }
}

/// A complete submission for one matched path.
pub struct QueueRequest<'a> {
    pub id: RequestId,
    /// Name of the container the steps came from.
    pub label: String,
    pub steps: Vec<ScriptStep>,
    pub context: &'a dyn ContextSource,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("execution queue rejected request {0}")]
    Rejected(u64),
    #[error("script step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },
}

/// External script execution queue.
///
/// `run` is synchronous: it returns only once every step of the request has
/// executed. Determinations recorded while the request ran are retrieved
/// afterwards, scoped to the request id.
pub trait ExecutionQueue {
    /// Allocate a fresh id for the next submission.
    fn next_request_id(&mut self) -> RequestId;

    /// Run the request to completion.
    fn run(&mut self, request: QueueRequest<'_>) -> Result<(), QueueError>;

    /// Take the determinations recorded against a completed request.
    /// `None` when the request produced none.
    fn take_determinations(&mut self, id: RequestId) -> Option<Vec<String>>;
}

/// Replace `<context.name>` tags in a step with values from the source.
///
/// Unknown names are left in place so the step text still shows what was
/// asked for.
pub fn interpolate(command: &str, context: &dyn ContextSource) -> String {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;
    while let Some(start) = rest.find("<context.") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) => {
                let name = &tail["<context.".len()..end];
                match context.context_value(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Minimal synchronous queue that runs steps inline.
///
/// Exactly one directive is understood: `determine <value>` records a
/// determination for the active request. Every other step is interpolated
/// and logged. The executed step texts are journaled for inspection.
#[derive(Debug, Default)]
pub struct InlineQueue {
    next_id: u64,
    determinations: HashMap<RequestId, Vec<String>>,
    executed: Vec<(RequestId, String)>,
}

impl InlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal of executed step texts, in execution order.
    pub fn executed(&self) -> &[(RequestId, String)] {
        &self.executed
    }
}

impl ExecutionQueue for InlineQueue {
    fn next_request_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    fn run(&mut self, request: QueueRequest<'_>) -> Result<(), QueueError> {
        debug!(
            target: "queue",
            "Running {} step(s) for '{}' (request {})",
            request.steps.len(),
            request.label,
            request.id.value()
        );
        for step in &request.steps {
            let command = interpolate(&step.command, request.context);
            if let Some(value) = command.strip_prefix("determine ") {
                self.determinations
                    .entry(step.request)
                    .or_default()
                    .push(value.trim().to_string());
            } else {
                info!(target: "queue", "[{}] {}", request.label, command);
            }
            self.executed.push((step.request, command));
        }
        Ok(())
    }

    fn take_determinations(&mut self, id: RequestId) -> Option<Vec<String>> {
        self.determinations.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::context::ContextSnapshot;

    #[test]
    fn test_request_ids_are_unique() {
        let mut queue = InlineQueue::new();
        let a = queue.next_request_id();
        let b = queue.next_request_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_determine_steps_are_recorded() {
        let mut queue = InlineQueue::new();
        let id = queue.next_request_id();
        let context = ContextSnapshot::new();
        queue
            .run(QueueRequest {
                id,
                label: "test".into(),
                steps: vec![
                    ScriptStep::new(id, "narrate hello"),
                    ScriptStep::new(id, "determine cancelled"),
                ],
                context: &context,
            })
            .unwrap();

        assert_eq!(queue.take_determinations(id), Some(vec!["cancelled".to_string()]));
        // a second take finds nothing
        assert_eq!(queue.take_determinations(id), None);
    }

    #[test]
    fn test_no_determinations_is_none() {
        let mut queue = InlineQueue::new();
        let id = queue.next_request_id();
        let context = ContextSnapshot::new();
        queue
            .run(QueueRequest {
                id,
                label: "test".into(),
                steps: vec![ScriptStep::new(id, "narrate hello")],
                context: &context,
            })
            .unwrap();

        assert_eq!(queue.take_determinations(id), None);
    }

    #[test]
    fn test_interpolation() {
        let mut context = ContextSnapshot::new();
        context.set("cancelled", false);
        context.set("event_header", "system time hourly");

        assert_eq!(
            interpolate("narrate cancelled=<context.cancelled>", &context),
            "narrate cancelled=false"
        );
        assert_eq!(
            interpolate("narrate <context.event_header>!", &context),
            "narrate system time hourly!"
        );
        // unknown names stay as written
        assert_eq!(
            interpolate("narrate <context.unknown>", &context),
            "narrate <context.unknown>"
        );
        // unterminated tag passes through
        assert_eq!(
            interpolate("narrate <context.cancelled", &context),
            "narrate <context.cancelled"
        );
    }
}
